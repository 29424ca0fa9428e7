//! Reusable UI interaction helpers shared by the scenario suite
//!
//! Each helper encapsulates one multi-step interaction sequence. None of them
//! assert on the resulting state; callers do. Failures surface as the
//! underlying timeout or WebDriver error of the step that did not complete.

use std::time::Instant;

use fantoccini::elements::Element;
use fantoccini::Locator;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::fixtures::Blog;
use crate::session::Session;

/// Test id of the login form container
pub const LOGIN_FORM_TEST_ID: &str = "login-form";

/// Test id carried by every rendered blog container
pub const BLOG_TEST_ID: &str = "blog";

static LIKES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"likes\s*(\d+)").unwrap());

/// Fill and submit the login form
///
/// Locates the form by its test id and the inputs by their field labels.
/// The caller asserts on the resulting state.
pub async fn login(session: &Session, username: &str, password: &str) -> E2eResult<()> {
    let form = session.wait_for_test_id(LOGIN_FORM_TEST_ID).await?;
    session
        .fill_labeled_input(LOGIN_FORM_TEST_ID, "username", username)
        .await?;
    session
        .fill_labeled_input(LOGIN_FORM_TEST_ID, "password", password)
        .await?;
    let submit = form
        .find(Locator::XPath(".//button[normalize-space(.)='login']"))
        .await?;
    submit.click().await?;
    debug!("Submitted login form as '{username}'");
    Ok(())
}

/// Click the logout control; assumes one is currently visible
pub async fn logout(session: &Session) -> E2eResult<()> {
    session.click_button("logout").await
}

/// Create a blog through the UI creation form
///
/// The form's fields are addressable by their stable identifiers regardless
/// of surrounding UI state.
pub async fn create_blog(session: &Session, blog: &Blog) -> E2eResult<()> {
    session.click_button("create new blog").await?;
    session.fill_by_css("#title", &blog.title).await?;
    session.fill_by_css("#author", &blog.author).await?;
    session.fill_by_css("#url", &blog.url).await?;
    session.click_button("create").await?;
    debug!("Created blog '{}'", blog.title);
    Ok(())
}

/// Handle scoped to the one rendered blog whose text contains `title`
///
/// Fails once the title matches several containers; waits when it matches
/// none yet. The handle re-locates its container on every operation, so it
/// stays valid across the re-renders a like or reorder causes.
pub async fn blog_card<'a>(session: &'a Session, title: &str) -> E2eResult<BlogCard<'a>> {
    let card = BlogCard {
        session,
        title: title.to_string(),
    };
    card.container().await?;
    Ok(card)
}

/// Locate a blog by title and expand its detail view
pub async fn expand_blog_by_title<'a>(
    session: &'a Session,
    title: &str,
) -> E2eResult<BlogCard<'a>> {
    let card = blog_card(session, title).await?;
    card.click_in_card("view").await?;
    debug!("Expanded blog '{title}'");
    Ok(card)
}

/// Like counts of all rendered blogs, in list order
///
/// Every blog must be expanded far enough to render its count.
pub async fn rendered_like_counts(session: &Session) -> E2eResult<Vec<u64>> {
    let cards = session.all_by_test_id(BLOG_TEST_ID).await?;
    let mut counts = Vec::with_capacity(cards.len());
    for card in cards {
        let text = card.text().await?;
        let count = parse_like_count(&text).ok_or_else(|| {
            E2eError::AssertionFailed(format!("blog without a rendered like count: '{text}'"))
        })?;
        counts.push(count);
    }
    Ok(counts)
}

/// A handle to one rendered blog container, identified by title
pub struct BlogCard<'a> {
    session: &'a Session,
    title: String,
}

impl BlogCard<'_> {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current rendered like count
    pub async fn likes(&self) -> E2eResult<u64> {
        let deadline = Instant::now() + self.session.wait_timeout();
        loop {
            let card = self.container().await?;
            if let Ok(text) = card.text().await {
                if let Some(count) = parse_like_count(&text) {
                    return Ok(count);
                }
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!(
                    "like count of blog '{}'",
                    self.title
                )));
            }
            sleep(self.session.poll_interval()).await;
        }
    }

    /// Click "like" once and wait for the count to land at exactly +1
    ///
    /// Reads the count immediately before the click and asserts the relative
    /// increment, tolerating whatever count the blog already had.
    pub async fn like_once(&self) -> E2eResult<u64> {
        let before = self.likes().await?;
        self.click_in_card("like").await?;

        let expected = before + 1;
        let deadline = Instant::now() + self.session.wait_timeout();
        loop {
            let now = self.likes().await?;
            if now == expected {
                debug!("Blog '{}' likes {} -> {}", self.title, before, now);
                return Ok(now);
            }
            if now != before {
                return Err(E2eError::AssertionFailed(format!(
                    "like count of '{}' moved from {} to {}, expected {}",
                    self.title, before, now, expected
                )));
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!(
                    "like count of '{}' to reach {}",
                    self.title, expected
                )));
            }
            sleep(self.session.poll_interval()).await;
        }
    }

    /// Is a remove control currently visible inside this container?
    pub async fn remove_control_visible(&self) -> E2eResult<bool> {
        let card = self.container().await?;
        let buttons = card
            .find_all(Locator::XPath(".//button[normalize-space(.)='remove']"))
            .await?;
        for button in buttons {
            if button.is_displayed().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Click "remove", accept the confirmation dialog, and wait for the
    /// container to leave the rendered list
    pub async fn remove_accepting_dialog(&self) -> E2eResult<()> {
        self.click_in_card("remove").await?;
        self.session.accept_dialog().await?;

        let deadline = Instant::now() + self.session.wait_timeout();
        loop {
            if !self.is_rendered().await? {
                debug!("Blog '{}' removed", self.title);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!(
                    "removal of blog '{}'",
                    self.title
                )));
            }
            sleep(self.session.poll_interval()).await;
        }
    }

    /// One-shot probe: is this blog still in the rendered list?
    pub async fn is_rendered(&self) -> E2eResult<bool> {
        let cards = self.session.all_by_test_id(BLOG_TEST_ID).await?;
        for card in cards {
            if let Ok(text) = card.text().await {
                if text.contains(&self.title) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Locate the unique container for this title, waiting for it to render
    async fn container(&self) -> E2eResult<Element> {
        let deadline = Instant::now() + self.session.wait_timeout();
        loop {
            let cards = self.session.all_by_test_id(BLOG_TEST_ID).await?;
            let mut matches = Vec::new();
            for card in cards {
                // Stale between render passes: skip and re-probe.
                if let Ok(text) = card.text().await {
                    if text.contains(&self.title) {
                        matches.push(card);
                    }
                }
            }

            if matches.len() > 1 {
                return Err(E2eError::AssertionFailed(format!(
                    "{} rendered blogs match title '{}'",
                    matches.len(),
                    self.title
                )));
            }
            if let Some(card) = matches.pop() {
                return Ok(card);
            }
            if Instant::now() >= deadline {
                return Err(E2eError::Timeout(format!("blog titled '{}'", self.title)));
            }
            sleep(self.session.poll_interval()).await;
        }
    }

    /// Click a named button inside this container, retrying through the
    /// re-renders that invalidate element references
    async fn click_in_card(&self, name: &str) -> E2eResult<()> {
        let xpath = format!(".//button[normalize-space(.)='{name}']");
        let deadline = Instant::now() + self.session.wait_timeout();
        loop {
            let attempt: E2eResult<()> = async {
                let card = self.container().await?;
                let button = card.find(Locator::XPath(&xpath)).await?;
                button.click().await?;
                Ok(())
            }
            .await;

            match attempt {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(E2eError::StepFailed {
                            step: format!("click '{}' in blog '{}'", name, self.title),
                            reason: e.to_string(),
                        });
                    }
                }
            }
            sleep(self.session.poll_interval()).await;
        }
    }
}

/// Extract the number following the literal word "likes" in rendered text
pub fn parse_like_count(text: &str) -> Option<u64> {
    LIKES_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_like_count_from_rendered_text() {
        assert_eq!(parse_like_count("likes 21"), Some(21));
        assert_eq!(parse_like_count("likes 0"), Some(0));
    }

    #[test]
    fn parses_like_count_embedded_in_card_text() {
        let text = "Best Blog Ever John Doe\nhide\nexample.com\nlikes 9 like\nremove";
        assert_eq!(parse_like_count(text), Some(9));
    }

    #[test]
    fn missing_like_count_is_none() {
        assert_eq!(parse_like_count("Best Blog Ever John Doe view"), None);
        assert_eq!(parse_like_count("likes many"), None);
    }
}

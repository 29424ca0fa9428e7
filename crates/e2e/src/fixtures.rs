//! Test-run-scoped fixtures and the administrative API client

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// A fixture account seeded through the administrative API
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(name: &str, username: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// The account every scenario seeds before navigating to the app
    pub fn primary() -> Self {
        Self::new("Matti Luukkainen", "mluukkai", "salainen")
    }

    /// A second account for ownership scenarios
    pub fn secondary() -> Self {
        Self::new("Eve", "evie", "password")
    }
}

/// A blog created through the UI by an authenticated user
#[derive(Debug, Clone)]
pub struct Blog {
    pub title: String,
    pub author: String,
    pub url: String,
    /// Likes to accumulate one click at a time; rendered count starts at zero
    pub likes: u64,
}

impl Blog {
    pub fn new(title: &str, author: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            url: url.to_string(),
            likes: 0,
        }
    }

    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    /// The canonical single-blog fixture
    pub fn canonical() -> Self {
        Self::new("Best Blog Ever", "John Doe", "example.com")
    }

    /// Several blogs with distinct like counts, for ordering scenarios
    pub fn popularity_fixture() -> Vec<Self> {
        vec![
            Self::new("How to Blog", "Ron Bo", "blogginlife.net").with_likes(15),
            Self::new("Best Blog Ever", "John Doe", "example.com").with_likes(21),
            Self::new("Some Other Blog", "Bob Doe", "something.com").with_likes(4),
            Self::new("Not a Blog", "Nonblogger", "golb.com").with_likes(9),
        ]
    }
}

/// Client for the backend's administrative endpoints
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One-shot probe: does anything answer at the application root?
    pub async fn probe(&self) -> bool {
        self.http.get(&self.base_url).send().await.is_ok()
    }

    /// Wait for the backend to start answering
    pub async fn wait_until_ready(&self, timeout: Duration) -> E2eResult<()> {
        let start = Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;
            if self.probe().await {
                return Ok(());
            }
            if attempts == 1 {
                info!("Waiting for application at {}...", self.base_url);
            }
            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::BackendNotReady(attempts))
    }

    /// Clear all server-side state
    pub async fn reset(&self) -> E2eResult<()> {
        debug!("Resetting server state");
        self.post_ok("/api/testing/reset", None::<&User>).await
    }

    /// Seed a fixture account
    pub async fn create_user(&self, user: &User) -> E2eResult<()> {
        debug!("Seeding user '{}'", user.username);
        self.post_ok("/api/users", Some(user)).await
    }

    async fn post_ok<T: Serialize>(&self, endpoint: &str, body: Option<&T>) -> E2eResult<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(E2eError::Fixture {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Configuration for reaching the backend's administrative endpoints
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL the admin endpoints hang off of
    pub base_url: String,

    /// How long to wait for the backend to answer at all
    pub startup_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    /// Default configuration with `BLOG_E2E_*` environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("BLOG_E2E_API_URL") {
            config.base_url = url;
        } else if let Ok(url) = std::env::var("BLOG_E2E_APP_URL") {
            config.base_url = url;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_to_api_payload() {
        let payload = serde_json::to_value(User::primary()).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "name": "Matti Luukkainen",
                "username": "mluukkai",
                "password": "salainen",
            })
        );
    }

    #[test]
    fn popularity_fixture_has_distinct_like_counts() {
        let blogs = Blog::popularity_fixture();
        let mut counts: Vec<u64> = blogs.iter().map(|b| b.likes).collect();
        counts.sort_unstable();
        counts.dedup();
        assert_eq!(counts.len(), blogs.len());
    }

    #[test]
    fn popularity_fixture_sorted_reference_is_descending() {
        let mut expected: Vec<u64> =
            Blog::popularity_fixture().iter().map(|b| b.likes).collect();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(expected, vec![21, 15, 9, 4]);
    }

    #[test]
    fn api_client_trims_trailing_slash() {
        let client = ApiClient::new(&BackendConfig {
            base_url: "http://localhost:5173/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:5173");
    }
}

//! Blog app scenario suite
//!
//! Each scenario starts from a reset server with the primary fixture user
//! seeded and a fresh browser session at the application root, then performs
//! UI interactions and asserts on user-observable state.
//!
//! Scenarios skip themselves when no live application/WebDriver stack is
//! reachable. Point the suite at a running stack with `BLOG_E2E_APP_URL`
//! and `BLOG_E2E_WEBDRIVER_URL`.

use bloglist_e2e::{helpers, Blog, E2eResult, Scenario, User};

macro_rules! scenario_or_skip {
    () => {
        match Scenario::begin_or_skip().await? {
            Some(scenario) => scenario,
            None => return Ok(()),
        }
    };
}

const LOGIN_CONFIRMATION: &str = "Matti Luukkainen logged in";
const LOGIN_ERROR: &str = "wrong username or password";

#[tokio::test]
async fn login_form_is_shown() -> E2eResult<()> {
    let scenario = scenario_or_skip!();

    scenario
        .session
        .wait_for_test_id(helpers::LOGIN_FORM_TEST_ID)
        .await?;

    scenario.finish().await
}

#[tokio::test]
async fn login_succeeds_with_correct_credentials() -> E2eResult<()> {
    let scenario = scenario_or_skip!();

    helpers::login(&scenario.session, "mluukkai", "salainen").await?;
    scenario.session.wait_for_text(LOGIN_CONFIRMATION).await?;

    scenario.finish().await
}

#[tokio::test]
async fn login_fails_with_wrong_credentials() -> E2eResult<()> {
    let scenario = scenario_or_skip!();

    helpers::login(&scenario.session, "mluukkai", "wrongpassword").await?;

    let error = scenario.session.wait_for_text(LOGIN_ERROR).await?;
    let color = scenario.session.css_color(&error).await?;
    assert_eq!(color, (255, 0, 0), "error message must render in red");

    assert!(
        !scenario.session.text_visible(LOGIN_CONFIRMATION).await?,
        "no login confirmation may appear after a failed login"
    );

    scenario.finish().await
}

#[tokio::test]
async fn logged_in_user_can_create_a_blog() -> E2eResult<()> {
    let scenario = scenario_or_skip!();
    helpers::login(&scenario.session, "mluukkai", "salainen").await?;

    let blog = Blog::canonical();
    helpers::create_blog(&scenario.session, &blog).await?;

    let card = helpers::blog_card(&scenario.session, &blog.title).await?;
    assert!(card.is_rendered().await?);

    scenario.finish().await
}

#[tokio::test]
async fn blog_can_be_liked() -> E2eResult<()> {
    let scenario = scenario_or_skip!();
    helpers::login(&scenario.session, "mluukkai", "salainen").await?;
    helpers::create_blog(&scenario.session, &Blog::canonical()).await?;

    let card = helpers::expand_blog_by_title(&scenario.session, "Best Blog Ever").await?;
    let before = card.likes().await?;
    let after = card.like_once().await?;
    assert_eq!(after, before + 1);

    scenario.finish().await
}

#[tokio::test]
async fn blog_can_be_deleted() -> E2eResult<()> {
    let scenario = scenario_or_skip!();
    helpers::login(&scenario.session, "mluukkai", "salainen").await?;
    helpers::create_blog(&scenario.session, &Blog::canonical()).await?;

    let card = helpers::expand_blog_by_title(&scenario.session, "Best Blog Ever").await?;
    card.remove_accepting_dialog().await?;
    assert!(!card.is_rendered().await?);

    scenario.finish().await
}

#[tokio::test]
async fn delete_button_only_visible_to_creator() -> E2eResult<()> {
    let scenario = scenario_or_skip!();
    helpers::login(&scenario.session, "mluukkai", "salainen").await?;
    helpers::create_blog(&scenario.session, &Blog::canonical()).await?;

    let card = helpers::expand_blog_by_title(&scenario.session, "Best Blog Ever").await?;
    assert!(
        card.remove_control_visible().await?,
        "creator must see the remove control"
    );

    helpers::logout(&scenario.session).await?;

    scenario.api.create_user(&User::secondary()).await?;
    helpers::login(&scenario.session, "evie", "password").await?;

    let card = helpers::expand_blog_by_title(&scenario.session, "Best Blog Ever").await?;
    assert!(
        !card.remove_control_visible().await?,
        "other users must not see the remove control"
    );

    scenario.finish().await
}

#[tokio::test]
async fn blogs_are_ordered_with_most_likes_first() -> E2eResult<()> {
    let scenario = scenario_or_skip!();
    helpers::login(&scenario.session, "mluukkai", "salainen").await?;

    let blogs = Blog::popularity_fixture();
    for blog in &blogs {
        helpers::create_blog(&scenario.session, blog).await?;
        let card = helpers::expand_blog_by_title(&scenario.session, &blog.title).await?;
        for _ in 0..blog.likes {
            // like_once waits for each click to land before the next one
            card.like_once().await?;
        }
    }

    let rendered = helpers::rendered_like_counts(&scenario.session).await?;

    let mut expected: Vec<u64> = blogs.iter().map(|blog| blog.likes).collect();
    expected.sort_unstable_by(|a, b| b.cmp(a));

    assert_eq!(
        rendered, expected,
        "rendered list must be strictly descending by like count"
    );

    scenario.finish().await
}

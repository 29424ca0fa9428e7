//! Per-scenario orchestration
//!
//! Every scenario starts from the same precondition: server state reset, the
//! primary fixture user seeded, and a fresh browser session parked at the
//! application root. Scenarios running concurrently each get their own
//! session and their own reset, so nothing is shared between them.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{E2eError, E2eResult};
use crate::fixtures::{ApiClient, BackendConfig, User};
use crate::session::{Session, SessionConfig};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// One scenario's handles: the admin API client and the browser session
pub struct Scenario {
    pub api: ApiClient,
    pub session: Session,
}

impl Scenario {
    /// Begin a scenario, or return `None` when no live stack is reachable
    ///
    /// Lets the suite pass on machines without the application and a
    /// WebDriver running; CI setups that require the stack use [`begin`].
    ///
    /// [`begin`]: Scenario::begin
    pub async fn begin_or_skip() -> E2eResult<Option<Self>> {
        Self::begin_or_skip_with(ScenarioConfig::from_env()).await
    }

    pub async fn begin_or_skip_with(config: ScenarioConfig) -> E2eResult<Option<Self>> {
        init_tracing();

        let api = ApiClient::new(&config.backend)?;
        if !api.probe().await {
            info!(
                "Application not reachable at {} - skipping scenario",
                config.backend.base_url
            );
            return Ok(None);
        }

        let session = match Session::connect(&config.session).await {
            Ok(session) => session,
            Err(E2eError::Session(e)) => {
                info!(
                    "WebDriver not reachable at {} - skipping scenario ({e})",
                    config.session.webdriver_url
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let scenario = Self { api, session };
        scenario.reset_and_seed().await?;
        Ok(Some(scenario))
    }

    /// Begin a scenario against a stack that must be running
    ///
    /// Waits out backend startup instead of probing once.
    pub async fn begin() -> E2eResult<Self> {
        Self::begin_with(ScenarioConfig::from_env()).await
    }

    pub async fn begin_with(config: ScenarioConfig) -> E2eResult<Self> {
        init_tracing();

        let api = ApiClient::new(&config.backend)?;
        api.wait_until_ready(config.backend.startup_timeout).await?;

        let session = Session::connect(&config.session).await?;

        let scenario = Self { api, session };
        scenario.reset_and_seed().await?;
        Ok(scenario)
    }

    async fn reset_and_seed(&self) -> E2eResult<()> {
        self.api.reset().await?;
        self.api.create_user(&User::primary()).await?;
        self.session.goto_root().await?;
        Ok(())
    }

    /// End the scenario, closing the browser session
    pub async fn finish(self) -> E2eResult<()> {
        self.session.close().await
    }
}

/// Aggregated configuration for one scenario
#[derive(Debug, Clone, Default)]
pub struct ScenarioConfig {
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

impl ScenarioConfig {
    pub fn from_env() -> Self {
        Self {
            backend: BackendConfig::from_env(),
            session: SessionConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_backend_and_browser_at_the_same_app() {
        let config = ScenarioConfig::default();
        assert_eq!(config.backend.base_url, config.session.app_url);
    }
}

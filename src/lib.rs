pub mod api;
pub mod cli;
pub mod config;
pub mod import;
pub mod list;
pub mod models;
pub mod navigation;
pub mod preferences;
pub mod routes;
pub mod session;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use tracing::debug;

use crate::api::{ApiClient, ClientError};
use crate::config::Config;
use crate::navigation::{History, Navigator};
use crate::preferences::Preferences;
use crate::routes::{landing_path, paths, Decision, Router};
use crate::session::SessionStore;
use crate::storage::Storage;

/// Redirect chains longer than this are cut short at the login view
const MAX_REDIRECTS: usize = 4;

/// Everything a front end needs, wired once at startup.
pub struct AppContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub history: Arc<History>,
    pub client: Arc<ApiClient>,
    pub router: Router,
    pub preferences: Preferences,
}

impl AppContext {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let session = Arc::new(SessionStore::rehydrate(storage.clone()));
        let start = session.role().map(landing_path).unwrap_or(paths::LOGIN);
        let history = Arc::new(History::new(start));
        let navigator: Arc<dyn Navigator> = history.clone();
        let client = Arc::new(ApiClient::new(&config.api, session.clone(), navigator)?);

        Ok(Self {
            config,
            session,
            history,
            client,
            router: Router::portal(),
            preferences: Preferences::new(storage),
        })
    }

    /// Navigate to `path`, following guard redirects, and return the final
    /// decision. The resulting location is recorded in the history.
    pub fn visit(&self, path: &str) -> Decision {
        let mut target = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let decision = self.router.resolve(&target, &self.session.snapshot());
            match decision {
                Decision::Render(_) => {
                    self.history.navigate(&target);
                    return decision;
                }
                Decision::Redirect(to) => {
                    debug!(from = %target, to, "Guard redirect");
                    target = to.to_string();
                }
            }
        }
        self.history.navigate(paths::LOGIN);
        Decision::Redirect(paths::LOGIN)
    }
}

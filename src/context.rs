use crate::auth::AuthManager;
use crate::config::Config;
use crate::db::DbPool;

/// Shared application state handed to every handler.
///
/// Holds the connection pool, the token manager, and the configuration;
/// there is no other in-process mutable state.
pub struct AppContext {
    pub db_pool: DbPool,
    pub auth_manager: AuthManager,
    pub config: Config,
}

impl AppContext {
    pub fn new(db_pool: DbPool, config: Config) -> Self {
        let auth_manager = AuthManager::new(&config);
        Self {
            db_pool,
            auth_manager,
            config,
        }
    }
}

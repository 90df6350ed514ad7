use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::{
    cache::RecommendationCache,
    session::{MAX_CODE_LEN, MIN_CODE_LEN},
    store::SessionStore,
};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_min_participants")]
    min_participants: usize,
    #[serde(default = "default_session_code_length")]
    session_code_length: usize,
    #[serde(default = "default_eager_invalidation")]
    eager_invalidation: bool,
    #[serde(default = "default_event_buffer")]
    event_buffer: usize,
}

fn default_min_participants() -> usize {
    2
}

fn default_session_code_length() -> usize {
    6
}

fn default_eager_invalidation() -> bool {
    true
}

fn default_event_buffer() -> usize {
    32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_participants: default_min_participants(),
            session_code_length: default_session_code_length(),
            eager_invalidation: default_eager_invalidation(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Config {
    /// Fewest non-blank participant names a new session may declare.
    pub fn min_participants(&self) -> usize {
        self.min_participants
    }

    /// Length of generated session codes.
    pub fn session_code_length(&self) -> usize {
        self.session_code_length
    }

    /// Whether mutations drop the session's cached recommendation
    /// immediately, rather than leaving it to fail the hash check on the next
    /// read.
    pub fn eager_invalidation(&self) -> bool {
        self.eager_invalidation
    }

    /// Events buffered per session before slow subscribers start lagging.
    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    /// Check values that deserialise fine but would leave the server unable
    /// to create or look up sessions.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&self.session_code_length) {
            return Err(format!(
                "`session_code_length` must be between {MIN_CODE_LEN} and {MAX_CODE_LEN}, got {}",
                self.session_code_length
            ));
        }
        if self.min_participants == 0 {
            return Err("`min_participants` must be positive".to_string());
        }
        Ok(())
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if let Err(e) = config.validate() {
            error!("Invalid application config: {e}");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that creates the session store and recommendation cache and
/// places both into managed state. Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Session store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let store = match rocket.state::<Config>() {
            Some(config) => SessionStore::new(config),
            None => {
                error!("Application config must be loaded before the session store");
                return Err(rocket);
            }
        };
        info!("Session store ready");

        // Manage the state.
        rocket = rocket.manage(store).manage(RecommendationCache::new());
        Ok(rocket)
    }
}

//! Settings for wiring a guard to a file-backed store and a backend.
//!
//! Read from the environment by [`Settings::from_env`]:
//!
//! | Variable                        | Default                  |
//! |---------------------------------|--------------------------|
//! | `ROUTEGATE_STORE`               | `routegate-session.json` |
//! | `ROUTEGATE_API`                 | `http://127.0.0.1:8001`  |
//! | `ROUTEGATE_MODE`                | `local`                  |
//! | `ROUTEGATE_VERIFY_TIMEOUT_SECS` | `10`                     |

use std::path::PathBuf;
use std::time::Duration;

use routegate_guard::{GuardConfig, GuardMode, RouteGuard};
use routegate_store::{JsonFileStorage, KvSessionStore};
use routegate_verify::{AuthClient, VerifierConfig};

use crate::RoutegateError;

pub const STORE_VAR: &str = "ROUTEGATE_STORE";
pub const API_VAR: &str = "ROUTEGATE_API";
pub const MODE_VAR: &str = "ROUTEGATE_MODE";
pub const TIMEOUT_VAR: &str = "ROUTEGATE_VERIFY_TIMEOUT_SECS";

/// The guard over the file store, verifying against the HTTP backend.
pub type FileGuard = RouteGuard<KvSessionStore<JsonFileStorage>, AuthClient>;

/// Everything needed to stand up a guard outside of tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// JSON file holding the session markers.
    pub store_path: PathBuf,

    /// Backend location and request timeout.
    pub api: VerifierConfig,

    /// Guard mode, expiry policy, and redirect targets.
    pub guard: GuardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("routegate-session.json"),
            api: VerifierConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    /// [`RoutegateError::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, RoutegateError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Unset and blank variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RoutegateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(path) = get(STORE_VAR) {
            settings.store_path = PathBuf::from(path);
        }
        if let Some(url) = get(API_VAR) {
            settings.api.base_url = url.trim().to_string();
        }
        if let Some(mode) = get(MODE_VAR) {
            settings.guard.mode = mode
                .parse::<GuardMode>()
                .map_err(|reason| RoutegateError::Config {
                    name: MODE_VAR,
                    reason,
                })?;
        }
        if let Some(secs) = get(TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|e| RoutegateError::Config {
                name: TIMEOUT_VAR,
                reason: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(RoutegateError::Config {
                    name: TIMEOUT_VAR,
                    reason: "must be at least one second".to_string(),
                });
            }
            settings.set_verify_timeout(Duration::from_secs(secs));
        }

        Ok(settings)
    }

    /// Applies `timeout` to both the HTTP client and the guard's own bound.
    pub fn set_verify_timeout(&mut self, timeout: Duration) {
        self.api.timeout = timeout;
        self.guard.verify_timeout = timeout;
    }

    /// Opens the session store at `store_path`.
    pub fn open_store(&self) -> Result<KvSessionStore<JsonFileStorage>, RoutegateError> {
        let storage = JsonFileStorage::open(self.store_path.clone())?;
        Ok(KvSessionStore::open(storage)?)
    }

    /// Builds the HTTP client for the backend's auth endpoints.
    pub fn auth_client(&self) -> Result<AuthClient, RoutegateError> {
        Ok(AuthClient::new(self.api.clone())?)
    }

    /// Opens the store and builds a guard that verifies with `client`.
    ///
    /// The client is only consulted in [`GuardMode::RemoteVerify`].
    pub fn build_guard(&self, client: AuthClient) -> Result<FileGuard, RoutegateError> {
        let store = self.open_store()?;
        let guard = RouteGuard::builder()
            .config(self.guard.clone())
            .verifier(client)
            .build(store)?;
        tracing::info!(
            store = %self.store_path.display(),
            mode = ?self.guard.mode,
            "route guard ready"
        );
        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.guard.mode, GuardMode::LocalOnly);
    }

    #[test]
    fn test_from_lookup_reads_all_vars() {
        let settings = Settings::from_lookup(lookup(&[
            (STORE_VAR, "/var/lib/dash/session.json"),
            (API_VAR, "https://dash.example.com/"),
            (MODE_VAR, "remote"),
            (TIMEOUT_VAR, "3"),
        ]))
        .unwrap();

        assert_eq!(settings.store_path, PathBuf::from("/var/lib/dash/session.json"));
        assert_eq!(settings.api.base_url, "https://dash.example.com/");
        assert_eq!(settings.guard.mode, GuardMode::RemoteVerify);
        assert_eq!(settings.api.timeout, Duration::from_secs(3));
        assert_eq!(settings.guard.verify_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_blank_var_keeps_default() {
        let settings = Settings::from_lookup(lookup(&[(MODE_VAR, "  ")])).unwrap();
        assert_eq!(settings.guard.mode, GuardMode::LocalOnly);
    }

    #[test]
    fn test_from_lookup_bad_mode_is_config_error() {
        let result = Settings::from_lookup(lookup(&[(MODE_VAR, "sometimes")]));
        assert!(matches!(
            result,
            Err(RoutegateError::Config { name: MODE_VAR, .. })
        ));
    }

    #[test]
    fn test_from_lookup_zero_timeout_is_config_error() {
        let result = Settings::from_lookup(lookup(&[(TIMEOUT_VAR, "0")]));
        assert!(matches!(
            result,
            Err(RoutegateError::Config { name: TIMEOUT_VAR, .. })
        ));
    }

    #[test]
    fn test_from_lookup_non_numeric_timeout_is_config_error() {
        let result = Settings::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")]));
        assert!(matches!(result, Err(RoutegateError::Config { .. })));
    }
}

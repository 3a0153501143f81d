//! Drives a route guard from the command line.
//!
//! ```text
//! ROUTEGATE_MODE=remote ROUTEGATE_API_KEY=... nav-sim / /charts/dev-7 /login
//! ```
//!
//! Each argument is a path to navigate to; with none, a short tour of the
//! dashboard is taken. `--logout` ends the stored session first. When
//! `ROUTEGATE_API_KEY` is set, the key is exchanged for a fresh token
//! before navigating.

use routegate::prelude::*;
use routegate::store::EpochMillis;

const API_KEY_VAR: &str = "ROUTEGATE_API_KEY";
const DEFAULT_TOUR: [&str; 4] = ["/", "/charts", "/charts/dev-1", "/login"];

#[tokio::main]
async fn main() -> Result<(), RoutegateError> {
    routegate::init_tracing();

    let settings = Settings::from_env()?;
    let client = settings.auth_client()?;
    let guard = settings.build_guard(client.clone())?;

    let mut paths: Vec<String> = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--logout" {
            logout(&client, guard.store()).await?;
        } else {
            paths.push(arg);
        }
    }
    if paths.is_empty() {
        paths = DEFAULT_TOUR.iter().map(|p| p.to_string()).collect();
    }

    if let Ok(api_key) = std::env::var(API_KEY_VAR) {
        let token = client.login(api_key.trim()).await?;
        begin_session(guard.store(), token, None, EpochMillis::now())?;
    }

    for path in &paths {
        let decision = guard.navigate(path).await;
        match guard.redirect_path(&decision) {
            Some(to) => match decision.notice() {
                Some(notice) => println!("{path:<20} -> {to}  ({notice})"),
                None => println!("{path:<20} -> {to}"),
            },
            None => println!("{path:<20} {decision:?}"),
        }
    }

    Ok(())
}

/// Ends the session on the server (best effort) and locally.
async fn logout<S: SessionStore>(client: &AuthClient, store: &S) -> Result<(), RoutegateError> {
    if let Some(record) = store.read()? {
        if let Err(e) = client.logout(&record.token).await {
            tracing::warn!(error = %e, "server logout failed, clearing locally anyway");
        }
    }
    end_session(store)?;
    println!("logged out");
    Ok(())
}

//! The route guard: one decision per navigation attempt.
//!
//! Every navigation runs the same checks, in this order:
//!
//! ```text
//! 1. route requires auth?
//!      no session ............................ → RedirectLogin(please log in)
//!      local expiry check fails .............. → RedirectLogin(session expired)
//!      RemoteVerify mode:
//!        rejected ............................ → clear, RedirectLogin(session expired)
//!        network error / timeout ............. → clear, RedirectLogin(verification failed)
//!        a newer navigation started meanwhile  → Superseded (nothing touched)
//! 2. route requires admin, user isn't one .... → RedirectHome
//! 3. login page while holding a valid session  → RedirectHome
//! 4. otherwise ............................... → Allowed
//! ```
//!
//! # Sequence numbers
//!
//! Navigations can overlap: the user may click again while a verification
//! is still in flight. Each attempt takes the next number from a counter.
//! When a verification settles, its result is only acted on if no newer
//! attempt has started since; otherwise it is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use routegate_session::{
    Clock, ExpiryPolicy, SessionError, SystemClock, end_session, evaluate,
};
use routegate_store::{CachedUser, SessionStore};
use routegate_verify::{Verifier, VerifyOutcome};

use crate::{
    Decision, GuardConfig, GuardError, GuardMode, NavState, Navigation, Notice, RouteTable,
    Target,
};

// ---------------------------------------------------------------------------
// NoVerifier
// ---------------------------------------------------------------------------

/// Placeholder verifier type for guards that never go remote.
///
/// If it is ever asked, it fails closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerifier;

impl Verifier for NoVerifier {
    async fn verify(&self, _token: &str) -> VerifyOutcome {
        VerifyOutcome::NetworkError("no verifier configured".to_string())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`RouteGuard`].
///
/// # Example
///
/// ```rust
/// use routegate_guard::{GuardMode, RouteGuard};
/// use routegate_store::{KvSessionStore, MemoryStorage};
///
/// let store = KvSessionStore::open(MemoryStorage::new()).unwrap();
/// let guard = RouteGuard::builder()
///     .mode(GuardMode::LocalOnly)
///     .build(store)
///     .unwrap();
/// # let _ = guard;
/// ```
pub struct RouteGuardBuilder<V = NoVerifier, C = SystemClock> {
    config: GuardConfig,
    routes: RouteTable,
    verifier: Option<V>,
    clock: C,
}

impl RouteGuardBuilder {
    /// Defaults: local-only checks, 30/7-day policy, the dashboard routes,
    /// the system clock.
    pub fn new() -> Self {
        Self {
            config: GuardConfig::default(),
            routes: RouteTable::dashboard(),
            verifier: None,
            clock: SystemClock,
        }
    }
}

impl Default for RouteGuardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Verifier, C: Clock> RouteGuardBuilder<V, C> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: GuardMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn policy(mut self, policy: ExpiryPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn verify_timeout(mut self, timeout: Duration) -> Self {
        self.config.verify_timeout = timeout;
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Sets the verifier used in [`GuardMode::RemoteVerify`].
    pub fn verifier<V2: Verifier>(self, verifier: V2) -> RouteGuardBuilder<V2, C> {
        RouteGuardBuilder {
            config: self.config,
            routes: self.routes,
            verifier: Some(verifier),
            clock: self.clock,
        }
    }

    /// Sets the clock expiry is measured against.
    pub fn clock<C2: Clock>(self, clock: C2) -> RouteGuardBuilder<V, C2> {
        RouteGuardBuilder {
            config: self.config,
            routes: self.routes,
            verifier: self.verifier,
            clock,
        }
    }

    /// Builds the guard around `store`.
    ///
    /// # Errors
    /// [`GuardError::MissingVerifier`] if the mode is
    /// [`GuardMode::RemoteVerify`] but no verifier was set.
    pub fn build<S: SessionStore>(self, store: S) -> Result<RouteGuard<S, V, C>, GuardError> {
        if self.config.mode == GuardMode::RemoteVerify && self.verifier.is_none() {
            return Err(GuardError::MissingVerifier);
        }

        Ok(RouteGuard {
            store,
            verifier: self.verifier,
            clock: self.clock,
            routes: self.routes,
            config: self.config,
            seq: AtomicU64::new(0),
            current: Mutex::new(None),
        })
    }
}

// ---------------------------------------------------------------------------
// RouteGuard
// ---------------------------------------------------------------------------

/// Decides every navigation against the stored session.
///
/// Shared by reference (usually behind an `Arc`); `navigate` takes `&self`
/// and overlapping calls are fine.
pub struct RouteGuard<S, V = NoVerifier, C = SystemClock> {
    store: S,
    verifier: Option<V>,
    clock: C,
    routes: RouteTable,
    config: GuardConfig,
    /// Sequence number of the newest navigation started.
    seq: AtomicU64,
    /// The newest navigation and where it stands.
    current: Mutex<Option<Navigation>>,
}

impl RouteGuard<(), NoVerifier, SystemClock> {
    /// Creates a builder with default settings.
    pub fn builder() -> RouteGuardBuilder {
        RouteGuardBuilder::new()
    }
}

impl<S, V, C> RouteGuard<S, V, C>
where
    S: SessionStore,
    V: Verifier,
    C: Clock,
{
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The newest navigation attempt, `None` before the first one.
    pub fn current_navigation(&self) -> Option<Navigation> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Where the router should go for `decision`, `None` to stay on course.
    pub fn redirect_path(&self, decision: &Decision) -> Option<&str> {
        match decision {
            Decision::RedirectLogin { .. } => Some(self.config.login_path.as_str()),
            Decision::RedirectHome => Some(self.config.home_path.as_str()),
            Decision::Allowed | Decision::Superseded => None,
        }
    }

    /// Decides a navigation to `path`.
    ///
    /// Never fails and always settles: in remote mode the wait is bounded
    /// by `verify_timeout`.
    pub async fn navigate(&self, path: &str) -> Decision {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let target = self.routes.resolve(path);
        self.record(seq, &target.path, NavState::Evaluating);

        let decision = self.decide(seq, &target).await;

        tracing::debug!(
            seq,
            path = %target.path,
            route = ?target.name,
            ?decision,
            "navigation decided"
        );
        self.record(seq, &target.path, NavState::Decided(decision.clone()));
        decision
    }

    async fn decide(&self, seq: u64, target: &Target) -> Decision {
        let mut user = None;

        // 1. Authentication.
        if target.meta.requires_auth {
            let record = match evaluate(&self.store, self.clock.now(), &self.config.policy) {
                Ok(record) => record,
                Err(err) => {
                    tracing::info!(seq, reason = %err, "no usable session for protected route");
                    return Decision::login(Notice::for_error(&err));
                }
            };

            if self.config.mode == GuardMode::RemoteVerify {
                if let Err(decision) = self.verify_remote(seq, &record.token).await {
                    return decision;
                }
            }
            user = record.user;
        } else if target.meta.requires_admin {
            user = self.cached_user();
        }

        // 2. Authorization.
        if target.meta.requires_admin && !user.as_ref().is_some_and(CachedUser::is_admin) {
            tracing::info!(seq, path = %target.path, "admin route denied");
            return Decision::RedirectHome;
        }

        // 3. Already logged in. This is a full evaluation: it refreshes
        // last_activity again, or clears an expired session.
        if target.is_named(&self.config.login_route)
            && evaluate(&self.store, self.clock.now(), &self.config.policy).is_ok()
        {
            return Decision::RedirectHome;
        }

        Decision::Allowed
    }

    /// Runs the remote check. `Ok(())` means accepted; `Err` carries the
    /// decision to return instead.
    async fn verify_remote(&self, seq: u64, token: &str) -> Result<(), Decision> {
        let timeout = self.config.verify_timeout;
        let outcome = match &self.verifier {
            Some(verifier) => tokio::time::timeout(timeout, verifier.verify(token))
                .await
                .unwrap_or_else(|_| {
                    VerifyOutcome::NetworkError(format!("no answer within {timeout:?}"))
                }),
            None => VerifyOutcome::NetworkError("no verifier configured".to_string()),
        };

        if self.is_stale(seq) {
            tracing::debug!(seq, %outcome, "discarding verification of superseded navigation");
            return Err(Decision::Superseded);
        }

        let err = match outcome {
            VerifyOutcome::Accepted => return Ok(()),
            VerifyOutcome::Rejected { status } => SessionError::RemoteRejected { status },
            VerifyOutcome::NetworkError(e) => SessionError::TransportFailure(e),
        };
        tracing::warn!(seq, reason = %err, "remote verification failed");
        self.clear_if_current(token);
        Err(Decision::login(Notice::for_error(&err)))
    }

    /// Clears the session if it still holds `token`.
    ///
    /// A login that happened while the verification was in flight wrote a
    /// different token; that one is left alone.
    fn clear_if_current(&self, token: &str) {
        match self.store.read() {
            Ok(Some(record)) if record.token != token => {
                tracing::debug!("session replaced during verification, not clearing");
                return;
            }
            Ok(None) => return,
            Ok(Some(_)) => {}
            Err(e) => tracing::warn!(error = %e, "could not read session, clearing anyway"),
        }
        if let Err(e) = end_session(&self.store) {
            tracing::warn!(error = %e, "failed to clear rejected session");
        }
    }

    fn cached_user(&self) -> Option<CachedUser> {
        match self.store.read() {
            Ok(record) => record.and_then(|r| r.user),
            Err(e) => {
                tracing::warn!(error = %e, "could not read cached user");
                None
            }
        }
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) != seq
    }

    /// Records `state` for navigation `seq`, unless a newer one is tracked.
    fn record(&self, seq: u64, path: &str, state: NavState) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_none_or(|nav| nav.seq <= seq) {
            *current = Some(Navigation {
                seq,
                path: path.to_string(),
                state,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use routegate_store::{KvSessionStore, MemoryStorage};

    use super::*;

    fn store() -> KvSessionStore<MemoryStorage> {
        KvSessionStore::open(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn test_build_remote_without_verifier_fails() {
        let result = RouteGuard::builder()
            .mode(GuardMode::RemoteVerify)
            .build(store());
        assert!(matches!(result, Err(GuardError::MissingVerifier)));
    }

    #[test]
    fn test_build_remote_with_verifier_succeeds() {
        let result = RouteGuard::builder()
            .mode(GuardMode::RemoteVerify)
            .verifier(NoVerifier)
            .build(store());
        assert!(result.is_ok());
    }

    #[test]
    fn test_redirect_path_follows_config() {
        let guard = RouteGuard::builder().build(store()).unwrap();
        assert_eq!(
            guard.redirect_path(&Decision::login(Notice::PleaseLogIn)),
            Some("/login")
        );
        assert_eq!(guard.redirect_path(&Decision::RedirectHome), Some("/"));
        assert_eq!(guard.redirect_path(&Decision::Allowed), None);
        assert_eq!(guard.redirect_path(&Decision::Superseded), None);
    }

    #[test]
    fn test_current_navigation_none_before_first() {
        let guard = RouteGuard::builder().build(store()).unwrap();
        assert_eq!(guard.current_navigation(), None);
    }

    #[tokio::test]
    async fn test_no_verifier_fails_closed() {
        let outcome = NoVerifier.verify("tok").await;
        assert!(matches!(outcome, VerifyOutcome::NetworkError(_)));
    }
}

//! The validity evaluator: applies the expiry policy to the stored session.
//!
//! Evaluation is a read with a deliberate write attached:
//!
//! ```text
//!   read() ──(absent)──────────────────────────────→ MissingSession
//!      │
//!      ├──(issued_at bad / too old)──────→ clear() → ExpiredByAge
//!      │                                 (or MalformedTimestamp / TimestampInFuture)
//!      ├──(last_activity bad / idle)─────→ clear() → ExpiredByInactivity
//!      │                                 (or MalformedTimestamp / TimestampInFuture)
//!      └──(inside both windows)──→ write(last_activity = now) → Ok(record)
//! ```
//!
//! Anything ambiguous resolves to "not valid". A timestamp that does not
//! parse, or that lies after `now`, is an expired session, never a fresh
//! one.

use routegate_store::{CachedUser, EpochMillis, SessionRecord, SessionStore, StoredTimestamp};

use crate::{ExpiryPolicy, SessionError};

/// Checks the stored session against `policy` at time `now`.
///
/// On success the session's `last_activity` has been moved to `now` (never
/// backwards) and the refreshed record is returned. When a window is
/// exceeded the whole session is cleared before returning the reason.
///
/// # Errors
/// - [`SessionError::MissingSession`]: nothing stored
/// - [`SessionError::ExpiredByAge`] / [`SessionError::ExpiredByInactivity`]
/// - [`SessionError::MalformedTimestamp`] / [`SessionError::TimestampInFuture`]:
///   treated as expired
/// - [`SessionError::Store`]: the store couldn't be read, or the refresh
///   couldn't be written
pub fn evaluate<S>(
    store: &S,
    now: EpochMillis,
    policy: &ExpiryPolicy,
) -> Result<SessionRecord, SessionError>
where
    S: SessionStore + ?Sized,
{
    let record = store.read()?.ok_or(SessionError::MissingSession)?;

    if let Err(reason) = check_windows(&record, now, policy) {
        tracing::info!(reason = %reason, "session invalidated");
        if let Err(e) = store.clear() {
            // The verdict stands; the next evaluation will try again.
            tracing::warn!(error = %e, "failed to clear expired session");
        }
        return Err(reason);
    }

    // check_windows rejected anything later than `now`, so this never
    // moves last_activity backwards.
    let refreshed = record.with_last_activity(now);
    store.write(&refreshed)?;

    tracing::trace!(%now, "session refreshed");
    Ok(refreshed)
}

/// Returns `true` if the stored session is usable at `now`.
///
/// Same side effects as [`evaluate`]: a valid session is refreshed, an
/// expired one is cleared.
pub fn is_valid<S>(store: &S, now: EpochMillis, policy: &ExpiryPolicy) -> bool
where
    S: SessionStore + ?Sized,
{
    evaluate(store, now, policy).is_ok()
}

/// Records a successful login: token, issue time, last activity, and the
/// cached user, written as one unit.
///
/// The token itself comes from the backend; this only does the client-side
/// bookkeeping.
pub fn begin_session<S>(
    store: &S,
    token: impl Into<String>,
    user: Option<CachedUser>,
    now: EpochMillis,
) -> Result<SessionRecord, SessionError>
where
    S: SessionStore + ?Sized,
{
    let record = SessionRecord::issued(token, now, user);
    store.write(&record)?;
    tracing::info!(%now, "session started");
    Ok(record)
}

/// Forgets the current session (explicit logout).
pub fn end_session<S>(store: &S) -> Result<(), SessionError>
where
    S: SessionStore + ?Sized,
{
    store.clear()?;
    tracing::info!("session ended");
    Ok(())
}

/// Applies both windows without touching the store.
fn check_windows(
    record: &SessionRecord,
    now: EpochMillis,
    policy: &ExpiryPolicy,
) -> Result<(), SessionError> {
    let issued_at = parse_field("issued_at", &record.issued_at, now)?;
    let age_ms = now.millis_since(issued_at);
    if age_ms > policy.max_age_ms() {
        return Err(SessionError::ExpiredByAge {
            age_ms,
            max_ms: policy.max_age_ms(),
        });
    }

    let last_activity = parse_field("last_activity", &record.last_activity, now)?;
    let idle_ms = now.millis_since(last_activity);
    if idle_ms > policy.max_inactivity_ms() {
        return Err(SessionError::ExpiredByInactivity {
            idle_ms,
            max_ms: policy.max_inactivity_ms(),
        });
    }

    Ok(())
}

/// Parses a stored timestamp that must not lie after `now`.
///
/// A future timestamp would read as zero elapsed time on every check until
/// the wall clock caught up, so it is rejected like an unparsable one.
fn parse_field(
    field: &'static str,
    ts: &StoredTimestamp,
    now: EpochMillis,
) -> Result<EpochMillis, SessionError> {
    let at = ts.parse().ok_or_else(|| SessionError::MalformedTimestamp {
        field,
        value: ts.as_str().to_string(),
    })?;
    if at > now {
        return Err(SessionError::TimestampInFuture {
            field,
            at: at.0,
            now: now.0,
        });
    }
    Ok(at)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the evaluator.
    //!
    //! Naming: `test_{function}_{scenario}_{expected}`. Time is passed in
    //! explicitly, so no test sleeps.

    use std::time::Duration;

    use routegate_store::{KeyValueStorage, KvSessionStore, MemoryStorage, keys};

    use super::*;
    use crate::DAY_MS;

    const T0: EpochMillis = EpochMillis(1_700_000_000_000);
    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn store() -> KvSessionStore<MemoryStorage> {
        KvSessionStore::open(MemoryStorage::new()).unwrap()
    }

    /// A store holding a session issued at `issued` and last used at `last`.
    fn store_with(issued: EpochMillis, last: EpochMillis) -> KvSessionStore<MemoryStorage> {
        let store = store();
        store
            .write(&SessionRecord::issued("tok", issued, None).with_last_activity(last))
            .unwrap();
        store
    }

    fn days(n: u64) -> u64 {
        n * DAY_MS
    }

    // =====================================================================
    // evaluate()
    // =====================================================================

    #[test]
    fn test_evaluate_empty_store_returns_missing() {
        let result = evaluate(&store(), T0, &ExpiryPolicy::default());
        assert!(matches!(result, Err(SessionError::MissingSession)));
    }

    #[test]
    fn test_evaluate_fresh_session_refreshes_last_activity() {
        // Issued at T0, used at T0, navigating at T0+1h.
        let store = store_with(T0, T0);
        let now = T0.plus_millis(HOUR_MS);

        let rec = evaluate(&store, now, &ExpiryPolicy::default()).expect("valid");

        assert_eq!(rec.last_activity.parse(), Some(now));
        let stored = store.read().unwrap().unwrap();
        assert_eq!(stored.last_activity.parse(), Some(now));
        assert_eq!(stored.issued_at.parse(), Some(T0), "issue time untouched");
    }

    #[test]
    fn test_evaluate_too_old_clears_regardless_of_activity() {
        // Active a minute ago, but the token itself is 31 days old.
        let now = T0.plus_millis(days(31));
        let store = store_with(T0, EpochMillis(now.0 - 60_000));

        let result = evaluate(&store, now, &ExpiryPolicy::default());

        assert!(matches!(result, Err(SessionError::ExpiredByAge { .. })));
        assert_eq!(store.read().unwrap(), None, "session must be cleared");
    }

    #[test]
    fn test_evaluate_idle_too_long_clears() {
        // Issued at T0, last used at T0+1d, navigating at T0+29d: inside the
        // 30-day window but idle for 28 days.
        let store = store_with(T0, T0.plus_millis(days(1)));

        let result = evaluate(&store, T0.plus_millis(days(29)), &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::ExpiredByInactivity { .. })
        ));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_evaluate_exactly_at_limits_is_valid() {
        let policy = ExpiryPolicy::new(
            Duration::from_millis(days(7)),
            Duration::from_millis(days(7)),
        );
        let store = store_with(T0, T0);

        let result = evaluate(&store, T0.plus_millis(days(7)), &policy);

        assert!(result.is_ok(), "limits are inclusive, got {result:?}");
    }

    #[test]
    fn test_evaluate_one_ms_past_inactivity_limit_expires() {
        let store = store_with(T0, T0);
        let now = T0.plus_millis(days(7) + 1);

        let result = evaluate(&store, now, &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::ExpiredByInactivity { idle_ms, .. }) if idle_ms == days(7) + 1
        ));
    }

    #[test]
    fn test_evaluate_malformed_issued_at_fails_closed() {
        let store = store();
        store
            .storage()
            .set_many(&[
                (keys::ACCESS_TOKEN, "tok".to_string()),
                (keys::TOKEN_TIMESTAMP, "NaN".to_string()),
                (keys::LAST_ACTIVITY, T0.to_string()),
            ])
            .unwrap();

        let result = evaluate(&store, T0, &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::MalformedTimestamp { field: "issued_at", .. })
        ));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_evaluate_malformed_last_activity_fails_closed() {
        let store = store();
        store
            .storage()
            .set_many(&[
                (keys::ACCESS_TOKEN, "tok".to_string()),
                (keys::TOKEN_TIMESTAMP, T0.to_string()),
                (keys::LAST_ACTIVITY, "soon".to_string()),
            ])
            .unwrap();

        let result = evaluate(&store, T0, &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::MalformedTimestamp { field: "last_activity", .. })
        ));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_evaluate_future_last_activity_fails_closed() {
        // Written while the clock ran an hour ahead.
        let store = store_with(T0, T0.plus_millis(HOUR_MS));

        let result = evaluate(&store, T0.plus_millis(1), &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::TimestampInFuture { field: "last_activity", .. })
        ));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_evaluate_future_issued_at_fails_closed() {
        let store = store_with(T0.plus_millis(days(2)), T0.plus_millis(days(2)));

        let result = evaluate(&store, T0, &ExpiryPolicy::default());

        assert!(matches!(
            result,
            Err(SessionError::TimestampInFuture { field: "issued_at", .. })
        ));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_evaluate_timestamps_equal_to_now_are_valid() {
        let store = store_with(T0, T0);

        let rec = evaluate(&store, T0, &ExpiryPolicy::default()).unwrap();

        assert_eq!(rec.last_activity.parse(), Some(T0));
    }

    #[test]
    fn test_evaluate_twice_is_valid_and_monotonic() {
        let store = store_with(T0, T0);
        let policy = ExpiryPolicy::default();

        let first = evaluate(&store, T0.plus_millis(10), &policy).unwrap();
        let second = evaluate(&store, T0.plus_millis(20), &policy).unwrap();

        let a = first.last_activity.parse().unwrap();
        let b = second.last_activity.parse().unwrap();
        assert!(b >= a);
        assert_eq!(b, T0.plus_millis(20));
    }

    // =====================================================================
    // is_valid() / begin_session() / end_session()
    // =====================================================================

    #[test]
    fn test_is_valid_mirrors_evaluate() {
        let store = store_with(T0, T0);
        assert!(is_valid(&store, T0.plus_millis(1), &ExpiryPolicy::default()));
        assert!(!is_valid(&store, T0.plus_millis(days(40)), &ExpiryPolicy::default()));
        // The expired session was cleared, so it stays invalid.
        assert!(!is_valid(&store, T0, &ExpiryPolicy::default()));
    }

    #[test]
    fn test_begin_session_writes_triple_at_now() {
        let store = store();
        let user = CachedUser::new("root", "admin");

        begin_session(&store, "tok", Some(user.clone()), T0).unwrap();

        let rec = store.read().unwrap().unwrap();
        assert_eq!(rec.token, "tok");
        assert_eq!(rec.issued_at.parse(), Some(T0));
        assert_eq!(rec.last_activity.parse(), Some(T0));
        assert_eq!(rec.user, Some(user));
    }

    #[test]
    fn test_end_session_clears_store() {
        let store = store_with(T0, T0);
        end_session(&store).unwrap();
        assert_eq!(store.read().unwrap(), None);
    }
}

//! Process-wide store session cache.
//!
//! # Responsibilities
//! - Hand out the current client session without locking on the hot path
//! - Refresh it once it ages out of the freshness window
//! - Spread refreshes of an ageing session across requests with jitter
//!
//! # Design Decisions
//! - `ArcSwapOption` holds the session; readers never block writers
//! - Concurrent refreshes are tolerated: each builds a full session and the
//!   last store wins, nothing is ever half-written
//! - A failed refresh keeps serving the previous session when there is one

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::time::Instant;

use super::StoreError;

/// Sessions younger than this are always reused.
pub const FRESH_WINDOW: Duration = Duration::from_secs(65);
/// Sessions older than this are always refreshed.
pub const MAX_AGE: Duration = Duration::from_secs(250);
/// Scale of the early-refresh jitter, in seconds.
const JITTER_SECS: f64 = 60.0;

/// Boxed future returned by a session factory.
pub type SessionFuture<S> = Pin<Box<dyn Future<Output = Result<S, StoreError>> + Send>>;

/// Builds a new session.
pub type SessionFactory<S> = Arc<dyn Fn() -> SessionFuture<S> + Send + Sync>;

struct Session<S> {
    value: Arc<S>,
    created: Instant,
}

/// Cached, periodically refreshed session of type `S`.
pub struct SessionCache<S> {
    current: ArcSwapOption<Session<S>>,
    factory: SessionFactory<S>,
    refresh_timeout: Duration,
}

impl<S: Send + Sync + 'static> SessionCache<S> {
    pub fn new(factory: SessionFactory<S>, refresh_timeout: Duration) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            factory,
            refresh_timeout,
        }
    }

    /// Current session, refreshing it first when it is due.
    pub async fn get(&self) -> Result<Arc<S>, StoreError> {
        let cached = self.current.load_full();
        if let Some(session) = &cached {
            let age = session.created.elapsed();
            if !needs_refresh(age, fastrand::f64()) {
                return Ok(session.value.clone());
            }
        }

        match tokio::time::timeout(self.refresh_timeout, (self.factory)()).await {
            Ok(Ok(value)) => {
                let value = Arc::new(value);
                self.current.store(Some(Arc::new(Session {
                    value: value.clone(),
                    created: Instant::now(),
                })));
                tracing::debug!("store session refreshed");
                Ok(value)
            }
            Ok(Err(e)) => Self::fallback(cached, e),
            Err(_) => Self::fallback(
                cached,
                StoreError::Timeout(format!(
                    "session refresh exceeded {}s",
                    self.refresh_timeout.as_secs()
                )),
            ),
        }
    }

    fn fallback(cached: Option<Arc<Session<S>>>, error: StoreError) -> Result<Arc<S>, StoreError> {
        match cached {
            Some(session) => {
                tracing::warn!(error = %error, "store session refresh failed, reusing previous session");
                Ok(session.value.clone())
            }
            None => Err(error),
        }
    }
}

/// Refresh decision for a session of the given age.
///
/// `roll` is a uniform sample from `[0, 1)`; the older the session, the less
/// likely the roll keeps it.
fn needs_refresh(age: Duration, roll: f64) -> bool {
    if age < FRESH_WINDOW {
        return false;
    }
    if age >= MAX_AGE {
        return true;
    }
    roll * age.as_secs_f64() >= JITTER_SECS
}

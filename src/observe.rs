//! observe
//!
//! Injected observability.
//!
//! A [`Repository`](crate::repo::Repository) does not log into whatever
//! subscriber happens to be global. It carries an [`Observer`] wrapping a
//! `tracing::Dispatch` and installs it as the thread default for the
//! duration of each operation. Tests hand in a capturing dispatcher and
//! see exactly the events one repository emitted.
//!
//! # Example
//!
//! ```
//! use refvault::observe::Observer;
//!
//! let quiet = Observer::none();
//! let _guard = quiet.enter();
//! tracing::info!("dropped on the floor");
//! ```

use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing::subscriber::NoSubscriber;

/// The event sink a repository reports to.
///
/// An observer without a dispatcher leaves the thread default alone, so
/// events go wherever the caller's own subscriber sends them.
#[derive(Clone)]
pub struct Observer {
    dispatch: Option<Dispatch>,
}

impl Observer {
    /// Observe through `dispatch`.
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Observe through the dispatcher that is current on this thread.
    ///
    /// When nothing is listening, the observer stays empty instead of
    /// pinning the no-op dispatcher.
    pub fn current() -> Self {
        let dispatch = dispatcher::get_default(|current| {
            (!current.is::<NoSubscriber>()).then(|| current.clone())
        });
        Self { dispatch }
    }

    /// Discard all events.
    pub fn none() -> Self {
        Self::new(Dispatch::none())
    }

    /// Make this observer the thread default until the guard drops.
    ///
    /// Returns `None` when there is no dispatcher to install. Installing a
    /// live dispatcher refreshes callsite interest, since tracing caches it
    /// from whichever dispatcher was current when a callsite first fired.
    pub fn enter(&self) -> Option<DefaultGuard> {
        let dispatch = self.dispatch.as_ref()?;
        let guard = dispatcher::set_default(dispatch);
        if !dispatch.is::<NoSubscriber>() {
            tracing::callsite::rebuild_interest_cache();
        }
        Some(guard)
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("attached", &self.dispatch.is_some())
            .finish()
    }
}

//! Injectable logging sink.
//!
//! Components emit `tracing` events. A [`Logger`] decides where they go: the
//! process-wide default subscriber, or a specific [`Dispatch`] handed in at
//! construction (for example a test subscriber writing into a buffer).

use std::fmt;
use std::panic;

use tracing::Dispatch;
use tracing::subscriber::NoSubscriber;

use crate::handler::panic_message;

#[derive(Clone, Default)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl Logger {
    /// Log through the process-wide default subscriber.
    pub fn global() -> Self {
        Self::default()
    }

    /// Log through `dispatch` regardless of the global default.
    pub fn scoped(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Route events raised by `f` (and anything it calls) to this logger.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.dispatch.is_some()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("scoped", &self.is_scoped())
            .finish()
    }
}

impl From<Dispatch> for Logger {
    fn from(dispatch: Dispatch) -> Self {
        Logger::scoped(dispatch)
    }
}

/// Report panics through `tracing` instead of stderr.
///
/// Installs a process-wide panic hook. A panic raised while a subscriber is
/// active (inside [`Logger::in_scope`] or under a global default) becomes an
/// error event on that subscriber; otherwise the previously installed hook runs.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let routed = tracing::dispatcher::get_default(|dispatch| !dispatch.is::<NoSubscriber>());
        if !routed {
            previous(info);
            return;
        }
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        tracing::error!(
            panic = %panic_message(info.payload()),
            location = %location,
            "Panic intercepted"
        );
    }));
}

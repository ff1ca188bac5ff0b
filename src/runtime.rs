//! Runtime abstraction layer for driving grid requests
//!
//! The cache hands out plain futures; this module lets the viewer run them on
//! whatever executor the host application uses. Tokio is the default.

use crate::tiles::cache::{GridRequest, Resolution};
use crate::{Error, Result};

/// A trait for spawning grid requests (object-safe)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a request and return a handle to it
    fn spawn_boxed(&self, request: GridRequest) -> Box<dyn RequestHandle>;
}

/// Handle to a spawned grid request
pub trait RequestHandle: Send + Sync {
    /// Check if the batch has completed (published, or discarded as stale)
    fn is_finished(&self) -> bool;
}

/// Spawn `request` on the installed runtime
pub fn spawn(request: GridRequest) -> Result<Box<dyn RequestHandle>> {
    let spawner = runtime().ok_or_else(|| {
        Error::Config(
            "no async runtime available; enable 'tokio-runtime' or call init_runtime".into(),
        )
    })?;
    Ok(spawner.spawn_boxed(request))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner. Must be used from within a Tokio runtime.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, request: GridRequest) -> Box<dyn RequestHandle> {
                let handle = ::tokio::spawn(async move {
                    if let Resolution::Stale { level } = request.await {
                        log::debug!("level {} superseded before it loaded", level);
                    }
                });
                Box::new(TokioHandle(handle))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl RequestHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Install a specific spawner. Only the first call takes effect.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    let _ = RUNTIME.set(spawner);
}

/// Get the global runtime spawner
pub fn runtime() -> Option<&'static dyn AsyncSpawner> {
    #[cfg(feature = "tokio-runtime")]
    {
        Some(
            RUNTIME
                .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
                .as_ref(),
        )
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        RUNTIME.get().map(|spawner| spawner.as_ref())
    }
}

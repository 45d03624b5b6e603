//! Drivers for the hub client's futures.
//!
//! The adapter never polls anything itself: every `start`/`stop`/`send`/
//! `invoke` future is handed to a [`LocalSpawn`] implementation. Any local
//! executor works, e.g. the spawner of `futures::executor::LocalPool`.

pub use futures::task::{LocalSpawn, SpawnError};

/// Spawns onto the `tokio::task::LocalSet` the caller is running inside.
///
/// Spawning outside of a `LocalSet` panics, exactly like
/// `tokio::task::spawn_local`.
#[cfg(feature = "tokio-scheduler")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioLocalSpawner;

#[cfg(feature = "tokio-scheduler")]
impl LocalSpawn for TokioLocalSpawner {
  fn spawn_local_obj(
    &self,
    future: futures::task::LocalFutureObj<'static, ()>,
  ) -> Result<(), SpawnError> {
    // The join handle is dropped on purpose: the task keeps running detached.
    drop(tokio::task::spawn_local(future));
    Ok(())
  }
}

//! # srrx: reactive bindings for real-time hub connections
//!
//! Wraps a SignalR-style hub client so that every remote interaction is an
//! observable stream: one-shot calls, pushed server events, server-to-client
//! streams and the connection state itself.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::executor::LocalPool;
//! use srrx::prelude::*;
//!
//! let mut pool = LocalPool::new();
//! let hub = Srrx::<MyHubClient, _>::new(
//!   SrrxConfig::new("https://example.com/hubs/chat").with_auto_reconnect(true),
//!   pool.spawner(),
//! )?;
//!
//! hub.state().subscribe(|state| println!("connection: {state}"));
//! let messages = hub.on("message").subscribe(|msg| println!("{msg:?}"));
//! hub.start();
//! pool.run_until_stalled();
//!
//! // Removes only this subscription's handler.
//! messages.unsubscribe();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HubClient`] | The capabilities needed from the underlying client |
//! | [`Srrx`] | The adapter turning a hub handle into observables |
//! | [`Observable`] | A source of `next`/`error`/`complete` notifications |
//! | [`Subscription`] | Handle to cancel an active subscription |
//!
//! ## Feature Flags
//!
//! - **`serde`**: `Serialize`/`Deserialize` for the configuration types
//! - **`tokio-scheduler`**: [`TokioLocalSpawner`], driving futures on a
//!   `tokio::task::LocalSet`
//!
//! [`HubClient`]: hub::HubClient
//! [`Srrx`]: srrx::Srrx
//! [`Observable`]: observable::Observable
//! [`Subscription`]: subscription::Subscription
//! [`TokioLocalSpawner`]: scheduler::TokioLocalSpawner

pub mod config;
pub mod hub;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod srrx;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;

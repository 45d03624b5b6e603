//! The capability set the adapter needs from a real-time hub client.
//!
//! Transport negotiation, framing, keep-alive and the reconnect loop all live
//! behind [`HubClient`]; this crate only drives it and turns its callbacks and
//! futures into observables.

use std::{fmt, rc::Rc, time::Duration};

use futures::{future::LocalBoxFuture, task::SpawnError};

use crate::subscriber::Subscriber;

/// Connection state of a hub handle.
///
/// `Disconnecting` is only reported by clients that expose it while `stop`
/// is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HubConnectionState {
  #[default]
  Disconnected,
  Connecting,
  Connected,
  Disconnecting,
  Reconnecting,
}

impl fmt::Display for HubConnectionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      HubConnectionState::Disconnected => "Disconnected",
      HubConnectionState::Connecting => "Connecting",
      HubConnectionState::Connected => "Connected",
      HubConnectionState::Disconnecting => "Disconnecting",
      HubConnectionState::Reconnecting => "Reconnecting",
    };
    f.write_str(name)
  }
}

/// Retry delays used by [`ReconnectPolicy::Default`], in milliseconds. After
/// the last one the client gives up.
pub const DEFAULT_RETRY_DELAYS_MS: [u64; 4] = [0, 2_000, 10_000, 30_000];

/// Automatic-reconnect policy handed to [`HubClient::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconnectPolicy {
  /// The client's stock schedule, see [`DEFAULT_RETRY_DELAYS_MS`].
  Default,
  /// Wait `delays[n]` before retry `n`; give up once the list is exhausted.
  Delays(Vec<Duration>),
}

impl ReconnectPolicy {
  /// Delay before the next attempt after `previous_retry_count` failed ones,
  /// or `None` when the client should stop retrying.
  pub fn next_retry_delay(&self, previous_retry_count: usize) -> Option<Duration> {
    match self {
      ReconnectPolicy::Default => DEFAULT_RETRY_DELAYS_MS
        .get(previous_retry_count)
        .map(|ms| Duration::from_millis(*ms)),
      ReconnectPolicy::Delays(delays) => delays.get(previous_retry_count).copied(),
    }
  }
}

/// A callback registered for a pushed server event.
///
/// Handlers compare by identity: two clones of the same handler are equal,
/// two handlers built from identical closures are not. Clients use this to
/// remove exactly one registration in [`HubClient::off`].
pub struct Handler<V>(Rc<dyn Fn(V)>);

impl<V> Handler<V> {
  pub fn new(callback: impl Fn(V) + 'static) -> Self { Self(Rc::new(callback)) }

  #[inline]
  pub fn call(&self, value: V) { (self.0)(value) }
}

impl<V> Clone for Handler<V> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<V> PartialEq for Handler<V> {
  fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<V> Eq for Handler<V> {}

impl<V> fmt::Debug for Handler<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Handler").field(&Rc::as_ptr(&self.0)).finish()
  }
}

/// Where a server-to-client stream delivers its items.
///
/// Clients call `next` for every item and end with exactly one of `error` or
/// `complete`. Calls after the consumer went away are ignored, so a client
/// does not need to track that itself.
pub struct StreamSink<V, E>(Subscriber<V, E>);

impl<V, E> Clone for StreamSink<V, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<V: 'static, E: 'static> StreamSink<V, E> {
  pub(crate) fn new(subscriber: Subscriber<V, E>) -> Self { Self(subscriber) }

  #[inline]
  pub fn next(&self, item: V) { self.0.next(item) }

  #[inline]
  pub fn error(&self, err: E) { self.0.error(err) }

  #[inline]
  pub fn complete(&self) { self.0.complete() }

  /// True once the stream ended or the consumer unsubscribed.
  #[inline]
  pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// The client-side handle of a running server-to-client stream.
pub trait StreamHandle {
  /// Cancels the stream: the client stops delivering to the sink and tells
  /// the server to release the stream.
  fn dispose(self);
}

/// A real-time hub connection, e.g. a SignalR `HubConnection`.
///
/// The handle is single-threaded: futures are `!Send` and callbacks are
/// invoked on the thread that drives the connection.
pub trait HubClient: Sized + 'static {
  /// Transport / connection options passed through from the configuration
  /// untouched.
  type Options: Clone;
  /// Payload of arguments, invocation results, pushed events and stream
  /// items.
  type Value: Clone + 'static;
  /// Error reported by the client; forwarded to observers verbatim.
  type Error: Clone + 'static;
  type Stream: StreamHandle + 'static;

  /// Builds a handle for `url`. `reconnect` is `None` when automatic
  /// reconnect is disabled.
  fn build(
    url: &str,
    options: Self::Options,
    reconnect: Option<ReconnectPolicy>,
  ) -> Result<Self, Self::Error>;

  fn start(&self) -> LocalBoxFuture<'static, Result<(), Self::Error>>;

  fn stop(&self) -> LocalBoxFuture<'static, Result<(), Self::Error>>;

  /// Fire-and-forget call; resolves once the message was dispatched.
  fn send(
    &self,
    method_name: &str,
    args: Vec<Self::Value>,
  ) -> LocalBoxFuture<'static, Result<(), Self::Error>>;

  /// Request/response call.
  fn invoke(
    &self,
    method_name: &str,
    args: Vec<Self::Value>,
  ) -> LocalBoxFuture<'static, Result<Self::Value, Self::Error>>;

  /// Starts a server-to-client stream delivering into `sink`.
  fn stream(
    &self,
    method_name: &str,
    args: Vec<Self::Value>,
    sink: StreamSink<Self::Value, Self::Error>,
  ) -> Self::Stream;

  /// Registers `handler` for pushes of `method_name`.
  fn on(&self, method_name: &str, handler: Handler<Self::Value>) -> Result<(), Self::Error>;

  /// Removes `handler` from `method_name`, or every handler of `method_name`
  /// when `handler` is `None`.
  fn off(&self, method_name: &str, handler: Option<&Handler<Self::Value>>);

  fn on_reconnecting(&self, callback: Box<dyn Fn(Option<Self::Error>)>);

  /// The callback receives the new connection id, if the client has one.
  fn on_reconnected(&self, callback: Box<dyn Fn(Option<String>)>);

  fn on_close(&self, callback: Box<dyn Fn(Option<Self::Error>)>);

  /// The handle's own view of its state.
  fn state(&self) -> HubConnectionState;

  /// The error a one-shot operation fails with when the scheduler refuses to
  /// run its future.
  fn spawn_failed(err: SpawnError) -> Self::Error;
}

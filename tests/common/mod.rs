//! In-memory hub client driven by the tests.

#![allow(dead_code)]

use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  convert::Infallible,
  rc::Rc,
};

use futures::{
  channel::oneshot,
  executor::{LocalPool, LocalSpawner},
  future::LocalBoxFuture,
  task::SpawnError,
  FutureExt,
};
use serde_json::Value;
use srrx::prelude::*;

pub type TestSrrx = Srrx<FakeHub, LocalSpawner>;

pub const HUB_URL: &str = "wss://hub.test/chat";

/// Adapter over a fresh [`FakeHub`], plus the pool driving its futures.
pub fn adapter() -> (LocalPool, TestSrrx) {
  let pool = LocalPool::new();
  let srrx = TestSrrx::new(SrrxConfig::new(HUB_URL), pool.spawner()).unwrap();
  (pool, srrx)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FakeOptions {
  /// Methods whose handler registration is refused.
  pub reject_listeners: Vec<String>,
}

type Reply<T> = oneshot::Sender<Result<T, String>>;
type Callback<T> = Rc<dyn Fn(T)>;

struct FakeStream {
  method: String,
  args: Vec<Value>,
  sink: StreamSink<Value, String>,
  disposed: Rc<Cell<bool>>,
}

pub struct FakeStreamHandle(Rc<Cell<bool>>);

impl StreamHandle for FakeStreamHandle {
  fn dispose(self) { self.0.set(true) }
}

/// Hub client whose every future is resolved by hand and whose pushes and
/// lifecycle events are triggered by the test.
pub struct FakeHub {
  pub url: String,
  pub options: FakeOptions,
  pub reconnect: Option<ReconnectPolicy>,
  state: Cell<HubConnectionState>,
  starts: RefCell<VecDeque<Reply<()>>>,
  stops: RefCell<VecDeque<Reply<()>>>,
  sends: RefCell<VecDeque<Reply<()>>>,
  invocations: RefCell<VecDeque<Reply<Value>>>,
  calls: RefCell<Vec<(&'static str, String, Vec<Value>)>>,
  streams: RefCell<Vec<FakeStream>>,
  handlers: RefCell<Vec<(String, Handler<Value>)>>,
  reconnecting: RefCell<Vec<Callback<Option<String>>>>,
  reconnected: RefCell<Vec<Callback<Option<String>>>>,
  closed: RefCell<Vec<Callback<Option<String>>>>,
  dropped: Rc<Cell<bool>>,
}

fn reply<T: 'static>(
  queue: &RefCell<VecDeque<Reply<T>>>,
) -> LocalBoxFuture<'static, Result<T, String>> {
  let (tx, rx) = oneshot::channel();
  queue.borrow_mut().push_back(tx);
  async move { rx.await.unwrap_or_else(|_| Err("reply dropped".to_owned())) }.boxed_local()
}

fn resolve<T>(queue: &RefCell<VecDeque<Reply<T>>>, result: Result<T, String>) {
  let tx = queue.borrow_mut().pop_front().expect("no pending call to resolve");
  let _ = tx.send(result);
}

impl FakeHub {
  pub fn set_state(&self, state: HubConnectionState) { self.state.set(state) }

  /// Flips to `true` once this handle is freed.
  pub fn dropped_flag(&self) -> Rc<Cell<bool>> { self.dropped.clone() }

  /// Settles the oldest pending `start`, updating the hub's own state the way
  /// a real client does.
  pub fn resolve_start(&self, result: Result<(), String>) {
    let state = if result.is_ok() {
      HubConnectionState::Connected
    } else {
      HubConnectionState::Disconnected
    };
    self.state.set(state);
    resolve(&self.starts, result);
  }

  /// Settles the oldest pending `stop`; a successful stop fires the close
  /// callbacks first.
  pub fn resolve_stop(&self, result: Result<(), String>) {
    if result.is_ok() {
      self.trigger_close(None);
    }
    resolve(&self.stops, result);
  }

  pub fn resolve_send(&self, result: Result<(), String>) { resolve(&self.sends, result) }

  pub fn resolve_invoke(&self, result: Result<Value, String>) { resolve(&self.invocations, result) }

  /// `(kind, method, args)` of every send/invoke/stream call, in order.
  pub fn calls(&self) -> Vec<(&'static str, String, Vec<Value>)> { self.calls.borrow().clone() }

  /// Delivers a server push to every handler registered for `method`.
  pub fn push(&self, method: &str, value: Value) {
    let handlers: Vec<_> = self
      .handlers
      .borrow()
      .iter()
      .filter(|(m, _)| m == method)
      .map(|(_, h)| h.clone())
      .collect();
    for handler in handlers {
      handler.call(value.clone());
    }
  }

  pub fn handler_count(&self, method: &str) -> usize {
    self.handlers.borrow().iter().filter(|(m, _)| m == method).count()
  }

  pub fn stream_sink(&self, index: usize) -> StreamSink<Value, String> {
    self.streams.borrow()[index].sink.clone()
  }

  pub fn stream_disposed(&self, index: usize) -> bool {
    self.streams.borrow()[index].disposed.get()
  }

  pub fn stream_call(&self, index: usize) -> (String, Vec<Value>) {
    let streams = self.streams.borrow();
    (streams[index].method.clone(), streams[index].args.clone())
  }

  pub fn trigger_reconnecting(&self, err: Option<String>) {
    self.state.set(HubConnectionState::Reconnecting);
    let callbacks = self.reconnecting.borrow().clone();
    callbacks.iter().for_each(|cb| cb(err.clone()));
  }

  pub fn trigger_reconnected(&self, connection_id: Option<String>) {
    self.state.set(HubConnectionState::Connected);
    let callbacks = self.reconnected.borrow().clone();
    callbacks.iter().for_each(|cb| cb(connection_id.clone()));
  }

  pub fn trigger_close(&self, err: Option<String>) {
    self.state.set(HubConnectionState::Disconnected);
    let callbacks = self.closed.borrow().clone();
    callbacks.iter().for_each(|cb| cb(err.clone()));
  }
}

impl HubClient for FakeHub {
  type Options = FakeOptions;
  type Value = Value;
  type Error = String;
  type Stream = FakeStreamHandle;

  fn build(
    url: &str,
    options: FakeOptions,
    reconnect: Option<ReconnectPolicy>,
  ) -> Result<Self, String> {
    if !url.contains("://") {
      return Err(format!("invalid hub url: {url:?}"));
    }
    Ok(FakeHub {
      url: url.to_owned(),
      options,
      reconnect,
      state: Cell::new(HubConnectionState::Disconnected),
      starts: RefCell::default(),
      stops: RefCell::default(),
      sends: RefCell::default(),
      invocations: RefCell::default(),
      calls: RefCell::default(),
      streams: RefCell::default(),
      handlers: RefCell::default(),
      reconnecting: RefCell::default(),
      reconnected: RefCell::default(),
      closed: RefCell::default(),
      dropped: Rc::default(),
    })
  }

  fn start(&self) -> LocalBoxFuture<'static, Result<(), String>> {
    self.state.set(HubConnectionState::Connecting);
    reply(&self.starts)
  }

  fn stop(&self) -> LocalBoxFuture<'static, Result<(), String>> { reply(&self.stops) }

  fn send(
    &self,
    method_name: &str,
    args: Vec<Value>,
  ) -> LocalBoxFuture<'static, Result<(), String>> {
    self.calls.borrow_mut().push(("send", method_name.to_owned(), args));
    reply(&self.sends)
  }

  fn invoke(
    &self,
    method_name: &str,
    args: Vec<Value>,
  ) -> LocalBoxFuture<'static, Result<Value, String>> {
    self.calls.borrow_mut().push(("invoke", method_name.to_owned(), args));
    reply(&self.invocations)
  }

  fn stream(
    &self,
    method_name: &str,
    args: Vec<Value>,
    sink: StreamSink<Value, String>,
  ) -> FakeStreamHandle {
    self.calls.borrow_mut().push(("stream", method_name.to_owned(), args.clone()));
    let disposed = Rc::new(Cell::new(false));
    self.streams.borrow_mut().push(FakeStream {
      method: method_name.to_owned(),
      args,
      sink,
      disposed: disposed.clone(),
    });
    FakeStreamHandle(disposed)
  }

  fn on(&self, method_name: &str, handler: Handler<Value>) -> Result<(), String> {
    if self.options.reject_listeners.iter().any(|m| m == method_name) {
      return Err(format!("cannot listen to {method_name}"));
    }
    self.handlers.borrow_mut().push((method_name.to_owned(), handler));
    Ok(())
  }

  fn off(&self, method_name: &str, handler: Option<&Handler<Value>>) {
    let mut handlers = self.handlers.borrow_mut();
    match handler {
      Some(handler) => {
        if let Some(idx) = handlers.iter().position(|(m, h)| m == method_name && h == handler) {
          handlers.remove(idx);
        }
      }
      None => handlers.retain(|(m, _)| m != method_name),
    }
  }

  fn on_reconnecting(&self, callback: Box<dyn Fn(Option<String>)>) {
    self.reconnecting.borrow_mut().push(Rc::from(callback));
  }

  fn on_reconnected(&self, callback: Box<dyn Fn(Option<String>)>) {
    self.reconnected.borrow_mut().push(Rc::from(callback));
  }

  fn on_close(&self, callback: Box<dyn Fn(Option<String>)>) {
    self.closed.borrow_mut().push(Rc::from(callback));
  }

  fn state(&self) -> HubConnectionState { self.state.get() }

  fn spawn_failed(err: SpawnError) -> String { format!("scheduler refused the call: {err}") }
}

impl Drop for FakeHub {
  fn drop(&mut self) { self.dropped.set(true) }
}

/// How a notification payload shows up in a [`Recorder`] log.
pub trait Render {
  fn render(&self) -> String;
}

impl Render for () {
  fn render(&self) -> String { "()".to_owned() }
}

impl Render for Value {
  fn render(&self) -> String { self.to_string() }
}

impl Render for String {
  fn render(&self) -> String { self.clone() }
}

impl Render for HubConnectionState {
  fn render(&self) -> String { self.to_string() }
}

impl Render for Infallible {
  fn render(&self) -> String { match *self {} }
}

impl<T: Render> Render for Option<T> {
  fn render(&self) -> String { self.as_ref().map_or_else(|| "none".to_owned(), Render::render) }
}

/// Shared log of notifications, rendered as `next <v>`, `error <e>` and
/// `complete`. Several sources may record into the same log to check
/// ordering between them.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
  pub fn observer<T, E>(&self, tag: &'static str) -> impl Observer<T, E> + 'static
  where
    T: Render + 'static,
    E: Render + 'static,
  {
    let (n, e, c) = (self.0.clone(), self.0.clone(), self.0.clone());
    ObserverAll::new(
      move |v: T| n.borrow_mut().push(format!("{tag}next {}", v.render())),
      move |err: E| e.borrow_mut().push(format!("{tag}error {}", err.render())),
      move || c.borrow_mut().push(format!("{tag}complete")),
    )
  }

  /// Subscribes to `source`, logging without a prefix.
  pub fn record<S>(&self, source: S) -> S::Unsub
  where
    S: Observable,
    S::Item: Render + 'static,
    S::Err: Render + 'static,
  {
    source.actual_subscribe(self.observer::<S::Item, S::Err>(""))
  }

  /// Subscribes to `source`, prefixing every entry with `tag`.
  pub fn record_as<S>(&self, tag: &'static str, source: S) -> S::Unsub
  where
    S: Observable,
    S::Item: Render + 'static,
    S::Err: Render + 'static,
  {
    source.actual_subscribe(self.observer::<S::Item, S::Err>(tag))
  }

  pub fn entries(&self) -> Vec<String> { self.0.borrow().clone() }

  pub fn clear(&self) { self.0.borrow_mut().clear() }
}

use std::{
  convert::Infallible,
  rc::{Rc, Weak},
};

use futures::task::{LocalSpawn, SpawnError};

use crate::{
  config::SrrxConfig,
  hub::{Handler, HubClient, HubConnectionState, StreamHandle, StreamSink},
  observable::{
    create, from_future_completion, from_future_result, FutureResult, Observable, ObservableExt,
  },
  rc::MutRc,
  subject::{AsObservable, BehaviorSubject, Subject},
  subscriber::{Subscriber, SubscriberHandle},
  subscription::{ClosureSubscription, DynamicSubscriptions},
};

type StateSubject = BehaviorSubject<HubConnectionState, Infallible>;

/// Handlers this adapter registered on the hub, keyed by subscription.
type HandlerTable<V> = MutRc<DynamicSubscriptions<(String, Handler<V>)>>;

/// Reactive adapter over one hub connection.
///
/// Owns the hub handle exclusively. Remote calls become observables:
///
/// - `start`, `stop`, `send` and `invoke` are one-shot. The call is made
///   right away, whether or not anybody subscribes, and every subscriber sees
///   its outcome. Unsubscribing never cancels the remote operation.
/// - `on`, `once` and `stream` are lazy: each subscription registers its own
///   handler (or opens its own server stream) and releases exactly that when it
///   ends.
/// - `state` is a replaying signal of the connection state, projected from the
///   hub's lifecycle callbacks.
///
/// ```rust,ignore
/// let hub = Srrx::<MyHubClient, _>::new(
///   SrrxConfig::new("https://example.com/hubs/chat").with_auto_reconnect(true),
///   pool.spawner(),
/// )?;
/// hub.state().subscribe(|state| println!("{state}"));
/// hub.on("message").subscribe(|msg| println!("{msg:?}"));
/// hub.start().subscribe_err(|_| {}, |err| eprintln!("{err:?}"));
/// ```
pub struct Srrx<H: HubClient, S> {
  hub: Rc<H>,
  scheduler: S,
  config: Option<SrrxConfig<H::Options>>,
  state: StateSubject,
  closed: Subject<Option<H::Error>, Infallible>,
  reconnecting: Subject<Option<H::Error>, Infallible>,
  reconnected: Subject<Option<String>, Infallible>,
  handlers: HandlerTable<H::Value>,
}

impl<H: HubClient, S: LocalSpawn> Srrx<H, S> {
  /// Builds the hub handle from `config` and wraps it.
  ///
  /// A configuration the client rejects (a malformed url, say) comes back as
  /// the client's own error.
  pub fn new(config: SrrxConfig<H::Options>, scheduler: S) -> Result<Self, H::Error> {
    tracing::debug!(
      url = %config.url,
      auto_reconnect = config.auto_reconnect.is_enabled(),
      "building hub connection"
    );
    let hub = H::build(&config.url, config.connection.clone(), config.auto_reconnect.policy())?;
    let mut srrx = Self::with_hub(hub, scheduler);
    srrx.config = Some(config);
    Ok(srrx)
  }

  /// Wraps an already built hub handle.
  pub fn with_hub(hub: H, scheduler: S) -> Self {
    let srrx = Self {
      hub: Rc::new(hub),
      scheduler,
      config: None,
      state: BehaviorSubject::new(HubConnectionState::Disconnected),
      closed: Subject::default(),
      reconnecting: Subject::default(),
      reconnected: Subject::default(),
      handlers: MutRc::own(DynamicSubscriptions::new()),
    };
    srrx.register_lifecycle_events();
    srrx
  }

  /// The configuration this adapter was built from, if any.
  pub fn config(&self) -> Option<&SrrxConfig<H::Options>> { self.config.as_ref() }

  /// The wrapped hub handle.
  pub fn hub(&self) -> &H { &self.hub }

  /// Connection state: the current value first, then every change. Never
  /// completes while the adapter is alive.
  pub fn state(&self) -> AsObservable<StateSubject> { self.state.as_observable() }

  /// The last known connection state.
  pub fn current_state(&self) -> HubConnectionState { self.state.value() }

  /// Starts the connection.
  ///
  /// `Connecting` is published immediately; `Connected` once the hub reports
  /// success, right before the returned observable completes. If starting
  /// fails the error is forwarded as is, and the state falls back to
  /// `Disconnected` unless the hub itself ended up connected. The same holds
  /// when the scheduler refuses to run the operation at all.
  pub fn start(&self) -> FutureResult<(), H::Error> {
    transition(&self.state, HubConnectionState::Connecting);
    let hub = Rc::downgrade(&self.hub);
    let state = self.state.clone();
    let start = self.hub.start();
    let start = from_future_completion(
      async move {
        let result = start.await;
        match &result {
          Ok(()) => transition(&state, HubConnectionState::Connected),
          Err(_) if !is_connected(&hub) => {
            tracing::debug!("hub start failed");
            transition(&state, HubConnectionState::Disconnected)
          }
          Err(_) => {}
        }
        result
      },
      &self.scheduler,
    );
    if start.is_err() && self.hub.state() != HubConnectionState::Connected {
      transition(&self.state, HubConnectionState::Disconnected);
    }
    spawned::<H, _>(start)
  }

  /// Stops the connection. The state change comes from the hub's close
  /// callback, not from here.
  pub fn stop(&self) -> FutureResult<(), H::Error> {
    spawned::<H, _>(from_future_completion(self.hub.stop(), &self.scheduler))
  }

  /// Fire-and-forget call: completes without a value once the message was
  /// dispatched.
  pub fn send(
    &self,
    method_name: &str,
    args: impl IntoIterator<Item = H::Value>,
  ) -> FutureResult<(), H::Error> {
    tracing::trace!(method = method_name, "send");
    let send = self.hub.send(method_name, args.into_iter().collect());
    spawned::<H, _>(from_future_completion(send, &self.scheduler))
  }

  /// Request/response call: emits the result once, then completes.
  pub fn invoke(
    &self,
    method_name: &str,
    args: impl IntoIterator<Item = H::Value>,
  ) -> FutureResult<H::Value, H::Error> {
    tracing::trace!(method = method_name, "invoke");
    let invoke = self.hub.invoke(method_name, args.into_iter().collect());
    spawned::<H, _>(from_future_result(invoke, &self.scheduler))
  }

  /// Every push of `method_name`, for as long as the subscription lives.
  ///
  /// Each subscription registers its own handler and unsubscribing removes
  /// only that one. A registration the hub rejects is reported on the error
  /// channel.
  pub fn on(
    &self,
    method_name: impl Into<String>,
  ) -> impl Observable<
    Item = H::Value,
    Err = H::Error,
    Unsub = SubscriberHandle<H::Value, H::Error>,
  > {
    let hub = Rc::downgrade(&self.hub);
    let handlers = self.handlers.clone();
    let method_name = method_name.into();
    create(move |subscriber: Subscriber<H::Value, H::Error>| {
      let Some(hub) = hub.upgrade() else {
        tracing::debug!(method = %method_name, "adapter dropped, nothing to listen to");
        subscriber.complete();
        return;
      };
      let emitter = subscriber.clone();
      let handler = Handler::new(move |value: H::Value| emitter.next(value));
      if let Err(err) = hub.on(&method_name, handler.clone()) {
        subscriber.error(err);
        return;
      }

      let id = handlers.rc_deref_mut().add((method_name.clone(), handler));
      tracing::trace!(method = %method_name, id, "hub handler registered");
      let hub = Rc::downgrade(&hub);
      subscriber.add_teardown(ClosureSubscription(move || {
        // Missing when `off` or the adapter's drop already released it.
        let entry = handlers.rc_deref_mut().remove(id);
        if let (Some((method_name, handler)), Some(hub)) = (entry, hub.upgrade()) {
          tracing::trace!(method = %method_name, id, "hub handler released");
          hub.off(&method_name, Some(&handler));
        }
      }));
    })
  }

  /// The next push of `method_name`, then completes and releases its
  /// handler.
  pub fn once(
    &self,
    method_name: impl Into<String>,
  ) -> impl Observable<
    Item = H::Value,
    Err = H::Error,
    Unsub = SubscriberHandle<H::Value, H::Error>,
  > {
    self.on(method_name).first()
  }

  /// Removes every handler of `method_name` at once, including ones that
  /// other subscriptions registered. Those subscriptions stay open but
  /// receive nothing more.
  pub fn off(&self, method_name: &str) {
    self
      .handlers
      .rc_deref_mut()
      .retain(|(method, _)| method != method_name);
    tracing::trace!(method = method_name, "all hub handlers released");
    self.hub.off(method_name, None);
  }

  /// Number of handlers this adapter currently holds for `method_name`.
  pub fn listener_count(&self, method_name: &str) -> usize {
    self
      .handlers
      .rc_deref()
      .iter()
      .filter(|(method, _)| method == method_name)
      .count()
  }

  /// Server-to-client stream: every item, then completion or the server's
  /// error. Unsubscribing early cancels the stream on the hub.
  pub fn stream(
    &self,
    method_name: impl Into<String>,
    args: impl IntoIterator<Item = H::Value>,
  ) -> impl Observable<
    Item = H::Value,
    Err = H::Error,
    Unsub = SubscriberHandle<H::Value, H::Error>,
  > {
    let hub = Rc::downgrade(&self.hub);
    let method_name = method_name.into();
    let args: Vec<_> = args.into_iter().collect();
    create(move |subscriber: Subscriber<H::Value, H::Error>| {
      let Some(hub) = hub.upgrade() else {
        tracing::debug!(method = %method_name, "adapter dropped, stream not opened");
        subscriber.complete();
        return;
      };
      tracing::trace!(method = %method_name, "stream opened");
      let handle = hub.stream(&method_name, args, StreamSink::new(subscriber.clone()));
      subscriber.add_teardown(ClosureSubscription(move || {
        tracing::trace!(method = %method_name, "stream disposed");
        handle.dispose()
      }));
    })
  }

  /// Closes of the connection, with the error that caused them if any.
  pub fn on_close(&self) -> AsObservable<Subject<Option<H::Error>, Infallible>> {
    self.closed.as_observable()
  }

  /// Start of an automatic reconnect, with the error that dropped the
  /// connection if any.
  pub fn on_reconnecting(&self) -> AsObservable<Subject<Option<H::Error>, Infallible>> {
    self.reconnecting.as_observable()
  }

  /// Successful automatic reconnects, with the new connection id if the hub
  /// provides one.
  pub fn on_reconnected(&self) -> AsObservable<Subject<Option<String>, Infallible>> {
    self.reconnected.as_observable()
  }

  fn register_lifecycle_events(&self) {
    let state = self.state.clone();
    let reconnecting = self.reconnecting.clone();
    self.hub.on_reconnecting(Box::new(move |err| {
      tracing::debug!(with_error = err.is_some(), "hub reconnecting");
      transition(&state, HubConnectionState::Reconnecting);
      reconnecting.clone().next(err);
    }));

    let state = self.state.clone();
    let reconnected = self.reconnected.clone();
    self.hub.on_reconnected(Box::new(move |connection_id| {
      tracing::debug!(connection_id = ?connection_id, "hub reconnected");
      transition(&state, HubConnectionState::Connected);
      reconnected.clone().next(connection_id);
    }));

    let state = self.state.clone();
    let closed = self.closed.clone();
    self.hub.on_close(Box::new(move |err| {
      tracing::debug!(with_error = err.is_some(), "hub closed");
      transition(&state, HubConnectionState::Disconnected);
      closed.clone().next(err);
    }));
  }
}

impl<H: HubClient, S> Drop for Srrx<H, S> {
  fn drop(&mut self) {
    let handlers: Vec<_> = self.handlers.rc_deref_mut().drain().collect();
    tracing::debug!(listeners = handlers.len(), "releasing hub adapter");
    for (method_name, handler) in handlers {
      self.hub.off(&method_name, Some(&handler));
    }
    self.state.complete();
    self.closed.complete();
    self.reconnecting.complete();
    self.reconnected.complete();
  }
}

fn transition(state: &StateSubject, to: HubConnectionState) {
  let from = state.value();
  tracing::debug!(%from, %to, "connection state changed");
  state.clone().next(to);
}

fn is_connected<H: HubClient>(hub: &Weak<H>) -> bool {
  hub
    .upgrade()
    .map_or(false, |hub| hub.state() == HubConnectionState::Connected)
}

/// A one-shot the scheduler refused to run fails with the client's error for
/// it instead of never settling.
fn spawned<H: HubClient, Item: Clone>(
  result: Result<FutureResult<Item, H::Error>, SpawnError>,
) -> FutureResult<Item, H::Error> {
  result.unwrap_or_else(|err| {
    tracing::error!(%err, "failed to spawn hub operation onto the local scheduler");
    FutureResult::rejected(H::spawn_failed(err))
  })
}

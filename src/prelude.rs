//! Everything needed to build and consume a hub adapter with one import.

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioLocalSpawner;
pub use crate::{
  config::{AutoReconnect, SrrxConfig},
  hub::{
    Handler, HubClient, HubConnectionState, ReconnectPolicy, StreamHandle, StreamSink,
    DEFAULT_RETRY_DELAYS_MS,
  },
  observable::{
    create, from_future_completion, from_future_result, Create, FutureResult, Observable,
    ObservableExt,
  },
  observer::{BoxedObserver, Observer, ObserverAll},
  scheduler::LocalSpawn,
  srrx::Srrx,
  subject::{AsObservable, BehaviorSubject, Subject},
  subscriber::{Subscriber, SubscriberHandle},
  subscription::{
    BoxedSubscription, ClosureSubscription, Subscription, SubscriptionGuard,
  },
};

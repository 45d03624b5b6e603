//! Observable trait and the subscribe helpers every stream gets for free.

mod create;
mod from_future;
pub use create::*;
pub use from_future::*;

use crate::{
  observer::{Observer, ObserverAll},
  ops::take::Take,
  subscription::Subscription,
};

/// A representation of any set of values over any amount of time.
///
/// Everything the hub adapter returns is an `Observable`: one-shot calls,
/// pushed events, server streams and the connection-state signal alike.
pub trait Observable: Sized {
  type Item;
  type Err;
  type Unsub: Subscription;

  /// Connects `observer` to this source and returns the handle that cancels
  /// the subscription.
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static;
}

/// Convenience subscribe methods and operators for every [`Observable`].
pub trait ObservableExt: Observable {
  /// Subscribe with a `next` handler only. Errors and completion are ignored.
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, |_: Self::Err| {}, || {}))
  }

  /// Subscribe with `next` and `error` handlers.
  fn subscribe_err<N, E>(self, next: N, error: E) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, error, || {}))
  }

  /// Subscribe with `next` and `complete` handlers.
  fn subscribe_complete<N, C>(self, next: N, complete: C) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
    C: FnOnce() + 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, |_: Self::Err| {}, complete))
  }

  /// Subscribe with a handler for every kind of notification.
  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, error, complete))
  }

  /// Emits only the first `count` values, then completes and releases the
  /// source.
  fn take(self, count: usize) -> Take<Self> { Take::new(self, count) }

  /// Emits only the first value, then completes and releases the source.
  fn first(self) -> Take<Self> { self.take(1) }
}

impl<T: Observable> ObservableExt for T {}

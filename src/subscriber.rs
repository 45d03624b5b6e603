use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::{
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::{BoxedSubscription, Subscription},
};

enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct SubscriberState<Item, Err> {
  observer: Option<BoxedObserver<Item, Err>>,
  /// An emission is in flight; anything arriving meanwhile is queued.
  busy: bool,
  queue: VecDeque<Notification<Item, Err>>,
  teardown: SmallVec<[BoxedSubscription; 1]>,
  closed: bool,
}

/// The emitting side of one subscription.
///
/// A `Subscriber` is handed to producers (see [`create`](crate::observable::create)),
/// cloned into hub callbacks and stored in subjects. It guarantees:
///
/// - notifications reach the observer in the order they were emitted, even when
///   the observer itself causes another emission on the same subscriber;
/// - nothing is delivered after the first terminal notification, after
///   `unsubscribe`, or after the observer reports `is_closed`;
/// - every teardown registered with [`add_teardown`](Subscriber::add_teardown)
///   runs exactly once, whichever of those ends the subscription.
pub struct Subscriber<Item, Err>(MutRc<SubscriberState<Item, Err>>);

impl<Item, Err> Clone for Subscriber<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item: 'static, Err: 'static> Subscriber<Item, Err> {
  pub fn new<O>(observer: O) -> Self
  where
    O: Observer<Item, Err> + 'static,
  {
    let closed = observer.is_closed();
    let observer: Option<BoxedObserver<Item, Err>> =
      if closed { None } else { Some(Box::new(observer)) };
    Self(MutRc::own(SubscriberState {
      observer,
      busy: false,
      queue: VecDeque::new(),
      teardown: SmallVec::new(),
      closed,
    }))
  }

  #[inline]
  pub fn next(&self, value: Item) { self.emit(Notification::Next(value)) }

  #[inline]
  pub fn error(&self, err: Err) { self.emit(Notification::Error(err)) }

  #[inline]
  pub fn complete(&self) { self.emit(Notification::Complete) }

  #[inline]
  pub fn is_closed(&self) -> bool { self.0.rc_deref().closed }

  /// Registers work to run when this subscription ends. If it already ended,
  /// the teardown runs right away.
  pub fn add_teardown(&self, teardown: impl Subscription + 'static) {
    let mut state = self.0.rc_deref_mut();
    if state.closed {
      drop(state);
      teardown.unsubscribe();
    } else {
      state.teardown.push(BoxedSubscription::new(teardown));
    }
  }

  /// A handle that can only unsubscribe; this is what callers get back.
  pub fn handle(&self) -> SubscriberHandle<Item, Err> { SubscriberHandle(self.clone()) }

  fn emit(&self, notification: Notification<Item, Err>) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      if state.busy {
        state.queue.push_back(notification);
        return;
      }
      state.busy = true;
    }

    let mut pending = Some(notification);
    while let Some(notification) = pending {
      let observer = self.0.rc_deref_mut().observer.take();
      let Some(mut observer) = observer else { break };
      match notification {
        Notification::Next(value) => {
          observer.next(value);
          let mut state = self.0.rc_deref_mut();
          if state.closed {
            // unsubscribed from inside the observer; teardown already ran
            break;
          } else if observer.is_closed() {
            drop(state);
            self.close();
            break;
          }
          state.observer = Some(observer);
        }
        Notification::Error(err) => {
          observer.error(err);
          self.close();
          break;
        }
        Notification::Complete => {
          observer.complete();
          self.close();
          break;
        }
      }
      pending = self.0.rc_deref_mut().queue.pop_front();
    }
    self.0.rc_deref_mut().busy = false;
  }

  /// Marks the subscription closed and runs the teardowns. Returns the
  /// observer if it was parked, so callers decide whether to notify it.
  fn close(&self) -> Option<BoxedObserver<Item, Err>> {
    let (observer, teardown) = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return None;
      }
      state.closed = true;
      state.queue.clear();
      (state.observer.take(), std::mem::take(&mut state.teardown))
    };
    for t in teardown {
      t.unsubscribe();
    }
    observer
  }
}

/// Unsubscribe-only view of a [`Subscriber`].
pub struct SubscriberHandle<Item, Err>(Subscriber<Item, Err>);

impl<Item, Err> Clone for SubscriberHandle<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item: 'static, Err: 'static> Subscription for SubscriberHandle<Item, Err> {
  fn unsubscribe(self) {
    // The observer is dropped without a terminal notification.
    drop(self.0.close());
  }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

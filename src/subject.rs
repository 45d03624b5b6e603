//! Multicast sources.
//!
//! A [`Subject`] forwards every notification it receives to all current
//! subscribers and replays nothing. A [`BehaviorSubject`] additionally keeps the
//! latest value and hands it to each new subscriber first; the adapter's
//! connection-state signal is one.

mod behavior_subject;
pub use behavior_subject::BehaviorSubject;

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  subscriber::{Subscriber, SubscriberHandle},
  subscription::{ClosureSubscription, DynamicSubscriptions},
};

enum Terminal<Err> {
  Completed,
  Errored(Err),
}

struct SubjectState<Item, Err> {
  observers: DynamicSubscriptions<Subscriber<Item, Err>>,
  terminal: Option<Terminal<Err>>,
}

/// Local, single-threaded multicast subject.
pub struct Subject<Item, Err>(MutRc<SubjectState<Item, Err>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Self(MutRc::own(SubjectState { observers: DynamicSubscriptions::default(), terminal: None }))
  }
}

impl<Item, Err> Subject<Item, Err> {
  /// Number of subscribers currently attached.
  pub fn observer_count(&self) -> usize { self.0.rc_deref().observers.len() }

  /// True once the subject completed or errored.
  pub fn is_terminated(&self) -> bool { self.0.rc_deref().terminal.is_some() }

  /// A read-only view, so holders can subscribe but not emit.
  pub fn as_observable(&self) -> AsObservable<Self> { AsObservable(self.clone()) }
}

impl<Item, Err> Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  /// Snapshot of the subscribers, so delivery happens without holding the
  /// borrow and subscribers may (un)subscribe from inside their handlers.
  fn snapshot(&self) -> Vec<Subscriber<Item, Err>> {
    self.0.rc_deref().observers.iter().cloned().collect()
  }

  pub fn next(&mut self, value: Item) {
    if self.is_terminated() {
      return;
    }
    for subscriber in self.snapshot() {
      subscriber.next(value.clone());
    }
  }

  pub fn error(&mut self, err: Err) {
    let observers: Vec<_> = {
      let mut state = self.0.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Terminal::Errored(err.clone()));
      let drained = state.observers.drain().collect();
      drained
    };
    for subscriber in observers {
      subscriber.error(err.clone());
    }
  }

  pub fn complete(&mut self) {
    let observers: Vec<_> = {
      let mut state = self.0.rc_deref_mut();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(Terminal::Completed);
      let drained = state.observers.drain().collect();
      drained
    };
    for subscriber in observers {
      subscriber.complete();
    }
  }

  /// Attaches an existing subscriber, or delivers the terminal notification
  /// if the subject already finished.
  pub(crate) fn attach(&self, subscriber: Subscriber<Item, Err>) -> SubscriberHandle<Item, Err> {
    let terminal = match &self.0.rc_deref().terminal {
      Some(Terminal::Completed) => Some(None),
      Some(Terminal::Errored(err)) => Some(Some(err.clone())),
      None => None,
    };
    match terminal {
      Some(None) => subscriber.complete(),
      Some(Some(err)) => subscriber.error(err),
      None if !subscriber.is_closed() => {
        let id = self.0.rc_deref_mut().observers.add(subscriber.clone());
        let state = self.0.clone();
        subscriber.add_teardown(ClosureSubscription(move || {
          let removed = state.rc_deref_mut().observers.remove(id);
          drop(removed);
        }));
      }
      None => {}
    }
    subscriber.handle()
  }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubscriberHandle<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    self.attach(Subscriber::new(observer))
  }
}

/// Read-only wrapper around a subject: it can be subscribed to, nothing
/// more.
#[derive(Clone)]
pub struct AsObservable<S>(S);

impl<S: Observable> Observable for AsObservable<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  #[inline]
  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    self.0.actual_subscribe(observer)
  }
}

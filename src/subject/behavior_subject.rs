use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutRc,
  subject::{AsObservable, Subject},
  subscriber::{Subscriber, SubscriberHandle},
};

/// A subject that remembers its latest value.
///
/// Every new subscriber first receives the current value, then every later
/// one. Once the subject completed or errored, new subscribers only get the
/// terminal notification.
pub struct BehaviorSubject<Item, Err> {
  subject: Subject<Item, Err>,
  value: MutRc<Item>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  #[inline]
  pub fn new(value: Item) -> Self { Self { subject: Subject::default(), value: MutRc::own(value) } }

  #[inline]
  pub fn observer_count(&self) -> usize { self.subject.observer_count() }

  pub fn as_observable(&self) -> AsObservable<Self> { AsObservable(self.clone()) }
}

impl<Item: Clone, Err> BehaviorSubject<Item, Err> {
  /// The value a new subscriber would receive right now.
  #[inline]
  pub fn value(&self) -> Item { self.value.rc_deref().clone() }
}

impl<Item, Err> BehaviorSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  pub fn next(&mut self, value: Item) {
    if self.subject.is_terminated() {
      return;
    }
    *self.value.rc_deref_mut() = value.clone();
    self.subject.next(value)
  }

  #[inline]
  pub fn error(&mut self, err: Err) { self.subject.error(err) }

  #[inline]
  pub fn complete(&mut self) { self.subject.complete() }
}

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
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
    let subscriber = Subscriber::new(observer);
    if !self.subject.is_terminated() {
      subscriber.next(self.value());
    }
    self.subject.attach(subscriber)
  }
}

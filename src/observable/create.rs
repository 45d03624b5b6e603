use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::Observer,
  subscriber::{Subscriber, SubscriberHandle},
};

/// Creates an observable from a producer closure.
///
/// The producer runs once per subscription and receives the
/// [`Subscriber`] to emit into. Anything it allocates for that subscription
/// (a hub handler, a server stream) is released through
/// [`Subscriber::add_teardown`], which runs exactly once when the
/// subscription ends, however it ends.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use srrx::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// create(|subscriber: Subscriber<i32, ()>| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
/// })
/// .subscribe(move |v| c_seen.borrow_mut().push(v));
///
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub fn create<F, Item, Err>(producer: F) -> Create<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>),
{
  Create { producer, _marker: PhantomData }
}

/// Observable created from a producer closure, see [`create`].
#[derive(Clone)]
pub struct Create<F, Item, Err> {
  producer: F,
  _marker: PhantomData<(Item, Err)>,
}

impl<F, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>),
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubscriberHandle<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let subscriber = Subscriber::new(observer);
    // An observer that is already closed (e.g. `take(0)`) never reaches the
    // producer, so nothing gets registered on its behalf.
    if !subscriber.is_closed() {
      (self.producer)(subscriber.clone());
    }
    subscriber.handle()
  }
}

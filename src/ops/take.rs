use crate::{observable::Observable, observer::Observer};

/// Emits only the first `count` values emitted by the source Observable.
///
/// After that it completes, regardless of whether the source completes, and
/// the source subscription is released. This is what turns a pushed event
/// (`on`) into a one-shot listener (`once`).
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use srrx::prelude::*;
///
/// let mut subject = Subject::<i32, ()>::default();
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// subject.clone().take(2).subscribe(move |v| c_seen.borrow_mut().push(v));
///
/// for v in 0..5 {
///   subject.next(v);
/// }
/// assert_eq!(*seen.borrow(), vec![0, 1]);
/// ```
#[derive(Clone)]
pub struct Take<S> {
  source: S,
  count: usize,
}

impl<S> Take<S> {
  pub fn new(source: S, count: usize) -> Self { Self { source, count } }
}

impl<S: Observable> Observable for Take<S> {
  type Item = S::Item;
  type Err = S::Err;
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let observer = if self.count == 0 {
      observer.complete();
      None
    } else {
      Some(observer)
    };
    self
      .source
      .actual_subscribe(TakeObserver { observer, remaining: self.count })
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
}

impl<O, Item, Err> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
      self.remaining -= 1;
      if self.remaining == 0 {
        if let Some(observer) = self.observer.take() {
          observer.complete();
        }
      }
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err)
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete()
    }
  }

  fn is_closed(&self) -> bool { self.observer.as_ref().map_or(true, |o| o.is_closed()) }
}

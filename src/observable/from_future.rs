use std::future::Future;

use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::{DynamicSubscriptions, Subscription},
};

/// Converts a `Future` whose output is a `Result` into a one-shot observable:
/// `Ok(v)` is emitted with `next` followed by `complete`, `Err(e)` goes to
/// `error`.
///
/// Unlike a lazily subscribed source, the future is spawned on `scheduler`
/// right away and always runs to completion. Unsubscribing only stops local
/// delivery; the operation it represents has already been handed to the
/// remote side. Subscribers that arrive after the future settled receive the
/// settled outcome.
///
/// Fails only when `scheduler` refuses the future (e.g. its executor is
/// gone); the future is dropped unpolled in that case.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use futures::executor::LocalPool;
/// use srrx::prelude::*;
///
/// let mut pool = LocalPool::new();
/// let value = Rc::new(RefCell::new(None));
/// let c_value = value.clone();
/// from_future_result(async { Ok::<_, ()>(42) }, &pool.spawner())
///   .unwrap()
///   .subscribe(move |v| *c_value.borrow_mut() = Some(v));
///
/// pool.run_until_stalled();
/// assert_eq!(*value.borrow(), Some(42));
/// ```
pub fn from_future_result<F, Item, Err, S>(
  future: F,
  scheduler: &S,
) -> Result<FutureResult<Item, Err>, SpawnError>
where
  F: Future<Output = Result<Item, Err>> + 'static,
  Item: Clone + 'static,
  Err: Clone + 'static,
  S: LocalSpawn + ?Sized,
{
  let result = FutureResult::default();
  let settle = result.clone();
  scheduler.spawn_local(async move {
    let outcome = future.await.map(Some);
    settle.settle(outcome);
  })?;
  Ok(result)
}

/// Like [`from_future_result`] for operations that produce no value: `Ok(())`
/// completes without emitting anything.
pub fn from_future_completion<F, Err, S>(
  future: F,
  scheduler: &S,
) -> Result<FutureResult<(), Err>, SpawnError>
where
  F: Future<Output = Result<(), Err>> + 'static,
  Err: Clone + 'static,
  S: LocalSpawn + ?Sized,
{
  let result = FutureResult::default();
  let settle = result.clone();
  scheduler.spawn_local(async move {
    let outcome = future.await.map(|()| None);
    settle.settle(outcome);
  })?;
  Ok(result)
}

struct FutureState<Item, Err> {
  settled: Option<Result<Option<Item>, Err>>,
  observers: DynamicSubscriptions<BoxedObserver<Item, Err>>,
}

impl<Item, Err> Default for FutureState<Item, Err> {
  fn default() -> Self { Self { settled: None, observers: DynamicSubscriptions::default() } }
}

/// The observable returned by [`from_future_result`] and
/// [`from_future_completion`]. Cloning it shares the same operation.
pub struct FutureResult<Item, Err>(MutRc<FutureState<Item, Err>>);

impl<Item, Err> Clone for FutureResult<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Default for FutureResult<Item, Err> {
  fn default() -> Self { Self(MutRc::own(FutureState::default())) }
}

impl<Item, Err> FutureResult<Item, Err> {
  /// True once the underlying future produced its outcome.
  pub fn is_settled(&self) -> bool { self.0.rc_deref().settled.is_some() }
}

impl<Item: Clone, Err: Clone> FutureResult<Item, Err> {
  /// An operation that already failed with `err`.
  pub fn rejected(err: Err) -> Self {
    let result = Self::default();
    result.settle(Err(err));
    result
  }

  fn settle(&self, outcome: Result<Option<Item>, Err>) {
    let observers: Vec<_> = {
      let mut state = self.0.rc_deref_mut();
      state.settled = Some(outcome.clone());
      let drained = state.observers.drain().collect();
      drained
    };
    for observer in observers {
      deliver(observer, outcome.clone());
    }
  }
}

fn deliver<O, Item, Err>(mut observer: O, outcome: Result<Option<Item>, Err>)
where
  O: Observer<Item, Err>,
{
  match outcome {
    Ok(value) => {
      if let Some(value) = value {
        observer.next(value);
      }
      if !observer.is_closed() {
        observer.complete();
      }
    }
    Err(err) => observer.error(err),
  }
}

impl<Item, Err> Observable for FutureResult<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = FutureResultSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    let settled = self.0.rc_deref().settled.clone();
    if let Some(outcome) = settled {
      deliver(observer, outcome);
      return FutureResultSubscription { state: None, id: 0 };
    }
    let id = self.0.rc_deref_mut().observers.add(Box::new(observer));
    FutureResultSubscription { state: Some(self.0), id }
  }
}

/// Detaches one observer from a [`FutureResult`]; the future keeps running.
pub struct FutureResultSubscription<Item, Err> {
  state: Option<MutRc<FutureState<Item, Err>>>,
  id: usize,
}

impl<Item, Err> Subscription for FutureResultSubscription<Item, Err> {
  fn unsubscribe(self) {
    if let Some(state) = self.state {
      // dropped outside the borrow in case the observer owns other handles
      let observer = state.rc_deref_mut().observers.remove(self.id);
      drop(observer);
    }
  }

  fn is_closed(&self) -> bool {
    self
      .state
      .as_ref()
      .map_or(true, |state| !state.rc_deref().observers.contains(self.id))
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use futures::{channel::oneshot, executor::LocalPool};

  use crate::prelude::*;

  #[srrx_macro::test]
  fn error_goes_to_error_channel() {
    let mut pool = LocalPool::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    let result = from_future_result(async { Err::<i32, _>("nope") }, &pool.spawner()).unwrap();
    result.subscribe_all(
      move |v| n.borrow_mut().push(format!("next {v}")),
      move |err| e.borrow_mut().push(format!("error {err}")),
      move || c.borrow_mut().push("complete".to_owned()),
    );
    pool.run_until_stalled();
    assert_eq!(*log.borrow(), ["error nope"]);
  }

  #[srrx_macro::test]
  fn completion_emits_nothing() {
    let mut pool = LocalPool::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    let result = from_future_completion(async { Ok::<(), ()>(()) }, &pool.spawner()).unwrap();
    result.subscribe_complete(
      move |()| n.borrow_mut().push("next"),
      move || c.borrow_mut().push("complete"),
    );
    pool.run_until_stalled();
    assert_eq!(*log.borrow(), ["complete"]);
  }

  #[srrx_macro::test]
  fn future_runs_without_subscribers_and_replays_to_late_ones() {
    let mut pool = LocalPool::new();
    let ran = Rc::new(RefCell::new(false));
    let c_ran = ran.clone();
    let result = from_future_result(
      async move {
        *c_ran.borrow_mut() = true;
        Ok::<_, ()>("done")
      },
      &pool.spawner(),
    )
    .unwrap();
    pool.run_until_stalled();
    assert!(*ran.borrow());
    assert!(result.is_settled());

    let value = Rc::new(RefCell::new(None));
    let c_value = value.clone();
    result.subscribe(move |v| *c_value.borrow_mut() = Some(v));
    assert_eq!(*value.borrow(), Some("done"));
  }

  #[srrx_macro::test]
  fn unsubscribe_stops_local_delivery_only() {
    let mut pool = LocalPool::new();
    let (tx, rx) = oneshot::channel::<i32>();
    let finished = Rc::new(RefCell::new(false));
    let c_finished = finished.clone();
    let result = from_future_result(
      async move {
        let v = rx.await.map_err(|_| ())?;
        *c_finished.borrow_mut() = true;
        Ok::<_, ()>(v)
      },
      &pool.spawner(),
    )
    .unwrap();
    let value = Rc::new(RefCell::new(None));
    let c_value = value.clone();
    let subscription = result.subscribe(move |v| *c_value.borrow_mut() = Some(v));
    pool.run_until_stalled();
    assert!(!subscription.is_closed());
    subscription.unsubscribe();

    tx.send(7).unwrap();
    pool.run_until_stalled();
    assert!(*finished.borrow());
    assert_eq!(*value.borrow(), None);
  }

  #[srrx_macro::test]
  fn refused_spawn_is_reported() {
    let spawner = LocalPool::new().spawner();
    let result = from_future_result(async { Ok::<_, ()>(1) }, &spawner);
    assert!(result.err().map_or(false, |err| err.is_shutdown()));
  }

  #[srrx_macro::test]
  fn rejected_replays_error() {
    let result = FutureResult::<i32, &str>::rejected("refused");
    assert!(result.is_settled());
    let err = Rc::new(RefCell::new(None));
    let c_err = err.clone();
    result.subscribe_err(|_| {}, move |e| *c_err.borrow_mut() = Some(e));
    assert_eq!(*err.borrow(), Some("refused"));
  }
}

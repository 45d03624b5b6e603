use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

/// Shared, interior-mutable cell for the single-threaded hub event loop.
///
/// Every piece of state the adapter shares between callbacks lives behind one
/// of these. Borrows are always released before calling out to an observer or
/// to the hub client.
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  pub fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

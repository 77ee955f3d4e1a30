//! The per-thread shared container instance and its access function.

use crate::container::Container;
use std::cell::RefCell;

thread_local! {
  // One shared container per thread, created on first access. The container
  // is single-threaded (`Rc` payloads, `&mut self` registration), so a
  // process-wide instance is not offered.
  static SHARED_CONTAINER: RefCell<Container> = RefCell::new(Container::new());
}

/// Runs `f` against the calling thread's shared container.
///
/// This allows wiring dependencies from anywhere in an application without
/// threading a `Container` through every call chain.
///
/// The container stays borrowed for the duration of `f`; re-entering
/// `with_global` from inside `f` panics. Resolve what you need into locals
/// and drop back out instead.
///
/// # Examples
///
/// ```
/// use graft_inject::{injectable, with_global};
///
/// #[derive(Default)]
/// struct Greeting(String);
///
/// injectable!(Greeting);
///
/// fn register_services() {
///   with_global(|container| {
///     container.bind(Greeting("hello".to_owned())).map(|_| ())
///   })
///   .unwrap();
/// }
/// # register_services();
/// ```
pub fn with_global<R>(f: impl FnOnce(&mut Container) -> R) -> R {
  SHARED_CONTAINER.with(|container| f(&mut container.borrow_mut()))
}

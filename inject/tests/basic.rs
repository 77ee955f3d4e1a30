use graft_inject::{injectable, Container, InjectError};
use pretty_assertions::assert_eq;
use std::rc::Rc;

// --- Fixtures ---

trait Clock {
  fn now(&self) -> u64;
}

#[derive(Default)]
struct FixedClock {
  value: u64,
}

impl Clock for FixedClock {
  fn now(&self) -> u64 {
    self.value
  }
}

injectable!(FixedClock);

trait Journal {
  fn label(&self) -> &'static str;
}

#[derive(Default)]
struct MemoryJournal;

impl Journal for MemoryJournal {
  fn label(&self) -> &'static str {
    "memory"
  }
}

injectable!(MemoryJournal);

// --- Tests ---

#[test]
fn test_bind_and_get_share_one_instance() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_as::<dyn Clock, _>(FixedClock { value: 42 }, |clock| clock)
    .unwrap();

  // Act
  let first = container.get::<dyn Clock>().unwrap();
  let second = container.get::<dyn Clock>().unwrap();

  // Assert
  assert_eq!(first.now(), 42);
  assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_rebinding_is_rejected_and_original_survives() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_as::<dyn Clock, _>(FixedClock { value: 7 }, |clock| clock)
    .unwrap();

  // Act
  let result = container.bind_as::<dyn Clock, _>(FixedClock { value: 9 }, |clock| clock);

  // Assert
  assert!(matches!(result, Err(InjectError::AlreadyBound(_))));
  assert_eq!(container.get::<dyn Clock>().unwrap().now(), 7);
}

#[test]
fn test_unmet_trait_contract_fails() {
  let mut container = Container::new();

  let result = container.get::<dyn Journal>();

  assert!(matches!(result, Err(InjectError::UnmetDependency(_))));
}

#[test]
fn test_unmet_concrete_contract_gets_a_hint() {
  let mut container = Container::new();

  // Resolving a concrete type that was never bound suggests the caller
  // probably meant a trait object.
  let result = container.get::<FixedClock>();

  assert!(matches!(result, Err(InjectError::AmbiguousContract(_))));
}

#[test]
fn test_get_optional_unmet_is_none() {
  let mut container = Container::new();

  let journal = container.get_optional::<dyn Journal>().unwrap();

  assert!(journal.is_none());
}

#[test]
fn test_bool_contract_always_resolves_true() {
  let mut container = Container::new();

  // `get` hands out the canonical guard value without a binding; the
  // optional path stays literal.
  assert_eq!(*container.get::<bool>().unwrap(), true);
  assert!(container.get_optional::<bool>().unwrap().is_none());
}

#[test]
fn test_unbind_removes_the_binding() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_as::<dyn Journal, _>(MemoryJournal, |journal| journal)
    .unwrap();
  assert_eq!(container.get::<dyn Journal>().unwrap().label(), "memory");

  // Act
  container.unbind::<dyn Journal>();

  // Assert
  assert!(matches!(
    container.get::<dyn Journal>(),
    Err(InjectError::UnmetDependency(_))
  ));

  // Unbinding an absent contract is a no-op.
  container.unbind::<dyn Journal>();
}

#[test]
fn test_rebind_after_unbind_succeeds() {
  let mut container = Container::new();
  container
    .bind_as::<dyn Clock, _>(FixedClock { value: 1 }, |clock| clock)
    .unwrap();
  container.unbind::<dyn Clock>();

  container
    .bind_as::<dyn Clock, _>(FixedClock { value: 2 }, |clock| clock)
    .unwrap();

  assert_eq!(container.get::<dyn Clock>().unwrap().now(), 2);
}

#[test]
fn test_bind_calls_chain() {
  let mut container = Container::new();

  container
    .bind_as::<dyn Clock, _>(FixedClock { value: 5 }, |clock| clock)
    .unwrap()
    .bind_as::<dyn Journal, _>(MemoryJournal, |journal| journal)
    .unwrap();

  assert_eq!(container.get::<dyn Clock>().unwrap().now(), 5);
  assert_eq!(container.get::<dyn Journal>().unwrap().label(), "memory");
}

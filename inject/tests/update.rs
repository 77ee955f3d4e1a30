use graft_inject::{
  injectable, intern, Container, Injectable, TypeDescriptor, UpdateReceiver,
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// --- Fixtures ---

#[derive(Default)]
struct Pulse {
  ticks: Cell<u32>,
}

impl UpdateReceiver for Pulse {
  fn on_update(&self) {
    self.ticks.set(self.ticks.get() + 1);
  }
}

impl Injectable for Pulse {
  fn descriptor() -> &'static TypeDescriptor {
    intern::<Pulse>(|| TypeDescriptor::builder::<Pulse>().updates().build())
  }
}

type OrderLog = Rc<RefCell<Vec<&'static str>>>;

struct FirstTracer {
  log: OrderLog,
}

impl UpdateReceiver for FirstTracer {
  fn on_update(&self) {
    self.log.borrow_mut().push("first");
  }
}

impl Injectable for FirstTracer {
  fn descriptor() -> &'static TypeDescriptor {
    intern::<FirstTracer>(|| TypeDescriptor::builder::<FirstTracer>().updates().build())
  }
}

struct SecondTracer {
  log: OrderLog,
}

impl UpdateReceiver for SecondTracer {
  fn on_update(&self) {
    self.log.borrow_mut().push("second");
  }
}

impl Injectable for SecondTracer {
  fn descriptor() -> &'static TypeDescriptor {
    intern::<SecondTracer>(|| TypeDescriptor::builder::<SecondTracer>().updates().build())
  }
}

#[derive(Default)]
struct Quiet;

injectable!(Quiet);

// --- Tests ---

#[test]
fn test_update_capable_bindings_receive_ticks() {
  // Arrange
  let mut container = Container::new();
  container.bind(Pulse::default()).unwrap();
  let pulse = container.get::<Pulse>().unwrap();

  // Act
  container.on_update();
  container.on_update();

  // Assert
  assert_eq!(pulse.ticks.get(), 2);
}

#[test]
fn test_updates_run_in_bind_order() {
  // Arrange
  let log: OrderLog = Rc::new(RefCell::new(Vec::new()));
  let mut container = Container::new();
  container
    .bind(FirstTracer { log: log.clone() })
    .unwrap()
    .bind(SecondTracer { log: log.clone() })
    .unwrap();

  // Act
  container.on_update();

  // Assert
  assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn test_non_update_bindings_are_not_registered() {
  let mut container = Container::new();
  container.bind(Quiet).unwrap();
  assert_eq!(container.update_listener_count(), 0);

  container.bind(Pulse::default()).unwrap();
  assert_eq!(container.update_listener_count(), 1);
}

#[test]
fn test_unbind_removes_the_listener() {
  // Arrange
  let mut container = Container::new();
  container.bind(Pulse::default()).unwrap();
  let pulse = container.get::<Pulse>().unwrap();
  container.on_update();

  // Act
  container.unbind::<Pulse>();
  container.on_update();

  // Assert: no tick after removal.
  assert_eq!(pulse.ticks.get(), 1);
  assert_eq!(container.update_listener_count(), 0);
}

#[test]
fn test_lazy_promotion_registers_the_listener_once() {
  // Arrange
  let mut container = Container::new();
  container.bind_lazy::<Pulse, Pulse>(|pulse| pulse).unwrap();
  assert_eq!(container.update_listener_count(), 0);

  // Act
  let pulse = container.get::<Pulse>().unwrap();
  let again = container.get::<Pulse>().unwrap();
  container.on_update();

  // Assert
  assert!(Rc::ptr_eq(&pulse, &again));
  assert_eq!(container.update_listener_count(), 1);
  assert_eq!(pulse.ticks.get(), 1);
}

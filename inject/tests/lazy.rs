use graft_inject::{injectable, Container, InjectError, ServiceRegistry};
use pretty_assertions::assert_eq;
use std::rc::Rc;

// --- Fixtures ---

trait Store {
  fn label(&self) -> &'static str;
}

#[derive(Default)]
struct MemoryStore;

impl Store for MemoryStore {
  fn label(&self) -> &'static str {
    "memory"
  }
}

injectable!(MemoryStore);

#[derive(Default)]
struct DiskStore;

impl Store for DiskStore {
  fn label(&self) -> &'static str {
    "disk"
  }
}

injectable!(DiskStore);

// A lazily built service with a dependency of its own.
#[derive(Default)]
struct Indexer {
  store: Option<Rc<dyn Store>>,
}

injectable!(Indexer {
  required store: dyn Store,
});

// --- Tests ---

#[test]
fn test_lazy_default_promoted_on_get() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_lazy::<dyn Store, MemoryStore>(|store| store)
    .unwrap();

  // Act
  let first = container.get::<dyn Store>().unwrap();
  let second = container.get::<dyn Store>().unwrap();

  // Assert: promotion happened once, the binding is live afterwards.
  assert_eq!(first.label(), "memory");
  assert!(Rc::ptr_eq(&first, &second));
}

#[test]
fn test_lazy_promoted_on_get_optional() {
  let mut container = Container::new();
  container
    .bind_lazy::<dyn Store, MemoryStore>(|store| store)
    .unwrap();

  let store = container.get_optional::<dyn Store>().unwrap();

  assert_eq!(store.unwrap().label(), "memory");
}

#[test]
fn test_lazy_factory_closure() {
  let mut container = Container::new();
  container
    .bind_lazy_with(|| Some(DiskStore), |store: Rc<DiskStore>| store as Rc<dyn Store>)
    .unwrap();

  assert_eq!(container.get::<dyn Store>().unwrap().label(), "disk");
}

#[test]
fn test_factory_producing_nothing_is_unmet() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_lazy_with(|| None, |store: Rc<MemoryStore>| store as Rc<dyn Store>)
    .unwrap();

  // Act
  let result = container.get::<dyn Store>();

  // Assert: the failed factory is consumed, later resolutions are plainly
  // unmet.
  assert!(matches!(result, Err(InjectError::UnmetDependency(_))));
  assert!(matches!(
    container.get::<dyn Store>(),
    Err(InjectError::UnmetDependency(_))
  ));
}

#[test]
fn test_lazy_over_live_binding_is_rejected() {
  let mut container = Container::new();
  container
    .bind_as::<dyn Store, _>(MemoryStore, |store| store)
    .unwrap();

  let result = container.bind_lazy::<dyn Store, DiskStore>(|store| store);

  assert!(matches!(result, Err(InjectError::AlreadyBound(_))));
  assert_eq!(container.get::<dyn Store>().unwrap().label(), "memory");
}

#[test]
fn test_pending_factory_is_replaced_silently() {
  let mut container = Container::new();
  container
    .bind_lazy::<dyn Store, MemoryStore>(|store| store)
    .unwrap();

  // Nothing observed the first factory yet, so the second wins.
  container
    .bind_lazy::<dyn Store, DiskStore>(|store| store)
    .unwrap();

  assert_eq!(container.get::<dyn Store>().unwrap().label(), "disk");
}

#[test]
fn test_binding_displaces_a_pending_factory() {
  // Arrange: a factory is pending, then a live binding arrives for the same
  // contract.
  let ran = Rc::new(std::cell::Cell::new(false));
  let flag = ran.clone();
  let mut container = Container::new();
  container
    .bind_lazy_with(
      move || {
        flag.set(true);
        Some(DiskStore)
      },
      |store: Rc<DiskStore>| store as Rc<dyn Store>,
    )
    .unwrap();
  container
    .bind_as::<dyn Store, _>(MemoryStore, |store| store)
    .unwrap();

  // Act
  let bound = container.get::<dyn Store>().unwrap();
  container.unbind::<dyn Store>();

  // Assert: the displaced factory never runs, and after unbind the contract
  // is fully unmet rather than falling back to it.
  assert_eq!(bound.label(), "memory");
  assert!(!ran.get());
  assert!(matches!(
    container.get::<dyn Store>(),
    Err(InjectError::UnmetDependency(_))
  ));
}

#[test]
fn test_unbind_clears_a_pending_factory() {
  let mut container = Container::new();
  container
    .bind_lazy::<dyn Store, MemoryStore>(|store| store)
    .unwrap();

  container.unbind::<dyn Store>();

  assert!(matches!(
    container.get::<dyn Store>(),
    Err(InjectError::UnmetDependency(_))
  ));
}

#[test]
fn test_promoted_instance_is_injected() {
  // Arrange
  let mut container = Container::new();
  container
    .bind_as::<dyn Store, _>(MemoryStore, |store| store)
    .unwrap();
  container.bind_lazy::<Indexer, Indexer>(|indexer| indexer).unwrap();

  // Act
  let indexer = container.get::<Indexer>().unwrap();

  // Assert: the factory ran the new instance through injection.
  assert_eq!(indexer.store.as_ref().unwrap().label(), "memory");
}

#[test]
fn test_registry_bulk_registration() {
  // Arrange
  let mut registry = ServiceRegistry::new();
  registry
    .service::<Indexer>()
    .service_as::<dyn Store, MemoryStore>(|store| store);
  assert_eq!(registry.len(), 2);

  let mut container = Container::new();
  container.bind_lazy_from_registry(registry).unwrap();

  // Act
  let indexer = container.get::<Indexer>().unwrap();

  // Assert: promoting the indexer promoted its store dependency too.
  assert_eq!(indexer.store.as_ref().unwrap().label(), "memory");
}

#[test]
fn test_registry_factory_entries() {
  let mut registry = ServiceRegistry::new();
  registry.factory(|| Some(DiskStore), |store: Rc<DiskStore>| store as Rc<dyn Store>);

  let mut container = Container::new();
  container.bind_lazy_from_registry(registry).unwrap();

  assert_eq!(container.get::<dyn Store>().unwrap().label(), "disk");
}

#[test]
fn test_registry_respects_live_bindings() {
  let mut container = Container::new();
  container
    .bind_as::<dyn Store, _>(MemoryStore, |store| store)
    .unwrap();

  let mut registry = ServiceRegistry::new();
  registry.service_as::<dyn Store, DiskStore>(|store| store);

  let result = container.bind_lazy_from_registry(registry);

  assert!(matches!(result, Err(InjectError::AlreadyBound(_))));
  assert_eq!(container.get::<dyn Store>().unwrap().label(), "memory");
}

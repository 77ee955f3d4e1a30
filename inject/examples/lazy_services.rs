//! Bulk lazy registration through a service registry. Run with
//! `RUST_LOG=graft_inject=debug` to watch factories being promoted.

use graft_inject::{injectable, Container, ServiceRegistry};
use std::rc::Rc;

trait Store {
  fn put(&self, key: &str);
}

#[derive(Default)]
struct MemoryStore;

impl Store for MemoryStore {
  fn put(&self, key: &str) {
    println!("stored {key}");
  }
}

injectable!(MemoryStore);

#[derive(Default)]
struct Indexer {
  store: Option<Rc<dyn Store>>,
}

injectable!(Indexer {
  required store: dyn Store,
});

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let mut registry = ServiceRegistry::new();
  registry
    .service::<Indexer>()
    .service_as::<dyn Store, MemoryStore>(|store| store);

  let mut container = Container::new();
  container.bind_lazy_from_registry(registry).unwrap();

  // Nothing is constructed until the first resolution; promoting the
  // indexer promotes the store it depends on.
  let indexer = container.get::<Indexer>().unwrap();
  indexer.store.as_ref().unwrap().put("alpha");
}

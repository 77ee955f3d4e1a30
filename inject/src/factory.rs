//! Lazy dependency factories and the bulk service registry.

use crate::container::Container;
use crate::core::{ContractKey, Dependency, UpdateReceiver};
use crate::descriptor::Injectable;
use crate::error::InjectError;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The result of running a lazy factory: the erased instance ready to
/// install, plus its update hook when the type declares one.
pub(crate) struct NewBinding {
  pub(crate) dependency: Dependency,
  pub(crate) update: Option<Rc<dyn UpdateReceiver>>,
}

type Produce = Box<dyn FnOnce(&mut Container) -> Result<Option<NewBinding>, InjectError>>;

/// A deferred construction recipe for a contract type, realized the first
/// time the contract is resolved.
///
/// Two kinds exist: default construction (`T: Default`) and an arbitrary
/// factory closure, whose captures stand in for a bound method's receiver
/// and arguments. Either way production runs against the container, so the
/// produced instance receives its own injection before it is erased.
pub struct LazyFactory {
  kind: FactoryKind,
  produce: Produce,
}

#[derive(Clone, Copy, Debug)]
enum FactoryKind {
  DefaultConstructor,
  Factory,
}

impl LazyFactory {
  /// A factory that builds `T` through its `Default` impl.
  pub fn from_default<C, T>(coerce: fn(Rc<T>) -> Rc<C>) -> Self
  where
    C: ?Sized + Any,
    T: Injectable + Default,
  {
    Self::wrap(FactoryKind::DefaultConstructor, || Some(T::default()), coerce)
  }

  /// A factory that builds `T` by calling `factory`. Returning `None` makes
  /// the eventual resolution fail with an unmet-dependency error; a factory
  /// never succeeds silently with nothing.
  pub fn from_fn<C, T, F>(factory: F, coerce: fn(Rc<T>) -> Rc<C>) -> Self
  where
    C: ?Sized + Any,
    T: Injectable,
    F: FnOnce() -> Option<T> + 'static,
  {
    Self::wrap(FactoryKind::Factory, factory, coerce)
  }

  fn wrap<C, T, F>(kind: FactoryKind, factory: F, coerce: fn(Rc<T>) -> Rc<C>) -> Self
  where
    C: ?Sized + Any,
    T: Injectable,
    F: FnOnce() -> Option<T> + 'static,
  {
    Self {
      kind,
      produce: Box::new(move |container: &mut Container| {
        let Some(mut instance) = factory() else {
          return Ok(None);
        };
        container.inject(&mut instance)?;
        let instance = Rc::new(instance);
        let update = T::descriptor().upcast_update(instance.clone() as Rc<dyn Any>);
        Ok(Some(NewBinding {
          dependency: Dependency::new(coerce(instance)),
          update,
        }))
      }),
    }
  }

  pub(crate) fn produce(
    self,
    container: &mut Container,
  ) -> Result<Option<NewBinding>, InjectError> {
    (self.produce)(container)
  }
}

impl fmt::Debug for LazyFactory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "LazyFactory({:?})", self.kind)
  }
}

/// A finite set of (contract, factory) pairs for bulk lazy registration.
///
/// This is the explicit-registration counterpart of "scan everything loaded
/// for service markers": collaborators that know the candidate types build a
/// registry and hand it to
/// [`Container::bind_lazy_from_registry`](crate::Container::bind_lazy_from_registry).
#[derive(Default)]
pub struct ServiceRegistry {
  entries: Vec<(ContractKey, LazyFactory)>,
}

impl ServiceRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `T` under its own type as the contract.
  pub fn service<T: Injectable + Default>(&mut self) -> &mut Self {
    self
      .entries
      .push((ContractKey::of::<T>(), LazyFactory::from_default::<T, T>(|instance| instance)));
    self
  }

  /// Registers `T` under the contract `C` (the contract-override form).
  pub fn service_as<C, T>(&mut self, coerce: fn(Rc<T>) -> Rc<C>) -> &mut Self
  where
    C: ?Sized + Any,
    T: Injectable + Default,
  {
    self
      .entries
      .push((ContractKey::of::<C>(), LazyFactory::from_default::<C, T>(coerce)));
    self
  }

  /// Registers a factory closure producing `T` under the contract `C`.
  pub fn factory<C, T, F>(&mut self, factory: F, coerce: fn(Rc<T>) -> Rc<C>) -> &mut Self
  where
    C: ?Sized + Any,
    T: Injectable,
    F: FnOnce() -> Option<T> + 'static,
  {
    self
      .entries
      .push((ContractKey::of::<C>(), LazyFactory::from_fn(factory, coerce)));
    self
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub(crate) fn into_entries(self) -> Vec<(ContractKey, LazyFactory)> {
    self.entries
  }
}

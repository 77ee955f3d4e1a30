//! Core data types shared by the container and the descriptor machinery.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// Identifies a contract type: the lookup key a dependency is bound under.
///
/// A contract is usually a trait object (`dyn SomeService`) but may be a
/// concrete type. The key captures the type name alongside the `TypeId` so
/// failures can report something better than an opaque id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractKey {
  type_id: TypeId,
  type_name: &'static str,
}

impl ContractKey {
  pub fn of<C: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<C>(),
      type_name: std::any::type_name::<C>(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Whether the key names a trait object, the "interface-like" shape a
  /// contract is expected to have. Resolution failures for concrete keys get
  /// a hint that the caller probably meant a trait object.
  pub fn is_trait_object(&self) -> bool {
    self.type_name.starts_with("dyn ")
  }

  pub(crate) fn is_bool(&self) -> bool {
    self.type_id == TypeId::of::<bool>()
  }
}

impl fmt::Debug for ContractKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Contract({})", self.type_name)
  }
}

/// A type-erased handle to a bound instance.
///
/// The outer `Rc<dyn Any>` wraps an `Rc<C>` for the contract type `C`, so a
/// `Dependency` can carry trait objects and concrete types alike. Cloning is
/// a reference-count bump; typed access is an inner downcast.
#[derive(Clone)]
pub struct Dependency {
  inner: Rc<dyn Any>,
  contract_name: &'static str,
}

impl Dependency {
  pub fn new<C: ?Sized + Any>(instance: Rc<C>) -> Self {
    Self {
      inner: Rc::new(instance),
      contract_name: std::any::type_name::<C>(),
    }
  }

  /// Extracts the payload as `Rc<C>`. Returns `None` when the dependency was
  /// bound under a different contract type.
  pub fn downcast<C: ?Sized + Any>(&self) -> Option<Rc<C>> {
    self.inner.downcast_ref::<Rc<C>>().cloned()
  }

  /// The name of the contract type this dependency was bound under.
  pub fn contract_name(&self) -> &'static str {
    self.contract_name
  }

  pub(crate) fn payload(&self) -> &dyn Any {
    &*self.inner
  }
}

impl fmt::Debug for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Dependency({})", self.contract_name)
  }
}

/// Update capability: a bound dependency implementing this trait is called
/// back once per [`Container::on_update`](crate::Container::on_update) tick,
/// in bind order.
///
/// The hook takes `&self`; listeners that mutate state on update keep it in
/// `Cell`/`RefCell` fields.
pub trait UpdateReceiver {
  fn on_update(&self);
}

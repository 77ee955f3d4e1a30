//! Type descriptors: the metadata capability the container injects from.
//!
//! Rust has no runtime reflection, so the attribute-scanning half of a
//! classic injection container is reframed as explicit metadata. Every
//! injectable type carries a [`TypeDescriptor`] enumerating its injectable
//! fields, injectable methods, named callables and static functions. The
//! descriptor is produced once per type through [`TypeDescriptorBuilder`],
//! which accepts plain typed functions and erases them behind `dyn Any`
//! plumbing, so the container can work on targets it knows nothing about.
//!
//! Descriptors for non-generic types usually live in a
//! `once_cell::sync::Lazy` inside the `Injectable` impl. Generic types must
//! go through [`intern`] instead: a `static` inside a generic function is
//! shared across instantiations, while the interner keys by `TypeId` and
//! hands out one descriptor per concrete instantiation.

use crate::core::{ContractKey, Dependency, UpdateReceiver};
use crate::error::InjectError;
use crate::invoke::ArgList;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::rc::Rc;

/// Implemented by every type the container can bind or inject into.
///
/// The descriptor is built once and cached; implementations return the same
/// `&'static` reference on every call. Types with no injectable members
/// return an empty descriptor (the [`injectable!`](crate::injectable) macro
/// generates exactly that).
pub trait Injectable: Any {
  fn descriptor() -> &'static TypeDescriptor
  where
    Self: Sized;
}

type Setter = Box<dyn Fn(&mut dyn Any, Option<Dependency>) -> Result<(), InjectError> + Send + Sync>;
type MethodGlue = Box<dyn Fn(&mut dyn Any, &mut ArgList) -> Result<(), InjectError> + Send + Sync>;
type CallGlue =
  Box<dyn Fn(&mut dyn Any, &mut ArgList) -> Result<Box<dyn Any>, InjectError> + Send + Sync>;
type FunctionGlue = Box<dyn Fn(&mut ArgList) -> Result<Box<dyn Any>, InjectError> + Send + Sync>;
type Projection = Box<dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync>;
type UpdateUpcast = fn(Rc<dyn Any>) -> Option<Rc<dyn UpdateReceiver>>;

/// An injectable field: a contract-typed slot written during injection.
pub struct FieldSpec {
  pub(crate) name: &'static str,
  pub(crate) contract: ContractKey,
  pub(crate) optional: bool,
  pub(crate) set: Setter,
}

/// An injectable method: every parameter is resolved from the container and
/// the method is invoked once per injection pass. A method with no
/// parameters still runs, which is how post-injection lifecycle hooks are
/// expressed.
pub struct MethodSpec {
  pub(crate) name: &'static str,
  pub(crate) params: Vec<ContractKey>,
  pub(crate) invoke: MethodGlue,
}

/// A callable reachable by name through [`Container::invoke`]: leading
/// parameters are filled from the caller's explicit arguments, trailing ones
/// are resolved from the container.
///
/// [`Container::invoke`]: crate::Container::invoke
pub struct CallableSpec {
  pub(crate) name: &'static str,
  pub(crate) params: Vec<ContractKey>,
  pub(crate) invoke: CallGlue,
}

/// A static (receiver-less) callable reachable through
/// [`Container::invoke_static`](crate::Container::invoke_static).
pub struct FunctionSpec {
  pub(crate) name: &'static str,
  pub(crate) params: Vec<ContractKey>,
  pub(crate) invoke: FunctionGlue,
}

pub(crate) struct ParentLink {
  pub(crate) descriptor: fn() -> &'static TypeDescriptor,
  pub(crate) project: Projection,
}

/// The injectable surface of one type.
pub struct TypeDescriptor {
  target: TypeId,
  target_name: &'static str,
  pub(crate) fields: Vec<FieldSpec>,
  pub(crate) methods: Vec<MethodSpec>,
  pub(crate) calls: Vec<CallableSpec>,
  pub(crate) functions: Vec<FunctionSpec>,
  pub(crate) parent: Option<ParentLink>,
  update: Option<UpdateUpcast>,
}

impl TypeDescriptor {
  /// Starts a descriptor for `T`.
  ///
  /// ```
  /// use graft_inject::{Injectable, TypeDescriptor};
  /// use once_cell::sync::Lazy;
  /// use std::rc::Rc;
  ///
  /// trait Clock {
  ///   fn now(&self) -> u64;
  /// }
  ///
  /// struct Stopwatch {
  ///   clock: Option<Rc<dyn Clock>>,
  /// }
  ///
  /// impl Injectable for Stopwatch {
  ///   fn descriptor() -> &'static TypeDescriptor {
  ///     static DESC: Lazy<TypeDescriptor> = Lazy::new(|| {
  ///       TypeDescriptor::builder::<Stopwatch>()
  ///         .required_field::<dyn Clock>("clock", |target, value| target.clock = value)
  ///         .build()
  ///     });
  ///     &DESC
  ///   }
  /// }
  /// ```
  pub fn builder<T: Any>() -> TypeDescriptorBuilder<T> {
    TypeDescriptorBuilder {
      descriptor: TypeDescriptor {
        target: TypeId::of::<T>(),
        target_name: std::any::type_name::<T>(),
        fields: Vec::new(),
        methods: Vec::new(),
        calls: Vec::new(),
        functions: Vec::new(),
        parent: None,
        update: None,
      },
      _target: PhantomData,
    }
  }

  pub(crate) fn target(&self) -> TypeId {
    self.target
  }

  pub(crate) fn target_name(&self) -> &'static str {
    self.target_name
  }

  /// Upcasts a freshly bound instance to its update hook, when the
  /// descriptor declared one.
  pub(crate) fn upcast_update(&self, instance: Rc<dyn Any>) -> Option<Rc<dyn UpdateReceiver>> {
    self.update.and_then(|upcast| upcast(instance))
  }
}

/// Typed builder for [`TypeDescriptor`]. Member functions are plain `fn`
/// pointers over the concrete target type; the builder wraps them in the
/// type-erased glue the container executes.
pub struct TypeDescriptorBuilder<T: Any> {
  descriptor: TypeDescriptor,
  _target: PhantomData<fn(T)>,
}

impl<T: Any> TypeDescriptorBuilder<T> {
  /// Declares a required injectable field of contract type `C`. The setter
  /// receives `Some` on every injection; resolution failure aborts the
  /// injection pass before the setter runs.
  pub fn required_field<C: ?Sized + Any>(
    self,
    name: &'static str,
    set: fn(&mut T, Option<Rc<C>>),
  ) -> Self {
    self.push_field(name, set, false)
  }

  /// Declares an optional injectable field. The setter receives `Some` when
  /// the contract resolves and `None` when the contract was explicitly
  /// unbound; an unmet contract that was never bound leaves the field
  /// untouched.
  pub fn optional_field<C: ?Sized + Any>(
    self,
    name: &'static str,
    set: fn(&mut T, Option<Rc<C>>),
  ) -> Self {
    self.push_field(name, set, true)
  }

  fn push_field<C: ?Sized + Any>(
    mut self,
    name: &'static str,
    set: fn(&mut T, Option<Rc<C>>),
    optional: bool,
  ) -> Self {
    let erased = move |any: &mut dyn Any, value: Option<Dependency>| -> Result<(), InjectError> {
      let target = any
        .downcast_mut::<T>()
        .ok_or_else(|| InjectError::wrong_target(std::any::type_name::<T>()))?;
      let value = match value {
        Some(dependency) => Some(dependency.downcast::<C>().ok_or_else(|| {
          InjectError::TypeMismatch(format!(
            "field `{name}` expects {}, found {}",
            std::any::type_name::<C>(),
            dependency.contract_name()
          ))
        })?),
        None => None,
      };
      set(target, value);
      Ok(())
    };
    self.descriptor.fields.push(FieldSpec {
      name,
      contract: ContractKey::of::<C>(),
      optional,
      set: Box::new(erased),
    });
    self
  }

  /// Declares an injectable method. `params` lists the contract of every
  /// parameter in declaration order; the glue pulls them back out of the
  /// [`ArgList`] with [`ArgList::take`](crate::ArgList::take).
  pub fn method(
    mut self,
    name: &'static str,
    params: Vec<ContractKey>,
    invoke: fn(&mut T, &mut ArgList) -> Result<(), InjectError>,
  ) -> Self {
    self.descriptor.methods.push(MethodSpec {
      name,
      params,
      invoke: Box::new(move |any: &mut dyn Any, args: &mut ArgList| {
        let target = any
          .downcast_mut::<T>()
          .ok_or_else(|| InjectError::wrong_target(std::any::type_name::<T>()))?;
        invoke(target, args)
      }),
    });
    self
  }

  /// Declares a callable reachable by name through `invoke`. Value
  /// parameters and contract parameters are listed together, in declaration
  /// order; whichever of them the caller does not supply explicitly are
  /// resolved from the container.
  pub fn call(
    mut self,
    name: &'static str,
    params: Vec<ContractKey>,
    invoke: fn(&mut T, &mut ArgList) -> Result<Box<dyn Any>, InjectError>,
  ) -> Self {
    self.descriptor.calls.push(CallableSpec {
      name,
      params,
      invoke: Box::new(move |any: &mut dyn Any, args: &mut ArgList| {
        let target = any
          .downcast_mut::<T>()
          .ok_or_else(|| InjectError::wrong_target(std::any::type_name::<T>()))?;
        invoke(target, args)
      }),
    });
    self
  }

  /// Declares a static function reachable through `invoke_static`.
  pub fn function(
    mut self,
    name: &'static str,
    params: Vec<ContractKey>,
    invoke: fn(&mut ArgList) -> Result<Box<dyn Any>, InjectError>,
  ) -> Self {
    self.descriptor.functions.push(FunctionSpec {
      name,
      params,
      invoke: Box::new(invoke),
    });
    self
  }

  /// Links the descriptor to an ancestor embedded in `T`. The ancestor's
  /// injectable members are merged into `T`'s plan, applied through
  /// `project`; members redeclared on `T` (same name) override the
  /// ancestor's.
  pub fn extends<B: Injectable>(mut self, project: fn(&mut T) -> &mut B) -> Self {
    self.descriptor.parent = Some(ParentLink {
      descriptor: B::descriptor,
      project: Box::new(move |any: &mut dyn Any| {
        any
          .downcast_mut::<T>()
          .map(|target| project(target) as &mut dyn Any)
      }),
    });
    self
  }

  /// Marks `T` as update-capable: instances bound into a container are
  /// appended to its update listener list.
  pub fn updates(mut self) -> Self
  where
    T: UpdateReceiver,
  {
    self.descriptor.update = Some(|any: Rc<dyn Any>| {
      any
        .downcast::<T>()
        .ok()
        .map(|instance| instance as Rc<dyn UpdateReceiver>)
    });
    self
  }

  pub fn build(self) -> TypeDescriptor {
    self.descriptor
  }
}

/// Shorthand for a parameter's contract key in `method`/`call`/`function`
/// declarations.
pub fn contract<C: ?Sized + Any>() -> ContractKey {
  ContractKey::of::<C>()
}

static DESCRIPTORS: Lazy<DashMap<TypeId, &'static TypeDescriptor>> = Lazy::new(DashMap::new);

/// Builds (once) and returns the descriptor for `T`, keyed by `TypeId`.
///
/// Required for generic types, whose `Injectable` impls cannot use a local
/// `static`: one `static` would be shared by every instantiation. The
/// builder runs outside the map lock, so descriptors may refer to each other
/// through [`TypeDescriptorBuilder::extends`] freely.
pub fn intern<T: Any>(build: fn() -> TypeDescriptor) -> &'static TypeDescriptor {
  let id = TypeId::of::<T>();
  if let Some(found) = DESCRIPTORS.get(&id) {
    return *found;
  }
  let built: &'static TypeDescriptor = Box::leak(Box::new(build()));
  *DESCRIPTORS.entry(id).or_insert(built)
}

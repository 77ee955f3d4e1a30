//! The dependency container: binding, resolution, injection and named
//! invocation.

use crate::core::{ContractKey, Dependency, UpdateReceiver};
use crate::descriptor::{CallableSpec, Injectable, MethodSpec, TypeDescriptor};
use crate::error::InjectError;
use crate::factory::{LazyFactory, ServiceRegistry};
use crate::invoke::{ArgList, Argument};
use crate::plan::{descriptor_chain, project_through, InjectionPlan, PlanCache, RelationshipIndex};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

struct BoundDependency {
  instance: Dependency,
  update: Option<Rc<dyn UpdateReceiver>>,
}

/// A single-threaded registry of bound dependencies keyed by contract type.
///
/// One instance per contract; binding, unbinding and resolution all take
/// `&mut self` because resolution may promote a lazy factory into a live
/// binding. Instances come back as `Rc<C>` clones of the bound value.
///
/// Binding a value injects into it first, so a dependency graph can be
/// assembled bottom-up with plain [`bind`](Container::bind) calls. Injection
/// plans are cached per target type and evicted when a contract they mention
/// is bound or unbound.
pub struct Container {
  bindings: HashMap<TypeId, BoundDependency>,
  lazy: HashMap<TypeId, LazyFactory>,
  plans: PlanCache,
  relationships: RelationshipIndex,
  update_listeners: Vec<Rc<dyn UpdateReceiver>>,
  recently_unbound: HashSet<TypeId>,
  truthy: Dependency,
}

impl Default for Container {
  fn default() -> Self {
    Self {
      bindings: HashMap::new(),
      lazy: HashMap::new(),
      plans: PlanCache::default(),
      relationships: RelationshipIndex::default(),
      update_listeners: Vec::new(),
      recently_unbound: HashSet::new(),
      // Canonical `true` handed out for `get::<bool>()`, so a resolvable
      // guard contract exists without anyone binding one.
      truthy: Dependency::new::<bool>(Rc::new(true)),
    }
  }
}

impl Container {
  pub fn new() -> Self {
    Self::default()
  }

  /// Binds `instance` under its own type as the contract.
  ///
  /// The instance is injected into before it becomes visible, then erased
  /// behind `Rc`. Fails with [`InjectError::AlreadyBound`] when a live
  /// binding for the contract exists; the existing binding is untouched.
  pub fn bind<T: Injectable>(&mut self, instance: T) -> Result<&mut Self, InjectError> {
    self.bind_as::<T, T>(instance, |instance| instance)
  }

  /// Binds `instance` under the contract `C`, usually a trait object.
  ///
  /// `coerce` performs the unsizing, e.g. `|rc| rc as Rc<dyn Service>`.
  pub fn bind_as<C, T>(
    &mut self,
    mut instance: T,
    coerce: fn(Rc<T>) -> Rc<C>,
  ) -> Result<&mut Self, InjectError>
  where
    C: ?Sized + Any,
    T: Injectable,
  {
    let key = ContractKey::of::<C>();
    if self.bindings.contains_key(&key.type_id()) {
      return Err(InjectError::AlreadyBound(key.type_name()));
    }
    // Injection happens while the instance is still exclusively owned, so a
    // binding never observes itself through its own contract.
    self.inject(&mut instance)?;
    let instance = Rc::new(instance);
    let update = T::descriptor().upcast_update(instance.clone() as Rc<dyn Any>);
    self.install(key, Dependency::new(coerce(instance)), update);
    Ok(self)
  }

  /// Removes the binding and any pending lazy factory for `C`. A contract
  /// that was never bound is a no-op.
  ///
  /// Subsequent injections write `None` into optional fields of the contract,
  /// so targets injected again do not keep a stale reference.
  pub fn unbind<C: ?Sized + Any>(&mut self) -> &mut Self {
    let key = ContractKey::of::<C>();
    self.lazy.remove(&key.type_id());
    if let Some(bound) = self.bindings.remove(&key.type_id()) {
      self.invalidate_dependents(key);
      self.recently_unbound.insert(key.type_id());
      if let Some(listener) = bound.update {
        self
          .update_listeners
          .retain(|existing| !Rc::ptr_eq(existing, &listener));
      }
      debug!(contract = key.type_name(), "unbound");
    }
    self
  }

  /// Registers a lazy binding for `C`, realized through `T::default()` on
  /// first resolution.
  ///
  /// Fails when a live binding for `C` exists. A pending factory for `C` is
  /// silently replaced; nothing has observed it yet.
  pub fn bind_lazy<C, T>(&mut self, coerce: fn(Rc<T>) -> Rc<C>) -> Result<&mut Self, InjectError>
  where
    C: ?Sized + Any,
    T: Injectable + Default,
  {
    self.install_lazy(ContractKey::of::<C>(), LazyFactory::from_default(coerce))?;
    Ok(self)
  }

  /// Registers a lazy binding for `C`, realized by calling `factory` on
  /// first resolution. A factory returning `None` turns that resolution into
  /// an unmet-dependency failure.
  pub fn bind_lazy_with<C, T, F>(
    &mut self,
    factory: F,
    coerce: fn(Rc<T>) -> Rc<C>,
  ) -> Result<&mut Self, InjectError>
  where
    C: ?Sized + Any,
    T: Injectable,
    F: FnOnce() -> Option<T> + 'static,
  {
    self.install_lazy(ContractKey::of::<C>(), LazyFactory::from_fn(factory, coerce))?;
    Ok(self)
  }

  /// Registers every entry of `registry` as a lazy binding. Stops at the
  /// first contract that already has a live binding.
  pub fn bind_lazy_from_registry(
    &mut self,
    registry: ServiceRegistry,
  ) -> Result<&mut Self, InjectError> {
    for (key, factory) in registry.into_entries() {
      self.install_lazy(key, factory)?;
    }
    Ok(self)
  }

  fn install_lazy(&mut self, key: ContractKey, factory: LazyFactory) -> Result<(), InjectError> {
    if self.bindings.contains_key(&key.type_id()) {
      return Err(InjectError::AlreadyBound(key.type_name()));
    }
    if self.lazy.insert(key.type_id(), factory).is_some() {
      trace!(contract = key.type_name(), "replaced pending lazy factory");
    }
    debug!(contract = key.type_name(), "registered lazy binding");
    Ok(())
  }

  /// Resolves the contract `C`, promoting a lazy factory when no live
  /// binding exists yet.
  ///
  /// `get::<bool>()` always resolves to `true`; it is the guard contract for
  /// callers that only need to know resolution is possible.
  pub fn get<C: ?Sized + Any>(&mut self) -> Result<Rc<C>, InjectError> {
    let key = ContractKey::of::<C>();
    let dependency = self.resolve_required(key)?;
    Self::extract(key, dependency)
  }

  /// Like [`get`](Container::get) but an unmet contract yields `Ok(None)`
  /// instead of an error. The `bool` guard contract is not special here.
  pub fn get_optional<C: ?Sized + Any>(&mut self) -> Result<Option<Rc<C>>, InjectError> {
    let key = ContractKey::of::<C>();
    match self.resolve(key)? {
      Some(dependency) => Self::extract(key, dependency).map(Some),
      None => Ok(None),
    }
  }

  fn extract<C: ?Sized + Any>(
    key: ContractKey,
    dependency: Dependency,
  ) -> Result<Rc<C>, InjectError> {
    dependency.downcast::<C>().ok_or_else(|| {
      InjectError::TypeMismatch(format!(
        "binding for {} holds a {}",
        key.type_name(),
        dependency.contract_name()
      ))
    })
  }

  /// Required-semantics resolution: the `bool` guard contract always yields
  /// the canonical `true`, everything else must have a binding or a factory.
  /// Every required member resolves through here, so a `bool`-typed field or
  /// parameter answers "is the container reachable" just like `get`.
  fn resolve_required(&mut self, key: ContractKey) -> Result<Dependency, InjectError> {
    if key.is_bool() {
      return Ok(self.truthy.clone());
    }
    self.resolve(key)?.ok_or_else(|| InjectError::unmet(key))
  }

  fn resolve(&mut self, key: ContractKey) -> Result<Option<Dependency>, InjectError> {
    if let Some(bound) = self.bindings.get(&key.type_id()) {
      return Ok(Some(bound.instance.clone()));
    }
    if self.lazy.contains_key(&key.type_id()) {
      return self.promote(key).map(Some);
    }
    Ok(None)
  }

  /// Turns the pending factory for `key` into a live binding. The factory is
  /// taken out of the table before it runs, so a factory whose own injection
  /// resolves `key` again fails as unmet instead of recursing.
  fn promote(&mut self, key: ContractKey) -> Result<Dependency, InjectError> {
    let factory = self
      .lazy
      .remove(&key.type_id())
      .ok_or_else(|| InjectError::unmet(key))?;
    debug!(contract = key.type_name(), "promoting lazy binding");
    let binding = factory
      .produce(self)?
      .ok_or_else(|| InjectError::empty_factory(key))?;
    let dependency = binding.dependency.clone();
    self.install(key, binding.dependency, binding.update);
    Ok(dependency)
  }

  fn install(
    &mut self,
    key: ContractKey,
    dependency: Dependency,
    update: Option<Rc<dyn UpdateReceiver>>,
  ) {
    self.invalidate_dependents(key);
    self.recently_unbound.remove(&key.type_id());
    // A binding and a pending factory never coexist for one contract.
    self.lazy.remove(&key.type_id());
    if let Some(listener) = &update {
      let present = self
        .update_listeners
        .iter()
        .any(|existing| Rc::ptr_eq(existing, listener));
      if !present {
        self.update_listeners.push(listener.clone());
      }
    }
    self.bindings.insert(
      key.type_id(),
      BoundDependency {
        instance: dependency,
        update,
      },
    );
    debug!(contract = key.type_name(), "bound");
  }

  fn invalidate_dependents(&mut self, key: ContractKey) {
    let dependents: Vec<TypeId> = self.relationships.dependents(key.type_id()).collect();
    for target in dependents {
      self.plans.evict(target);
    }
  }

  fn plan_for(&mut self, descriptor: &'static TypeDescriptor) -> Rc<InjectionPlan> {
    let target = descriptor.target();
    if let Some(plan) = self.plans.get(target) {
      return plan;
    }
    let plan = InjectionPlan::build(descriptor, &mut self.relationships);
    self.plans.insert(target, plan)
  }

  /// Injects into `target`: resolves and writes every required field, then
  /// the resolvable optional fields, then runs every injectable method with
  /// its parameters resolved.
  ///
  /// Injection is idempotent for an unchanged container. A required field
  /// that cannot be resolved aborts the pass; members already applied stay
  /// applied. Optional fields of a contract that was unbound since its last
  /// binding are reset to `None`.
  pub fn inject<T: Injectable>(&mut self, target: &mut T) -> Result<(), InjectError> {
    let plan = self.plan_for(T::descriptor());
    for member in plan.required.iter() {
      let dependency = self.resolve_required(member.spec.contract)?;
      let slot = plan.project(&mut *target, member.depth)?;
      (member.spec.set)(slot, Some(dependency))?;
    }
    for member in plan.optional.iter() {
      match self.resolve(member.spec.contract)? {
        Some(dependency) => {
          let slot = plan.project(&mut *target, member.depth)?;
          (member.spec.set)(slot, Some(dependency))?;
        }
        None if self.recently_unbound.contains(&member.spec.contract.type_id()) => {
          let slot = plan.project(&mut *target, member.depth)?;
          (member.spec.set)(slot, None)?;
        }
        None => {}
      }
    }
    for member in plan.methods.iter() {
      let arguments = self.resolve_params(member.spec.params.as_slice(), Vec::new())?;
      let mut arguments = ArgList::new(member.spec.name, arguments);
      let slot = plan.project(&mut *target, member.depth)?;
      (member.spec.invoke)(slot, &mut arguments)?;
    }
    Ok(())
  }

  /// Fills the leading parameters from `explicit`, resolving the rest.
  fn resolve_params(
    &mut self,
    params: &[ContractKey],
    explicit: Vec<Box<dyn Any>>,
  ) -> Result<Vec<Argument>, InjectError> {
    let supplied = explicit.len();
    let mut arguments = Vec::with_capacity(params.len());
    arguments.extend(explicit.into_iter().map(Argument::Explicit));
    for param in &params[supplied..] {
      let dependency = self.resolve_required(*param)?;
      arguments.push(Argument::Resolved(dependency));
    }
    Ok(arguments)
  }

  /// Invokes the callable named `name` on `target`.
  ///
  /// The ancestor chain is searched nearest-first; a name declared on both a
  /// type and its ancestor runs the derived one. Explicit arguments fill the
  /// leading parameters in order, the trailing parameters are resolved from
  /// the container. Injectable methods are reachable here too and return
  /// `Box<dyn Any>` holding `()`.
  pub fn invoke<T: Injectable>(
    &mut self,
    target: &mut T,
    name: &str,
    explicit: Vec<Box<dyn Any>>,
  ) -> Result<Box<dyn Any>, InjectError> {
    let descriptor = T::descriptor();
    let chain = descriptor_chain(descriptor);
    let Some((depth, callable)) = Self::find_callable(&chain, descriptor, name)? else {
      if chain
        .iter()
        .any(|level| level.functions.iter().any(|spec| spec.name == name))
      {
        return Err(InjectError::TypeMismatch(format!(
          "`{name}` on {} is a static function",
          descriptor.target_name()
        )));
      }
      return Err(InjectError::MethodNotFound {
        target: descriptor.target_name(),
        method: name.to_owned(),
      });
    };
    let params = match callable {
      Callable::Call(spec) => spec.params.as_slice(),
      Callable::Hook(spec) => spec.params.as_slice(),
    };
    if explicit.len() > params.len() {
      return Err(InjectError::TypeMismatch(format!(
        "`{name}` takes {} arguments, {} supplied",
        params.len(),
        explicit.len()
      )));
    }
    let arguments = self.resolve_params(params, explicit)?;
    let slot = project_through(&chain, &mut *target, depth)?;
    match callable {
      Callable::Call(spec) => {
        let mut arguments = ArgList::new(spec.name, arguments);
        (spec.invoke)(slot, &mut arguments)
      }
      Callable::Hook(spec) => {
        let mut arguments = ArgList::new(spec.name, arguments);
        (spec.invoke)(slot, &mut arguments)?;
        Ok(Box::new(()))
      }
    }
  }

  /// Invokes the static function named `name` declared on `T` or one of its
  /// ancestors. Same argument handling as [`invoke`](Container::invoke),
  /// without a receiver.
  pub fn invoke_static<T: Injectable>(
    &mut self,
    name: &str,
    explicit: Vec<Box<dyn Any>>,
  ) -> Result<Box<dyn Any>, InjectError> {
    let descriptor = T::descriptor();
    let chain = descriptor_chain(descriptor);
    let mut found = None;
    for level in chain.iter() {
      let mut matches = level.functions.iter().filter(|spec| spec.name == name);
      if let Some(spec) = matches.next() {
        if matches.next().is_some() {
          return Err(InjectError::AmbiguousMethod {
            target: descriptor.target_name(),
            method: name.to_owned(),
          });
        }
        found = Some(spec);
        break;
      }
    }
    let Some(spec) = found else {
      let instance_match = chain.iter().any(|level| {
        level.calls.iter().any(|spec| spec.name == name)
          || level.methods.iter().any(|spec| spec.name == name)
      });
      if instance_match {
        return Err(InjectError::TypeMismatch(format!(
          "`{name}` on {} is not a static function",
          descriptor.target_name()
        )));
      }
      return Err(InjectError::MethodNotFound {
        target: descriptor.target_name(),
        method: name.to_owned(),
      });
    };
    if explicit.len() > spec.params.len() {
      return Err(InjectError::TypeMismatch(format!(
        "`{name}` takes {} arguments, {} supplied",
        spec.params.len(),
        explicit.len()
      )));
    }
    let arguments = self.resolve_params(&spec.params, explicit)?;
    let mut arguments = ArgList::new(spec.name, arguments);
    (spec.invoke)(&mut arguments)
  }

  fn find_callable<'c>(
    chain: &'c [&'static TypeDescriptor],
    root: &'static TypeDescriptor,
    name: &str,
  ) -> Result<Option<(usize, Callable<'c>)>, InjectError> {
    for (depth, level) in chain.iter().enumerate() {
      let mut here: Vec<Callable<'c>> = Vec::new();
      here.extend(
        level
          .calls
          .iter()
          .filter(|spec| spec.name == name)
          .map(Callable::Call),
      );
      here.extend(
        level
          .methods
          .iter()
          .filter(|spec| spec.name == name)
          .map(Callable::Hook),
      );
      if here.len() > 1 {
        return Err(InjectError::AmbiguousMethod {
          target: root.target_name(),
          method: name.to_owned(),
        });
      }
      if let Some(callable) = here.pop() {
        return Ok(Some((depth, callable)));
      }
    }
    Ok(None)
  }

  /// Calls [`UpdateReceiver::on_update`] on every registered listener, in
  /// bind order.
  pub fn on_update(&self) {
    for listener in &self.update_listeners {
      listener.on_update();
    }
  }

  /// The number of registered update listeners.
  pub fn update_listener_count(&self) -> usize {
    self.update_listeners.len()
  }
}

#[derive(Clone, Copy)]
enum Callable<'c> {
  Call(&'c CallableSpec),
  Hook(&'c MethodSpec),
}

//! Injection plans, the per-type plan cache and the reverse relationship
//! index that drives cache invalidation.

use crate::core::ContractKey;
use crate::descriptor::{FieldSpec, MethodSpec, TypeDescriptor};
use crate::error::InjectError;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

/// A member of a plan: a spec plus the depth of its declaring descriptor in
/// the ancestor chain (0 = the target type itself).
pub(crate) struct PlanMember<S: 'static> {
  pub(crate) spec: &'static S,
  pub(crate) depth: usize,
}

/// The cached, per-type result of member discovery. Holds only `&'static`
/// descriptor data, so cloning the owning `Rc` is cheap and a plan stays
/// usable even if the cache evicts it mid-injection.
pub(crate) struct InjectionPlan {
  chain: Vec<&'static TypeDescriptor>,
  pub(crate) required: Vec<PlanMember<FieldSpec>>,
  pub(crate) optional: Vec<PlanMember<FieldSpec>>,
  pub(crate) methods: Vec<PlanMember<MethodSpec>>,
}

/// Walks the `extends` links from `root` outward. Index order is
/// derived-to-base; the root is element 0.
pub(crate) fn descriptor_chain(root: &'static TypeDescriptor) -> Vec<&'static TypeDescriptor> {
  let mut chain = vec![root];
  let mut cursor = root;
  while let Some(parent) = cursor.parent.as_ref() {
    cursor = (parent.descriptor)();
    chain.push(cursor);
  }
  chain
}

/// Projects `target` down to the descriptor at `depth` in `chain`, applying
/// each intermediate `extends` projection in turn.
pub(crate) fn project_through<'a>(
  chain: &[&'static TypeDescriptor],
  target: &'a mut dyn Any,
  depth: usize,
) -> Result<&'a mut dyn Any, InjectError> {
  let mut current = target;
  for descriptor in &chain[..depth] {
    let parent = descriptor
      .parent
      .as_ref()
      .ok_or_else(|| InjectError::wrong_target(descriptor.target_name()))?;
    current = (parent.project)(current)
      .ok_or_else(|| InjectError::wrong_target(descriptor.target_name()))?;
  }
  Ok(current)
}

impl InjectionPlan {
  /// Discovers the injectable members of `root`'s type.
  ///
  /// The full ancestor chain is walked; a member redeclared with the same
  /// name in a more derived type overrides the ancestor's. The resulting
  /// order is base-to-derived, with overrides running at the overriding
  /// type's position. Every discovered contract is recorded in the
  /// relationship index against the root target type, which is what lets a
  /// later bind or unbind evict exactly the affected plans.
  pub(crate) fn build(
    root: &'static TypeDescriptor,
    relationships: &mut RelationshipIndex,
  ) -> Self {
    let chain = descriptor_chain(root);
    let target = root.target();

    let mut seen_fields: HashSet<&'static str> = HashSet::new();
    let mut seen_methods: HashSet<&'static str> = HashSet::new();
    let mut field_levels: Vec<Vec<PlanMember<FieldSpec>>> = Vec::with_capacity(chain.len());
    let mut method_levels: Vec<Vec<PlanMember<MethodSpec>>> = Vec::with_capacity(chain.len());

    for (depth, descriptor) in chain.iter().enumerate() {
      let descriptor: &'static TypeDescriptor = *descriptor;
      let mut fields = Vec::new();
      for spec in descriptor.fields.iter() {
        if seen_fields.insert(spec.name) {
          relationships.add(spec.contract, target);
          fields.push(PlanMember { spec, depth });
        }
      }
      let mut methods = Vec::new();
      for spec in descriptor.methods.iter() {
        if seen_methods.insert(spec.name) {
          for param in spec.params.iter() {
            relationships.add(*param, target);
          }
          methods.push(PlanMember { spec, depth });
        }
      }
      field_levels.push(fields);
      method_levels.push(methods);
    }

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for member in field_levels.into_iter().rev().flatten() {
      if member.spec.optional {
        optional.push(member);
      } else {
        required.push(member);
      }
    }
    let methods: Vec<_> = method_levels.into_iter().rev().flatten().collect();

    debug!(
      target_type = root.target_name(),
      required = required.len(),
      optional = optional.len(),
      methods = methods.len(),
      "built injection plan"
    );

    Self {
      chain,
      required,
      optional,
      methods,
    }
  }

  pub(crate) fn project<'a>(
    &self,
    target: &'a mut dyn Any,
    depth: usize,
  ) -> Result<&'a mut dyn Any, InjectError> {
    project_through(&self.chain, target, depth)
  }
}

/// Memoizes injection plans per target type.
#[derive(Default)]
pub(crate) struct PlanCache {
  plans: HashMap<TypeId, Rc<InjectionPlan>>,
}

impl PlanCache {
  pub(crate) fn get(&self, target: TypeId) -> Option<Rc<InjectionPlan>> {
    self.plans.get(&target).cloned()
  }

  pub(crate) fn insert(&mut self, target: TypeId, plan: InjectionPlan) -> Rc<InjectionPlan> {
    let plan = Rc::new(plan);
    self.plans.insert(target, plan.clone());
    plan
  }

  pub(crate) fn evict(&mut self, target: TypeId) {
    if self.plans.remove(&target).is_some() {
      trace!(?target, "evicted injection plan");
    }
  }
}

/// Reverse index from a dependency's contract to the target types whose
/// plans reference it. Grows monotonically; it is consulted only to bound
/// eviction on bind/unbind, never during resolution.
#[derive(Default)]
pub(crate) struct RelationshipIndex {
  index: HashMap<TypeId, HashSet<TypeId>>,
}

impl RelationshipIndex {
  pub(crate) fn add(&mut self, contract: ContractKey, target: TypeId) {
    self.index.entry(contract.type_id()).or_default().insert(target);
  }

  pub(crate) fn dependents(&self, contract: TypeId) -> impl Iterator<Item = TypeId> + '_ {
    self.index.get(&contract).into_iter().flatten().copied()
  }
}

//! Error types raised by the container.

use crate::core::ContractKey;

/// Failures raised synchronously by binding, resolution, injection and
/// invocation. The container performs no retries and no rollback; field
/// writes applied before a failing step remain applied.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
  /// A live binding already exists for the contract.
  #[error("already bound: {0}")]
  AlreadyBound(&'static str),

  /// A required dependency had neither a binding nor a lazy factory, or a
  /// lazy factory produced nothing.
  #[error("unmet dependency: {0}")]
  UnmetDependency(String),

  /// A concrete type was resolved as if it were a contract. Bindings are
  /// normally keyed by trait object, so this usually means the caller bound
  /// a concrete type by mistake.
  #[error("unmet dependency: {0}; did you mean to use a trait object as the contract?")]
  AmbiguousContract(&'static str),

  /// A stored instance or supplied argument did not have the expected type.
  #[error("type mismatch: {0}")]
  TypeMismatch(String),

  /// No callable with the requested name is declared on the target type.
  #[error("no method named `{method}` on {target}")]
  MethodNotFound {
    target: &'static str,
    method: String,
  },

  /// More than one callable with the requested name is declared on the
  /// target type.
  #[error("multiple methods named `{method}` on {target}")]
  AmbiguousMethod {
    target: &'static str,
    method: String,
  },
}

impl InjectError {
  /// The canonical unmet-dependency error for a contract key, with the
  /// concrete-as-contract hint when the key does not name a trait object.
  pub(crate) fn unmet(key: ContractKey) -> Self {
    if key.is_trait_object() {
      InjectError::UnmetDependency(key.type_name().to_owned())
    } else {
      InjectError::AmbiguousContract(key.type_name())
    }
  }

  pub(crate) fn empty_factory(key: ContractKey) -> Self {
    InjectError::UnmetDependency(format!(
      "the lazy factory for {} produced nothing",
      key.type_name()
    ))
  }

  pub(crate) fn wrong_target(expected: &'static str) -> Self {
    InjectError::TypeMismatch(format!("injection target is not a {expected}"))
  }
}

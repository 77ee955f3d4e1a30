//! Argument plumbing shared by method injection and named invocation.

use crate::core::Dependency;
use crate::error::InjectError;
use std::any::Any;

/// One argument handed to a callable: either supplied explicitly by the
/// caller or resolved from the container.
pub enum Argument {
  Explicit(Box<dyn Any>),
  Resolved(Dependency),
}

impl Argument {
  fn take<T: Any + Clone>(self, position: usize, method: &str) -> Result<T, InjectError> {
    match self {
      Argument::Explicit(boxed) => boxed.downcast::<T>().map(|value| *value).map_err(|_| {
        InjectError::TypeMismatch(format!(
          "argument {position} of `{method}` is not a {}",
          std::any::type_name::<T>()
        ))
      }),
      Argument::Resolved(dependency) => {
        dependency.payload().downcast_ref::<T>().cloned().ok_or_else(|| {
          InjectError::TypeMismatch(format!(
            "argument {position} of `{method}`: resolved {} does not match declared {}",
            dependency.contract_name(),
            std::any::type_name::<T>()
          ))
        })
      }
    }
  }
}

/// The positional argument list passed to descriptor glue functions.
///
/// Glue code pulls arguments back out in declaration order:
///
/// ```ignore
/// |target, args| {
///   target.wire(args.take()?, args.take()?);
///   Ok(())
/// }
/// ```
///
/// Container-resolved arguments come out as the `Rc<C>` they were bound as;
/// explicit arguments come out as the value the caller boxed.
pub struct ArgList {
  method: &'static str,
  next: usize,
  arguments: std::vec::IntoIter<Argument>,
}

impl ArgList {
  pub(crate) fn new(method: &'static str, arguments: Vec<Argument>) -> Self {
    Self {
      method,
      next: 0,
      arguments: arguments.into_iter(),
    }
  }

  /// Removes and converts the next argument. The target type must match the
  /// callable's declared parameter type at this position.
  pub fn take<T: Any + Clone>(&mut self) -> Result<T, InjectError> {
    let position = self.next;
    self.next += 1;
    let argument = self.arguments.next().ok_or_else(|| {
      InjectError::TypeMismatch(format!(
        "`{}` expected an argument at position {position}, none left",
        self.method
      ))
    })?;
    argument.take(position, self.method)
  }
}

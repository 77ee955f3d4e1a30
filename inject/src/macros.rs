//! Public macros for declaring injectable types.

/// Implements [`Injectable`](crate::Injectable) for a type.
///
/// The bare form declares a type with no injectable members, which is enough
/// to bind it:
///
/// ```
/// use graft_inject::{injectable, Container};
///
/// #[derive(Default)]
/// struct Settings {
///   verbose: bool,
/// }
///
/// injectable!(Settings);
///
/// let mut container = Container::new();
/// container.bind(Settings::default()).unwrap();
/// ```
///
/// The braced form declares injectable fields. Each entry is
/// `required`/`optional`, the field name, and the contract type; the field
/// itself must be an `Option<Rc<Contract>>`:
///
/// ```
/// use graft_inject::injectable;
/// use std::rc::Rc;
///
/// trait Logger {
///   fn log(&self, line: &str);
/// }
///
/// #[derive(Default)]
/// struct Worker {
///   logger: Option<Rc<dyn Logger>>,
///   peer: Option<Rc<String>>,
/// }
///
/// injectable!(Worker {
///   required logger: dyn Logger,
///   optional peer: String,
/// });
/// ```
///
/// Methods, named callables, `extends` links and the update capability have
/// no macro shorthand; build those descriptors through
/// [`TypeDescriptor::builder`](crate::TypeDescriptor::builder) directly.
#[macro_export]
macro_rules! injectable {
  (@field $builder:expr, required $field:ident: $contract:ty) => {
    $builder.required_field::<$contract>(stringify!($field), |target, value| {
      target.$field = value
    })
  };

  (@field $builder:expr, optional $field:ident: $contract:ty) => {
    $builder.optional_field::<$contract>(stringify!($field), |target, value| {
      target.$field = value
    })
  };

  ($target:ty) => {
    impl $crate::Injectable for $target {
      fn descriptor() -> &'static $crate::TypeDescriptor {
        $crate::intern::<$target>(|| $crate::TypeDescriptor::builder::<$target>().build())
      }
    }
  };

  ($target:ty { $($kind:ident $field:ident: $contract:ty),* $(,)? }) => {
    impl $crate::Injectable for $target {
      fn descriptor() -> &'static $crate::TypeDescriptor {
        $crate::intern::<$target>(|| {
          let builder = $crate::TypeDescriptor::builder::<$target>();
          $(let builder = $crate::injectable!(@field builder, $kind $field: $contract);)*
          builder.build()
        })
      }
    }
  };
}

//! # Graft Inject
//!
//! A minimalistic, descriptor-driven dependency injection container for Rust.
//!
//! Dependencies are bound into a [`Container`] under a contract type, usually
//! a trait object, and handed back out as `Rc` clones. Types that want
//! dependencies pushed into them describe their injectable surface with a
//! [`TypeDescriptor`]; the container uses the descriptor to write fields and
//! call methods, caching the discovered plan per type.
//!
//! ## Core Concepts
//!
//! - **Contract**: the type a dependency is bound and resolved under.
//! - **Binding**: one shared instance per contract, erased behind `Rc`.
//! - **Injection**: the container fills a target's declared fields and runs
//!   its declared methods with resolved arguments.
//! - **Lazy binding**: a factory registered up front, realized on first
//!   resolution.
//! - **Update capability**: bound instances opting in receive a callback per
//!   [`Container::on_update`] tick.
//!
//! ## Quick Start
//!
//! ```
//! use graft_inject::{injectable, Container};
//! use std::rc::Rc;
//!
//! // Define a contract and a concrete implementation.
//! trait Greeter {
//!   fn greet(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     "Hello, World!".to_owned()
//!   }
//! }
//!
//! injectable!(EnglishGreeter);
//!
//! // A consumer declares the contracts it wants injected.
//! #[derive(Default)]
//! struct Kiosk {
//!   greeter: Option<Rc<dyn Greeter>>,
//! }
//!
//! injectable!(Kiosk {
//!   required greeter: dyn Greeter,
//! });
//!
//! let mut container = Container::new();
//! container
//!   .bind_as::<dyn Greeter, _>(EnglishGreeter, |greeter| greeter)
//!   .unwrap();
//!
//! let mut kiosk = Kiosk::default();
//! container.inject(&mut kiosk).unwrap();
//!
//! let greeter = kiosk.greeter.unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//! ```

mod container;
mod core;
mod descriptor;
mod error;
mod factory;
mod global;
mod invoke;
mod macros;
mod plan;

pub use container::Container;
pub use core::{ContractKey, Dependency, UpdateReceiver};
pub use descriptor::{
  contract, intern, Injectable, TypeDescriptor, TypeDescriptorBuilder,
};
pub use error::InjectError;
pub use factory::{LazyFactory, ServiceRegistry};
pub use global::with_global;
pub use invoke::{ArgList, Argument};

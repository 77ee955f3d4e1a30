//! Binding a trait implementation and injecting it into a consumer.

use graft_inject::{injectable, Container};
use std::rc::Rc;

trait Greeter {
  fn greet(&self, name: &str) -> String;
}

#[derive(Default)]
struct EnglishGreeter;

impl Greeter for EnglishGreeter {
  fn greet(&self, name: &str) -> String {
    format!("Hello, {name}!")
  }
}

injectable!(EnglishGreeter);

#[derive(Default)]
struct Kiosk {
  greeter: Option<Rc<dyn Greeter>>,
}

injectable!(Kiosk {
  required greeter: dyn Greeter,
});

fn main() {
  let mut container = Container::new();
  container
    .bind_as::<dyn Greeter, _>(EnglishGreeter, |greeter| greeter)
    .unwrap();

  let mut kiosk = Kiosk::default();
  container.inject(&mut kiosk).unwrap();

  let greeter = kiosk.greeter.unwrap();
  println!("{}", greeter.greet("world"));
}

//! Driving update-capable bindings from a frame loop.

use graft_inject::{intern, Container, Injectable, TypeDescriptor, UpdateReceiver};
use std::cell::Cell;

#[derive(Default)]
struct FrameCounter {
  frames: Cell<u64>,
}

impl UpdateReceiver for FrameCounter {
  fn on_update(&self) {
    self.frames.set(self.frames.get() + 1);
  }
}

impl Injectable for FrameCounter {
  fn descriptor() -> &'static TypeDescriptor {
    intern::<FrameCounter>(|| TypeDescriptor::builder::<FrameCounter>().updates().build())
  }
}

fn main() {
  let mut container = Container::new();
  container.bind(FrameCounter::default()).unwrap();

  for _ in 0..60 {
    container.on_update();
  }

  let counter = container.get::<FrameCounter>().unwrap();
  println!("ran {} frames", counter.frames.get());
}

//! Services bundled with the engine.

mod counter;
mod echo;
mod hello;

pub use counter::CounterService;
pub use echo::EchoService;
pub use hello::HelloService;

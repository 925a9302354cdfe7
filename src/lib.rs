pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod kernel;
pub mod planner;
pub mod services;

// Re-export specific items for convenient access
pub use controller::{Controller, ControllerHandle};
pub use kernel::reactor::Reactor;

pub mod action;
pub mod arbiter;
pub mod driver;
pub mod event;
pub mod guard;
pub mod reactor;
pub mod rules;
pub mod scheduler;
pub mod state;
pub mod telemetry;
pub mod watchdog;

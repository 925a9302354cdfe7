//! Doneness telemetry and control instrumentation.
//!
//! `window` is decision input: the watchdog and the rule engine read it.
//!
//! `event`, `recorder` and `metrics` are a READ-ONLY journal of what the
//! controller did. The journal must never be read inside decision logic;
//! it exists for the status surface and for tests.

pub mod event;
pub mod metrics;
pub mod recorder;
pub mod window;

pub mod async_planner;
pub mod parse;
pub mod types;

pub mod actuator;
pub mod oracle;

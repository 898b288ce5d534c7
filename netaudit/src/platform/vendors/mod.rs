//! Built-in vendor platform definitions.

pub mod arista_eos;
pub mod cisco_ios;

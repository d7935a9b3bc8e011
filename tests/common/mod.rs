#![allow(dead_code)]

pub mod fixtures;
pub mod nodes;
pub mod ports;

pub use fixtures::*;
pub use nodes::*;
pub use ports::*;

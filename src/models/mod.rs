// Core data models for the order pipeline
// These structs represent the domain entities

pub mod order;
pub mod role;
pub mod stage;

pub use order::*;
pub use role::*;
pub use stage::*;

// Order pipeline engine: stage registry, classification, risk, counting and visibility

pub mod audit;
pub mod classifier;
pub mod counts;
pub mod registry;
pub mod risk;
pub mod visibility;

pub use audit::*;
pub use classifier::*;
pub use counts::*;
pub use registry::*;
pub use risk::*;
pub use visibility::*;

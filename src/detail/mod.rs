// Order detail view configuration: section disclosure per role and default module

pub mod modules;
pub mod sections;

pub use modules::*;
pub use sections::*;

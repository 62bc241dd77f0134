//! Domain models for the clinical configuration system.

mod catalog;
mod diagnosis;
mod form;
mod rows;
mod template;

pub use catalog::*;
pub use diagnosis::*;
pub use form::*;
pub use rows::*;
pub use template::*;

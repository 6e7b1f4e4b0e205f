//! Domain types for invokers.
//!
//! - [`ParameterSet`]: named invocation arguments, compared structurally

mod parameters;

pub use parameters::*;

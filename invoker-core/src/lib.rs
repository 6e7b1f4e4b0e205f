//! # Invoker Core
//!
//! Core types, errors, and traits shared by the invoker crates.
//!
//! This crate provides the building blocks that caching and advising layers
//! are written against:
//!
//! - **Types**: [`ParameterSet`], the structural key of an invocation
//! - **Errors**: [`InvokerError`] for configuration failures
//! - **Constants**: defaults and environment variable names
//! - **Traits**: [`OperationInvoker`], the `invoke(parameters) -> result` contract
//!
//! ## Example
//!
//! ```rust
//! use invoker_core::{FnInvoker, OperationInvoker, ParameterSet};
//!
//! let greet = FnInvoker::new(|params: &ParameterSet| {
//!     let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("world");
//!     Ok::<_, std::convert::Infallible>(format!("hello, {name}"))
//! });
//!
//! let params = ParameterSet::new().with("name", "ferris");
//! assert_eq!(greet.invoke(&params).unwrap(), "hello, ferris");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{InvokerError, Result};
pub use traits::*;
pub use types::*;

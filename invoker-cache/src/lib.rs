//! TTL response cache for operation invokers.
//!
//! [`CachingInvoker`] decorates any [`OperationInvoker`](invoker_core::OperationInvoker)
//! and reuses its response for equal parameter sets until the time-to-live
//! runs out. [`CachingAdvisor`] decides which operations get such a cache.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use invoker_cache::CachingInvoker;
//! use invoker_core::{FnInvoker, OperationInvoker, ParameterSet};
//!
//! let target = FnInvoker::new(|_: &ParameterSet| Ok::<_, String>(Arc::new("expensive")));
//! let invoker = CachingInvoker::new(target, 500)?;
//!
//! let params = ParameterSet::new();
//! let first = invoker.invoke(&params).unwrap();
//! let second = invoker.invoke(&params).unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! # Ok::<(), invoker_core::InvokerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod advisor;
mod cache;
mod config;

pub use advisor::{
    Advised, AdvisorConfig, CachingAdvisor, OperationDescriptor, OperationParameter,
    OperationType, TimeToLiveResolver,
};
pub use cache::{CacheStats, CachingInvoker};
pub use config::{CacheConfig, KeyPolicy};

//! Common traits for invokers.
//!
//! [`OperationInvoker`] is both what a caching layer consumes and what it
//! exposes, so decorators stack on top of any target.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::types::ParameterSet;

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATION INVOKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for invoking an operation with a set of named parameters.
///
/// Implementations might be:
/// - A plain function or closure (see [`FnInvoker`])
/// - An endpoint operation resolved by a framework
/// - A decorator around another invoker (caching, advising)
///
/// Invocation is synchronous and runs on the caller's thread.
pub trait OperationInvoker: Send + Sync {
    /// Value produced by a successful invocation.
    ///
    /// Use `Arc<T>` when callers need to tell whether two results are the
    /// same instance.
    type Output: Clone;

    /// Failure raised by the operation.
    type Error;

    /// Invokes the operation with the given parameters.
    fn invoke(&self, parameters: &ParameterSet) -> Result<Self::Output, Self::Error>;
}

impl<T: OperationInvoker + ?Sized> OperationInvoker for &T {
    type Output = T::Output;
    type Error = T::Error;

    fn invoke(&self, parameters: &ParameterSet) -> Result<Self::Output, Self::Error> {
        (**self).invoke(parameters)
    }
}

impl<T: OperationInvoker + ?Sized> OperationInvoker for Box<T> {
    type Output = T::Output;
    type Error = T::Error;

    fn invoke(&self, parameters: &ParameterSet) -> Result<Self::Output, Self::Error> {
        (**self).invoke(parameters)
    }
}

impl<T: OperationInvoker + ?Sized> OperationInvoker for Arc<T> {
    type Output = T::Output;
    type Error = T::Error;

    fn invoke(&self, parameters: &ParameterSet) -> Result<Self::Output, Self::Error> {
        (**self).invoke(parameters)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOSURE ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Adapts a closure into an [`OperationInvoker`].
pub struct FnInvoker<F, T, E> {
    f: F,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<F, T, E> FnInvoker<F, T, E>
where
    F: Fn(&ParameterSet) -> Result<T, E> + Send + Sync,
    T: Clone,
{
    /// Wraps the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, T, E> OperationInvoker for FnInvoker<F, T, E>
where
    F: Fn(&ParameterSet) -> Result<T, E> + Send + Sync,
    T: Clone,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, parameters: &ParameterSet) -> Result<T, E> {
        (self.f)(parameters)
    }
}

impl<F, T, E> fmt::Debug for FnInvoker<F, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInvoker").finish_non_exhaustive()
    }
}

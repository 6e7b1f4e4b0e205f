//! Decides which operations get a response cache.
//!
//! Only side-effect free operations that can be called without arguments are
//! worth caching: a [`CachingAdvisor`] wraps read operations whose parameters
//! are all optional, and only when a positive time-to-live is configured for
//! their endpoint. Everything else is passed through untouched.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use invoker_core::error::Result;
use invoker_core::traits::OperationInvoker;
use invoker_core::types::ParameterSet;

use crate::cache::CachingInvoker;
use crate::config::{millis_for_log, KeyPolicy};

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATION DESCRIPTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Kind of operation an endpoint exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Side-effect free query
    Read,
    /// Mutation
    Write,
    /// Removal
    Delete,
}

/// A declared operation parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationParameter {
    /// Parameter name
    pub name: String,
    /// Whether callers must supply a value
    pub mandatory: bool,
}

impl OperationParameter {
    /// A parameter callers must supply.
    pub fn mandatory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mandatory: true,
        }
    }

    /// A parameter callers may omit.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mandatory: false,
        }
    }
}

/// What the advisor knows about an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Endpoint the operation belongs to
    pub endpoint_id: String,
    /// Operation kind
    pub operation_type: OperationType,
    /// Declared parameters
    #[serde(default)]
    pub parameters: Vec<OperationParameter>,
}

impl OperationDescriptor {
    /// Describes an operation without parameters.
    pub fn new(endpoint_id: impl Into<String>, operation_type: OperationType) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            operation_type,
            parameters: Vec::new(),
        }
    }

    /// Adds a declared parameter.
    pub fn with_parameter(mut self, parameter: OperationParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Returns true if any declared parameter is mandatory.
    pub fn has_mandatory_parameter(&self) -> bool {
        self.parameters.iter().any(|p| p.mandatory)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADVISOR CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-endpoint time-to-live settings.
///
/// A missing or non-positive value disables caching for that endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Time-to-live applied to endpoints without their own entry
    pub default_time_to_live_ms: Option<i64>,
    /// Endpoint id → time-to-live in milliseconds
    pub endpoints: HashMap<String, i64>,
    /// Key policy of the caches the advisor creates
    pub key_policy: KeyPolicy,
}

impl AdvisorConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the time-to-live of one endpoint.
    pub fn endpoint(mut self, endpoint_id: impl Into<String>, time_to_live_ms: i64) -> Self {
        self.endpoints.insert(endpoint_id.into(), time_to_live_ms);
        self
    }

    /// Resolves the time-to-live of an endpoint, `None` when caching is off.
    pub fn time_to_live(&self, endpoint_id: &str) -> Option<Duration> {
        self.endpoints
            .get(endpoint_id)
            .copied()
            .or(self.default_time_to_live_ms)
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADVISOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves the time-to-live of an endpoint by id.
pub type TimeToLiveResolver = Box<dyn Fn(&str) -> Option<Duration> + Send + Sync>;

/// Wraps eligible operations in a [`CachingInvoker`].
pub struct CachingAdvisor {
    resolver: TimeToLiveResolver,
    key_policy: KeyPolicy,
}

impl CachingAdvisor {
    /// Creates an advisor using `resolver` to look up each endpoint's time-to-live.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&str) -> Option<Duration> + Send + Sync + 'static,
    {
        Self {
            resolver: Box::new(resolver),
            key_policy: KeyPolicy::default(),
        }
    }

    /// Creates an advisor from static configuration.
    pub fn from_config(config: AdvisorConfig) -> Self {
        let key_policy = config.key_policy;
        Self::new(move |endpoint_id| config.time_to_live(endpoint_id)).with_key_policy(key_policy)
    }

    /// Sets the key policy of the caches this advisor creates.
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Wraps `invoker` in a cache if `operation` qualifies.
    ///
    /// An operation qualifies when it is a read, declares no mandatory
    /// parameter, and its endpoint resolves to a non-zero time-to-live.
    #[instrument(skip_all, fields(endpoint = %operation.endpoint_id, operation = ?operation.operation_type))]
    pub fn apply<I>(&self, operation: &OperationDescriptor, invoker: I) -> Result<Advised<I>>
    where
        I: OperationInvoker,
        I::Output: Send + Sync,
    {
        if operation.operation_type != OperationType::Read {
            debug!("Not a read operation, invoking directly");
            return Ok(Advised::Direct(invoker));
        }
        if operation.has_mandatory_parameter() {
            debug!("Operation has mandatory parameters, invoking directly");
            return Ok(Advised::Direct(invoker));
        }

        match (self.resolver)(&operation.endpoint_id) {
            Some(ttl) if !ttl.is_zero() => {
                debug!(ttl_ms = millis_for_log(ttl), "Caching operation responses");
                let cached = CachingInvoker::with_time_to_live(invoker, ttl)?
                    .with_key_policy(self.key_policy);
                Ok(Advised::Cached(cached))
            }
            _ => {
                debug!("No time-to-live configured, invoking directly");
                Ok(Advised::Direct(invoker))
            }
        }
    }
}

impl fmt::Debug for CachingAdvisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingAdvisor")
            .field("key_policy", &self.key_policy)
            .finish_non_exhaustive()
    }
}

/// An operation invoker as decided by a [`CachingAdvisor`].
pub enum Advised<I: OperationInvoker> {
    /// Invoked directly on every call
    Direct(I),
    /// Invoked through a response cache
    Cached(CachingInvoker<I>),
}

impl<I: OperationInvoker> Advised<I> {
    /// Returns true if calls go through a cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, Advised::Cached(_))
    }

    /// Returns the cache, if any.
    pub fn cache(&self) -> Option<&CachingInvoker<I>> {
        match self {
            Advised::Cached(cache) => Some(cache),
            Advised::Direct(_) => None,
        }
    }
}

impl<I> OperationInvoker for Advised<I>
where
    I: OperationInvoker,
    I::Output: Send + Sync,
{
    type Output = I::Output;
    type Error = I::Error;

    fn invoke(&self, parameters: &ParameterSet) -> std::result::Result<I::Output, I::Error> {
        match self {
            Advised::Direct(invoker) => invoker.invoke(parameters),
            Advised::Cached(cache) => cache.invoke(parameters),
        }
    }
}

impl<I: OperationInvoker> fmt::Debug for Advised<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advised::Direct(_) => f.write_str("Advised::Direct"),
            Advised::Cached(cache) => f.debug_tuple("Advised::Cached").field(cache).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use invoker_core::traits::FnInvoker;
    use test_case::test_case;

    fn counting() -> (Arc<AtomicUsize>, impl OperationInvoker<Output = usize, Error = ()>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let invoker = FnInvoker::new(move |_: &ParameterSet| Ok(counter.fetch_add(1, Ordering::SeqCst)));
        (calls, invoker)
    }

    fn advisor() -> CachingAdvisor {
        CachingAdvisor::from_config(
            AdvisorConfig::default()
                .endpoint("health", 500)
                .endpoint("disabled", 0),
        )
    }

    #[test]
    fn test_read_without_parameters_is_cached() {
        let (calls, invoker) = counting();
        let operation = OperationDescriptor::new("health", OperationType::Read);

        let advised = advisor().apply(&operation, invoker).unwrap();
        assert!(advised.is_cached());
        assert_eq!(advised.cache().unwrap().time_to_live(), Duration::from_millis(500));

        let params = ParameterSet::new();
        assert_eq!(advised.invoke(&params).unwrap(), 0);
        assert_eq!(advised.invoke(&params).unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_optional_parameters_are_still_cached() {
        let (_, invoker) = counting();
        let operation = OperationDescriptor::new("health", OperationType::Read)
            .with_parameter(OperationParameter::optional("verbose"));
        assert!(advisor().apply(&operation, invoker).unwrap().is_cached());
    }

    #[test_case(OperationType::Write ; "write")]
    #[test_case(OperationType::Delete ; "delete")]
    fn test_non_read_operations_are_direct(operation_type: OperationType) {
        let (calls, invoker) = counting();
        let operation = OperationDescriptor::new("health", operation_type);

        let advised = advisor().apply(&operation, invoker).unwrap();
        assert!(!advised.is_cached());

        let params = ParameterSet::new();
        advised.invoke(&params).unwrap();
        advised.invoke(&params).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mandatory_parameter_is_direct() {
        let (_, invoker) = counting();
        let operation = OperationDescriptor::new("health", OperationType::Read)
            .with_parameter(OperationParameter::mandatory("name"));
        assert!(!advisor().apply(&operation, invoker).unwrap().is_cached());
    }

    #[test_case("disabled" ; "zero ttl")]
    #[test_case("unknown" ; "no ttl")]
    fn test_endpoint_without_ttl_is_direct(endpoint_id: &str) {
        let (_, invoker) = counting();
        let operation = OperationDescriptor::new(endpoint_id, OperationType::Read);
        assert!(!advisor().apply(&operation, invoker).unwrap().is_cached());
    }

    #[test]
    fn test_custom_resolver() {
        let advisor = CachingAdvisor::new(|id| id.starts_with("metrics").then(|| Duration::from_secs(1)))
            .with_key_policy(KeyPolicy::NoInputOnly);
        let (_, invoker) = counting();
        let advised = advisor
            .apply(&OperationDescriptor::new("metrics.jvm", OperationType::Read), invoker)
            .unwrap();
        assert_eq!(advised.cache().unwrap().key_policy(), KeyPolicy::NoInputOnly);
    }

    #[test]
    fn test_config_from_json() {
        let config = AdvisorConfig::from_json(
            r#"{"default_time_to_live_ms": 1000, "endpoints": {"env": -5, "info": 200}}"#,
        )
        .unwrap();
        assert_eq!(config.time_to_live("info"), Some(Duration::from_millis(200)));
        assert_eq!(config.time_to_live("beans"), Some(Duration::from_secs(1)));
        assert_eq!(config.time_to_live("env"), None);
        assert_eq!(config.key_policy, KeyPolicy::Parameters);
    }

    #[test]
    fn test_descriptor_json_shape() {
        let descriptor: OperationDescriptor = serde_json::from_str(
            r#"{"endpoint_id": "info", "operation_type": "read"}"#,
        )
        .unwrap();
        assert_eq!(descriptor, OperationDescriptor::new("info", OperationType::Read));
    }
}

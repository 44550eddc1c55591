pub mod github;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Argument map for a single capability invocation.
pub type ArgMap = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("capability request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("capability argument missing: {0}")]
    MissingArgument(String),

    #[error("capability invocation failed: {0}")]
    Invocation(String),

    #[error("no argument variants supplied for capability call")]
    NoVariants,
}

/// A named operation exposed by an external integration (e.g. "list PR
/// files"). The pipeline receives capabilities per invocation and never
/// constructs them itself; `invoke` is a single blocking external call
/// that may fail.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Capability name, matched case-insensitively during lookup.
    fn name(&self) -> &str;

    /// Invoke the operation, returning the canonical `Value` response.
    async fn invoke(&self, args: &ArgMap) -> Result<Value, ToolError>;
}

/// Capability set resolved once at startup and injected into the cascade.
/// A missing capability is a valid, non-fatal state — environments commonly
/// enable only a subset.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    by_name: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new(capabilities: impl IntoIterator<Item = Arc<dyn Capability>>) -> CapabilityRegistry {
        let mut by_name = HashMap::new();
        for capability in capabilities {
            by_name.insert(capability.name().to_ascii_uppercase(), capability);
        }
        CapabilityRegistry { by_name }
    }

    /// Return the first available capability among `candidates`, tried in
    /// priority order with case-insensitive exact name matching.
    pub fn find(&self, candidates: &[&str]) -> Option<&dyn Capability> {
        candidates
            .iter()
            .find_map(|name| self.by_name.get(&name.to_ascii_uppercase()))
            .map(Arc::as_ref)
    }
}

/// Attempt a capability call with each argument-shape variant in order and
/// return the first successful response.
///
/// Different upstream APIs name semantically identical parameters
/// differently (`pull_number` vs `number`), so earlier variant failures are
/// expected noise; only the last error survives when every shape fails.
pub async fn run_tool_variants(
    capability: &dyn Capability,
    variants: &[ArgMap],
) -> Result<Value, ToolError> {
    let mut last_err = None;
    for args in variants {
        match capability.invoke(args).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                debug!(capability = capability.name(), error = %err, "argument variant rejected");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or(ToolError::NoVariants))
}

/// Convert any serializable response wrapper into the canonical nested
/// primitive form the rest of the pipeline consumes.
pub fn to_plain<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Build an ArgMap from key/value pairs.
pub fn args(pairs: &[(&str, Value)]) -> ArgMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

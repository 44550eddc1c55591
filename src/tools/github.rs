use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::{ArgMap, Capability, CapabilityRegistry, ToolError};

const USER_AGENT: &str = "pr-reconciler";

/// A GitHub REST operation exposed as a named capability.
///
/// The path template carries `{placeholder}` segments filled from the
/// invocation arguments; a placeholder with no matching argument rejects
/// the call, which is what lets the argument-shape variant machinery find
/// the parameter names this operation actually understands. Non-path
/// arguments are sent as the JSON body for mutating methods.
pub struct RestCapability {
    name: String,
    method: Method,
    path_template: String,
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestCapability {
    pub fn new(
        name: &str,
        method: Method,
        path_template: &str,
        client: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> RestCapability {
        RestCapability {
            name: name.to_string(),
            method,
            path_template: path_template.to_string(),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Substitute `{placeholder}` segments from `args`, returning the path
    /// and the argument names consumed by it.
    fn fill_path(&self, args: &ArgMap) -> Result<(String, Vec<String>), ToolError> {
        let mut path = String::new();
        let mut consumed = Vec::new();
        let mut rest = self.path_template.as_str();

        while let Some(open) = rest.find('{') {
            path.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| ToolError::Invocation("unterminated path placeholder".to_string()))?;
            let key = &after[..close];
            let value = args
                .get(key)
                .ok_or_else(|| ToolError::MissingArgument(key.to_string()))?;
            path.push_str(&scalar_to_segment(key, value)?);
            consumed.push(key.to_string());
            rest = &after[close + 1..];
        }
        path.push_str(rest);
        Ok((path, consumed))
    }
}

fn scalar_to_segment(key: &str, value: &Value) -> Result<String, ToolError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ToolError::MissingArgument(key.to_string())),
    }
}

#[async_trait]
impl Capability for RestCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, args: &ArgMap) -> Result<Value, ToolError> {
        let (path, consumed) = self.fill_path(args)?;
        let url = format!("{}{}", self.base_url, path);
        debug!(capability = %self.name, method = %self.method, %url, "invoking GitHub capability");

        let mut request = self
            .client
            .request(self.method.clone(), &url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if self.method != Method::GET {
            let body: ArgMap = args
                .iter()
                .filter(|(key, _)| !consumed.contains(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            request = request.json(&body);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

/// Build the registry of GitHub REST capabilities the shipped binary runs
/// against. Names follow the upstream action catalog so the cascade's
/// candidate lists resolve unchanged.
pub fn github_registry(api_url: &str, token: Option<String>) -> CapabilityRegistry {
    let client = reqwest::Client::new();
    let capability = |name: &str, method: Method, template: &str| -> Arc<dyn Capability> {
        Arc::new(RestCapability::new(
            name,
            method,
            template,
            client.clone(),
            api_url,
            token.clone(),
        ))
    };

    CapabilityRegistry::new([
        capability(
            "GITHUB_LIST_PULL_REQUEST_FILES",
            Method::GET,
            "/repos/{owner}/{repo}/pulls/{pull_number}/files",
        ),
        capability(
            "GITHUB_COMPARE_TWO_COMMITS",
            Method::GET,
            "/repos/{owner}/{repo}/compare/{basehead}",
        ),
        capability(
            "GITHUB_LIST_COMMITS_ON_A_PULL_REQUEST",
            Method::GET,
            "/repos/{owner}/{repo}/pulls/{pull_number}/commits",
        ),
        capability(
            "GITHUB_GET_A_COMMIT",
            Method::GET,
            "/repos/{owner}/{repo}/commits/{ref}",
        ),
        capability(
            "GITHUB_UPDATE_A_PULL_REQUEST",
            Method::PATCH,
            "/repos/{owner}/{repo}/pulls/{pull_number}",
        ),
    ])
}

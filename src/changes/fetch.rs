use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::types::PrTarget;
use super::ChangeError;

/// Where the raw unified diff comes from when every structured source has
/// failed. Abstracted so the cascade can be exercised without a network.
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn fetch_diff(&self, target: &PrTarget) -> Result<String, ChangeError>;
}

/// Fetches `https://<host>/<owner>/<repo>/pull/<number>.diff` over HTTPS.
pub struct HttpDiffSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDiffSource {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<HttpDiffSource, ChangeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpDiffSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl DiffSource for HttpDiffSource {
    async fn fetch_diff(&self, target: &PrTarget) -> Result<String, ChangeError> {
        let url = format!(
            "{}/{}/{}/pull/{}.diff",
            self.base_url, target.owner, target.repo, target.number
        );
        debug!(%url, "fetching raw pull-request diff");

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", "pr-reconciler")
            .header("Accept", "application/vnd.github.v3.diff");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        // Diff bodies occasionally carry invalid UTF-8; replace, don't fail.
        let body = response.bytes().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_diff_builds_url_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/org/repo/pull/42.diff"))
            .and(header("Accept", "application/vnd.github.v3.diff"))
            .and(header("Authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("diff --git a/x b/x\n"))
            .mount(&server)
            .await;

        let source = HttpDiffSource::new(
            &server.uri(),
            Some("t0ken".to_string()),
            Duration::from_secs(20),
        )
        .unwrap();
        let body = source
            .fetch_diff(&PrTarget::new("org", "repo", 42))
            .await
            .unwrap();
        assert_eq!(body, "diff --git a/x b/x\n");
    }

    #[tokio::test]
    async fn test_fetch_diff_replaces_invalid_utf8() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x64, 0xFF, 0x64]))
            .mount(&server)
            .await;

        let source = HttpDiffSource::new(&server.uri(), None, Duration::from_secs(20)).unwrap();
        let body = source
            .fetch_diff(&PrTarget::new("org", "repo", 1))
            .await
            .unwrap();
        assert_eq!(body, "d\u{FFFD}d");
    }

    #[tokio::test]
    async fn test_fetch_diff_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = HttpDiffSource::new(&server.uri(), None, Duration::from_secs(20)).unwrap();
        let err = source
            .fetch_diff(&PrTarget::new("org", "repo", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChangeError::DiffRequest(_)));
    }
}

//! Overpass client trait and reqwest implementation.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::error::FetchError;

/// Public Overpass API interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default HTTP timeout for one Overpass request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Executes Overpass QL queries.
///
/// Elements are returned as raw JSON so that one malformed element does not
/// fail the whole response.
pub trait OverpassClient: Send + Sync {
    fn execute(&self, query: &str) -> impl Future<Output = Result<Vec<Value>, FetchError>> + Send;
}

/// Top-level Overpass JSON response; only `elements` is used.
#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Value>,
}

/// Parses an Overpass JSON body into its element list.
pub fn parse_response(body: &[u8]) -> Result<Vec<Value>, FetchError> {
    let response: OverpassResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(response.elements)
}

/// Overpass client posting form-encoded queries with a pooled reqwest client.
pub struct ReqwestOverpassClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ReqwestOverpassClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geoclip/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OverpassClient for ReqwestOverpassClient {
    async fn execute(&self, query: &str) -> Result<Vec<Value>, FetchError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let elements = parse_response(&body)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = body.len(),
            elements = elements.len(),
            "Overpass response received"
        );
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_elements() {
        let body = br#"{"version":0.6,"elements":[{"type":"node","id":1,"lat":1.0,"lon":2.0}]}"#;
        let elements = parse_response(body).unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["id"], 1);
    }

    #[test]
    fn test_parse_response_without_elements_is_empty() {
        assert!(parse_response(br#"{"remark":"runtime error"}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_response_rejects_non_json() {
        assert!(matches!(
            parse_response(b"<html>rate limited</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_client_construction() {
        let client =
            ReqwestOverpassClient::new(DEFAULT_ENDPOINT, Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }
}

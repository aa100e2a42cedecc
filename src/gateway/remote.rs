//! HTTP client for the hosted board API.

use super::{Envelope, GatewayError, GatewayRequest};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::time::Duration;

// A JSON content type would trigger a CORS preflight the host does not answer.
const WRITE_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

pub struct RemoteClient {
    client: Client,
    endpoint: Url,
}

impl RemoteClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// URL for one call: the endpoint plus `action=<name>`.
    pub fn action_url(&self, request: &GatewayRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("action", request.action());
        url
    }

    pub async fn send(&self, request: &GatewayRequest) -> Result<Envelope, GatewayError> {
        let url = self.action_url(request);
        let builder = match request.body()? {
            Some(body) => self
                .client
                .post(url)
                .header(CONTENT_TYPE, WRITE_CONTENT_TYPE)
                .body(body.to_string()),
            None => self.client.get(url),
        };

        let response = builder.send().await.map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|err| GatewayError::Decode(format!("status {status}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectoryEntry;

    fn client() -> RemoteClient {
        let endpoint = Url::parse("https://script.example.com/macros/s/abc/exec").unwrap();
        RemoteClient::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn action_is_appended_as_query_parameter() {
        let url = client().action_url(&GatewayRequest::ReadShifts);
        assert_eq!(
            url.as_str(),
            "https://script.example.com/macros/s/abc/exec?action=getShiftData"
        );

        let url = client().action_url(&GatewayRequest::AddEntry(DirectoryEntry::default()));
        assert_eq!(url.query(), Some("action=addUrlData"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let endpoint = Url::parse("http://127.0.0.1:9/exec").unwrap();
        let client = RemoteClient::new(endpoint, Duration::from_millis(500)).unwrap();
        let err = client.send(&GatewayRequest::ReadDirectory).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}

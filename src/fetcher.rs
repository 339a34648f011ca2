use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use url::Url;

use crate::registry::DatasetKind;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
    #[error("{kind} payload is not a valid table: {source}")]
    Decode {
        kind: DatasetKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("source returned {actual} rows where {expected} rows were expected")]
    KindMismatch {
        expected: DatasetKind,
        actual: DatasetKind,
    },
}

/// Anything that can hand back the raw JSON body of a query-results URL.
pub trait DatasetSource: Send + Sync {
    fn fetch(&self, target: &Url) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

impl DatasetSource for HttpSource {
    async fn fetch(&self, target: &Url) -> Result<Vec<u8>, FetchError> {
        let http = |source| FetchError::Http {
            url: target.clone(),
            source,
        };

        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: target.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(http)?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(status: u16, body: &str) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/queries/q/data/latest"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/api/v2/queries/q/data/latest", server.uri())).unwrap();
        (server, url)
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let (_server, url) = serve(200, r#"[{"Blockchain":"Ethereum"}]"#).await;
        let source = HttpSource::new(Duration::from_secs(5)).unwrap();
        let body = source.fetch(&url).await.unwrap();
        assert_eq!(body, br#"[{"Blockchain":"Ethereum"}]"#);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (_server, url) = serve(502, "bad gateway").await;
        let source = HttpSource::new(Duration::from_secs(5)).unwrap();
        let err = source.fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == reqwest::StatusCode::BAD_GATEWAY
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let source = HttpSource::new(Duration::from_secs(1)).unwrap();
        let url = Url::parse("http://127.0.0.1:1/api/v2/queries/q/data/latest").unwrap();
        let err = source.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
    }
}

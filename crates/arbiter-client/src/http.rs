//! HTTP client for the ICSID/PCA case API.

use arbiter_core::{CaseApi, DecisionSearch, Envelope, FetchError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{debug, info};

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.jusmundi.com/stanford";

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

impl From<ApiError> for FetchError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Http(e) => FetchError::Transport(e.to_string()),
            ApiError::Server { status, body } => FetchError::Upstream { status, body },
        }
    }
}

/// Case API client. Every request carries the API key and asks for JSON.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client for the given base URL (no trailing slash needed).
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET {base_url}{path}?{query}` decoded as an envelope.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope, FetchError> {
        let body = self.get_text(path, query).await?;
        Envelope::parse(&body)
    }

    /// Raw body of a successful `GET`.
    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let url = self.url(path);
        debug!(url = %url, ?query, "GET");
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl CaseApi for ApiClient {
    async fn list_cases(&self, page: u32, count: u32) -> Result<Envelope, FetchError> {
        let query = [("page", page.to_string()), ("count", count.to_string())];
        self.get("/cases", &query).await
    }

    async fn get_case(&self, case_id: &str) -> Result<Envelope, FetchError> {
        self.get(&format!("/cases/{case_id}"), &[]).await
    }

    async fn case_parties(&self, case_id: &str) -> Result<Envelope, FetchError> {
        self.get(&format!("/cases/{case_id}/parties"), &[]).await
    }

    async fn case_decisions(&self, case_id: &str) -> Result<Envelope, FetchError> {
        self.get(&format!("/cases/{case_id}/decisions"), &[]).await
    }

    async fn search_decisions(&self, search: &DecisionSearch) -> Result<Envelope, FetchError> {
        info!(search = %search.search, page = search.page, "searching decisions");
        self.get("/decisions", &search.query_pairs()).await
    }

    async fn decision_individuals(&self, decision_id: &str) -> Result<Envelope, FetchError> {
        self.get(&format!("/decisions/{decision_id}/individuals"), &[]).await
    }

    async fn get_individual(&self, individual_id: &str) -> Result<Envelope, FetchError> {
        self.get(&format!("/individuals/{individual_id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a random local port.
    /// The join handle yields the raw request text.
    async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:4000/".into(), "k".into());
        assert_eq!(client.base_url, "http://localhost:4000");
        assert_eq!(client.url("/cases/1"), "http://localhost:4000/cases/1");
        assert_eq!(client.url("cases"), "http://localhost:4000/cases");
    }

    #[test]
    fn server_error_maps_to_upstream() {
        let e: FetchError = ApiError::Server {
            status: 503,
            body: "down".into(),
        }
        .into();
        assert!(matches!(e, FetchError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn sends_key_accept_and_query() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":[],"included":[{"id":"100","type":"cases"}],"meta":{"totalPages":4}}"#,
        )
        .await;
        let client = ApiClient::new(base, "secret".into());

        let search = DecisionSearch::for_cases("John Smith", 2);
        let envelope = client.search_decisions(&search).await.unwrap();
        assert_eq!(envelope.total_pages(), 4);
        assert_eq!(envelope.included_of_type("cases")[0].id, "100");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with(
            "get /decisions?search=john+smith&fields=individuals.name&include=cases&page=2&count=10 "
        ));
        assert!(request.contains("x-api-key: secret"));
        assert!(request.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let (base, server) = serve_once("404 Not Found", r#"{"error":"no such case"}"#).await;
        let client = ApiClient::new(base, "k".into());

        let err = client.get_case("999").await.unwrap_err();
        match err {
            FetchError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("no such case"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert!(server.await.unwrap().starts_with("GET /cases/999 "));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (base, server) = serve_once("200 OK", "<html>oops</html>").await;
        let client = ApiClient::new(base, "k".into());

        let err = client.case_parties("1").await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        server.await.unwrap();
    }
}

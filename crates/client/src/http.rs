//! HTTP reference service backed by the production backend.

use async_trait::async_trait;
use gsp_core::{ActionRequest, FaseDisponible, ReferenceDetail, ReferenceId};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use super::{ClientError, ReferenceServiceClient, Result};

/// Backend address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Reference service reached over HTTP.
pub struct HttpReferenceService {
    client: reqwest::Client,
    base_url: String,
}

/// Body of a transition request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionBody<'a> {
    #[serde(flatten)]
    request: &'a ActionRequest,
    user: &'a str,
}

impl HttpReferenceService {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use a preconfigured `reqwest` client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// `<base>/api/referencias/<id>/<suffix...>/`, each segment percent-encoded.
    fn reference_url(&self, id: &ReferenceId, suffix: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Network(format!("invalid base url '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Network(format!("base url '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "referencias", id.as_str()])
            .extend(suffix)
            .push("");
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        warn!("Reference service answered {}: {}", status, body);
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(body)
            }
            StatusCode::CONFLICT => ClientError::StaleState(body),
            other => ClientError::Network(format!("unexpected status {other}: {body}")),
        })
    }
}

impl Default for HttpReferenceService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn network(e: reqwest::Error) -> ClientError {
    ClientError::Network(e.to_string())
}

#[async_trait]
impl ReferenceServiceClient for HttpReferenceService {
    async fn fetch_reference(&self, id: &ReferenceId) -> Result<ReferenceDetail> {
        let url = self.reference_url(id, &[])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(network)?;
        Self::decode(response).await
    }

    async fn available_phases(&self, id: &ReferenceId) -> Result<Vec<FaseDisponible>> {
        let url = self.reference_url(id, &["fases-disponibles"])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(network)?;
        Self::decode(response).await
    }

    async fn apply_action(
        &self,
        id: &ReferenceId,
        request: &ActionRequest,
        user: &str,
    ) -> Result<ReferenceDetail> {
        let url = self.reference_url(id, &["acciones"])?;
        debug!("POST {} ({} {})", url, request.action, request.phase_slug);
        let response = self
            .client
            .post(url)
            .json(&ActionBody { request, user })
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answer a single request with `status` and `body`, handing back the raw
    /// request text.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn service(base_url: &str) -> HttpReferenceService {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpReferenceService::new(base_url).with_client(client)
    }

    fn detail() -> ReferenceDetail {
        ReferenceDetail {
            referencia_id: ReferenceId::new("R1"),
            collection_id: "C1".into(),
            collection_name: "Verano".into(),
            current_phase: "corte".into(),
            start_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            phases: Vec::new(),
        }
    }

    #[test]
    fn test_urls_follow_backend_layout() {
        let svc = HttpReferenceService::new("http://localhost:8000/");
        let id = ReferenceId::new("REF-9");
        assert_eq!(
            svc.reference_url(&id, &[]).unwrap().as_str(),
            "http://localhost:8000/api/referencias/REF-9/"
        );
        assert_eq!(
            svc.reference_url(&id, &["fases-disponibles"]).unwrap().as_str(),
            "http://localhost:8000/api/referencias/REF-9/fases-disponibles/"
        );

        let prefixed = HttpReferenceService::new("http://gateway/gsp");
        assert_eq!(
            prefixed.reference_url(&id, &["acciones"]).unwrap().as_str(),
            "http://gateway/gsp/api/referencias/REF-9/acciones/"
        );
    }

    #[test]
    fn test_reference_id_is_percent_encoded() {
        let svc = HttpReferenceService::new("http://localhost:8000");
        let url = svc.reference_url(&ReferenceId::new("A B/1"), &["acciones"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/referencias/A%20B%2F1/acciones/"
        );
    }

    #[tokio::test]
    async fn test_bad_base_url_is_network_error() {
        let svc = HttpReferenceService::new("not a url");
        let err = svc.fetch_reference(&ReferenceId::new("R1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(ref msg) if msg.contains("not a url")));
    }

    #[test]
    fn test_action_body_is_flat() {
        let request = ActionRequest::deliver("corte").with_notes("ok");
        let json = serde_json::to_value(ActionBody { request: &request, user: "ana" }).unwrap();
        assert_eq!(json["phaseSlug"], "corte");
        assert_eq!(json["action"], "deliver");
        assert_eq!(json["notes"], "ok");
        assert_eq!(json["user"], "ana");
    }

    #[tokio::test]
    async fn test_success_decodes_body() {
        let body = serde_json::to_string(&detail()).unwrap();
        let (base, server) = serve_once("200 OK", body).await;

        let fetched = service(&base).fetch_reference(&ReferenceId::new("R1")).await.unwrap();
        assert_eq!(fetched, detail());
        assert!(server.await.unwrap().starts_with("GET /api/referencias/R1/ HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let (base, _server) = serve_once("404 Not Found", r#"{"detail":"no existe"}"#.into()).await;
        let err = service(&base).fetch_reference(&ReferenceId::new("R1")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(ref body) if body.contains("no existe")));
    }

    #[tokio::test]
    async fn test_validation_statuses() {
        for status in ["400 Bad Request", "422 Unprocessable Entity"] {
            let (base, _server) = serve_once(status, r#"{"detail":"slug"}"#.into()).await;
            let err = service(&base)
                .available_phases(&ReferenceId::new("R1"))
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "{status}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_conflict_on_action_is_stale_state() {
        let (base, server) = serve_once("409 Conflict", r#"{"detail":"not current"}"#.into()).await;
        let request = ActionRequest::deliver("costeo");
        let err = service(&base)
            .apply_action(&ReferenceId::new("R1"), &request, "ana")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::StaleState(_)));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/referencias/R1/acciones/ HTTP/1.1"));
        assert!(raw.contains(r#""phaseSlug":"costeo""#));
        assert!(raw.contains(r#""user":"ana""#));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "boom".into()).await;
        let err = service(&base).fetch_reference(&ReferenceId::new("R1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_json_error() {
        let (base, _server) = serve_once("200 OK", "{".into()).await;
        let err = service(&base).fetch_reference(&ReferenceId::new("R1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) is not expected to serve HTTP.
        let svc = service("http://127.0.0.1:9");
        let err = svc.fetch_reference(&ReferenceId::new("R1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}

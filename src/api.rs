//! Authenticated client for the Quanskill REST API.
//!
//! The bearer token is checked once when the client is built and attached to
//! every request. Responses are decoded into typed envelopes so a payload that
//! does not match the expected shape fails here instead of reaching a table.

use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{SignInRequest, SignInResponse};
use crate::session::{Session, SessionUser};

pub const DEFAULT_BASE_URL: &str = "https://api.quanskill.com/api/v1";

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Server-side pagination block attached to some list responses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pagination {
    pub prev_page_url: Option<String>,
    pub next_page_url: Option<String>,
    pub current_page: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Best human-readable message in an error body.
pub fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Checks status and error markers, returning the parsed body.
pub fn decode_body(path: &str, status: u16, body: &str) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::http(status, error_message(body)));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|err| ApiError::schema(path, err.to_string()))?;

    let reported = value.get("status").and_then(Value::as_str);
    if reported.is_some_and(|status| status.eq_ignore_ascii_case("error")) {
        return Err(ApiError::Rejected(error_message(body)));
    }
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(ApiError::Rejected(error.to_string()));
    }
    Ok(value)
}

/// Maps a raw response onto an envelope or an [`ApiError`].
pub fn decode_envelope<T: DeserializeOwned>(
    path: &str,
    status: u16,
    body: &str,
) -> Result<Envelope<T>, ApiError> {
    let value = decode_body(path, status, body)?;
    serde_json::from_value(value).map_err(|err| ApiError::schema(path, err.to_string()))
}

/// Decodes one top-level field of a body that has no `data` envelope.
pub fn decode_field<T: DeserializeOwned>(path: &str, field: &str, value: Value) -> Result<T, ApiError> {
    let Value::Object(mut object) = value else {
        return Err(ApiError::schema(path, "expected a JSON object"));
    };
    let inner = object
        .remove(field)
        .ok_or_else(|| ApiError::schema(path, format!("missing field `{field}`")))?;
    serde_json::from_value(inner).map_err(|err| ApiError::schema(path, err.to_string()))
}

fn build_http(timeout: Option<Duration>) -> Result<Client, ApiError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: &Session,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let token = session.token().ok_or(ApiError::MissingToken)?.to_string();
        Ok(Self {
            http: build_http(timeout)?,
            base_url: base_url.into(),
            token,
        })
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send_raw(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("api_request", %method, path, %request_id);

        async {
            let started = Instant::now();
            let mut request = self
                .http
                .request(method, self.url(path))
                .header(ACCEPT, "application/json")
                .header(REQUEST_ID_HEADER, request_id.to_string())
                .bearer_auth(&self.token);
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            tracing::debug!(
                status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "response received"
            );

            decode_body(path, status, &text).inspect_err(|err| {
                tracing::warn!(error = %err, "request failed");
            })
        }
        .instrument(span)
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope<T>, ApiError> {
        let value = self.send_raw(method, path, body).await?;
        serde_json::from_value(value).map_err(|err| {
            tracing::warn!(path, error = %err, "response did not match schema");
            ApiError::schema(path, err.to_string())
        })
    }

    pub async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Ok(self.get_envelope(path).await?.data)
    }

    /// GET for endpoints that return their payload under `field` instead of `data`.
    pub async fn get_field<T: DeserializeOwned>(&self, path: &str, field: &str) -> Result<T, ApiError> {
        let value = self.send_raw(Method::GET, path, None).await?;
        decode_field(path, field, value)
    }

    fn to_body<B: Serialize>(path: &str, body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|err| ApiError::schema(path, err.to_string()))
    }

    /// POST returning the envelope's message, if any.
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Option<String>, ApiError> {
        let body = Self::to_body(path, body)?;
        let envelope: Envelope<Option<Value>> = self.send(Method::POST, path, Some(body)).await?;
        Ok(envelope.message)
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Option<String>, ApiError> {
        let body = Self::to_body(path, body)?;
        let envelope: Envelope<Option<Value>> = self.send(Method::PUT, path, Some(body)).await?;
        Ok(envelope.message)
    }

    pub async fn delete(&self, path: &str) -> Result<Option<String>, ApiError> {
        let envelope: Envelope<Option<Value>> = self.send(Method::DELETE, path, None).await?;
        Ok(envelope.message)
    }
}

/// Exchanges credentials for a session. The only unauthenticated call.
pub async fn sign_in(
    base_url: &str,
    email: &str,
    password: &str,
    timeout: Option<Duration>,
) -> Result<Session, ApiError> {
    let path = "auth/signin";
    let http = build_http(timeout)?;
    let response = http
        .post(join_url(base_url, path))
        .header(ACCEPT, "application/json")
        .json(&SignInRequest { email, password })
        .send()
        .await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    session_from_sign_in(path, status, &text)
}

fn session_from_sign_in(path: &str, status: u16, body: &str) -> Result<Session, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::http(status, error_message(body)));
    }
    let parsed: SignInResponse =
        serde_json::from_str(body).map_err(|err| ApiError::schema(path, err.to_string()))?;

    if parsed.status.as_deref() != Some("success") {
        return Err(ApiError::Rejected(
            parsed
                .message
                .unwrap_or_else(|| "authentication failed".to_string()),
        ));
    }

    let token = parsed
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or(ApiError::MissingToken)?;
    let user = parsed.data.map(|user| SessionUser {
        id: user.id,
        name: format!("{} {}", user.first_name, user.last_name),
        email: user.email,
        image: user.pic,
        role: user.role,
    });

    Ok(Session {
        access_token: token,
        user,
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::models::Faq;

    #[test]
    fn joins_paths_onto_base_url() {
        assert_eq!(
            join_url("https://api.quanskill.com/api/v1/", "/cohort"),
            "https://api.quanskill.com/api/v1/cohort"
        );
        assert_eq!(
            join_url(DEFAULT_BASE_URL, "cohort/fetch-schedule/c1"),
            "https://api.quanskill.com/api/v1/cohort/fetch-schedule/c1"
        );
    }

    #[test]
    fn client_requires_a_token() {
        let result = ApiClient::new(DEFAULT_BASE_URL, &Session::from_token(""), None);
        assert!(matches!(result, Err(ApiError::MissingToken)));
    }

    #[test]
    fn decodes_typed_data_and_pagination() {
        let body = r#"{
            "status": "success",
            "message": "ok",
            "data": [{"id": "q1", "question": "Q?", "answer": "A.", "created_at": "2024-11-05", "updated_at": "2024-11-05"}],
            "pagination": {"prev_page_url": null, "next_page_url": "https://x/?page=2", "current_page": 1, "total": 12}
        }"#;
        let envelope: Envelope<Vec<Faq>> = decode_envelope("faq", 200, body).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].question, "Q?");
        assert_eq!(envelope.pagination.unwrap().total, 12);
    }

    #[test]
    fn malformed_payload_is_a_schema_error() {
        let body = r#"{"data": [{"id": "q1"}]}"#;
        let result: Result<Envelope<Vec<Faq>>, _> = decode_envelope("faq", 200, body);
        match result {
            Err(ApiError::Schema { path, .. }) => assert_eq!(path, "faq"),
            other => panic!("expected schema error, got {other:?}"),
        }

        let result: Result<Envelope<Vec<Faq>>, _> = decode_envelope("faq", 200, "<html>");
        assert!(matches!(result, Err(ApiError::Schema { .. })));
    }

    #[test]
    fn error_statuses_carry_the_body_message() {
        let result: Result<Envelope<Value>, _> =
            decode_envelope("lecturer", 422, r#"{"message": "The email has already been taken."}"#);
        match result {
            Err(ApiError::Http { status, message }) => {
                assert_eq!(status, 422);
                assert_eq!(message, "The email has already been taken.");
            }
            other => panic!("expected http error, got {other:?}"),
        }

        let result: Result<Envelope<Value>, _> = decode_envelope("cohort", 500, "");
        assert_eq!(result.unwrap_err().to_string(), "HTTP 500: no response body");
    }

    #[test]
    fn envelope_errors_on_success_status_are_rejections() {
        let result: Result<Envelope<Option<Value>>, _> = decode_envelope(
            "cohort/add-url/s1",
            200,
            r#"{"status": "error", "message": "Schedule not found"}"#,
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "request rejected: Schedule not found"
        );

        let result: Result<Envelope<Option<Value>>, _> =
            decode_envelope("faq/q1", 200, r#"{"error": "Invalid FAQ"}"#);
        assert!(matches!(result, Err(ApiError::Rejected(message)) if message == "Invalid FAQ"));
    }

    #[test]
    fn bare_bodies_decode_a_named_field() {
        let body = r#"{"status": "success", "students": [{"id": "s1"}, {"id": "s2"}]}"#;
        let value = decode_body("cohort/all-students-with-status/c1", 200, body).unwrap();
        let ids: Vec<serde_json::Map<String, Value>> =
            decode_field("cohort/all-students-with-status/c1", "students", value.clone()).unwrap();
        assert_eq!(ids.len(), 2);

        let missing: Result<Vec<Value>, _> = decode_field("cohort/all-students-with-status/c1", "data", value);
        match missing {
            Err(ApiError::Schema { message, .. }) => assert_eq!(message, "missing field `data`"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn mutation_envelopes_may_omit_data() {
        let envelope: Envelope<Option<Value>> =
            decode_envelope("faq/q1", 200, r#"{"status": "success", "message": "Deleted"}"#).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("Deleted"));
    }

    #[test]
    fn sign_in_builds_a_session() {
        let body = r#"{
            "status": "success",
            "token": "tok-1",
            "data": {"id": "u1", "first_name": "Ada", "last_name": "Obi", "email": "ada@quanskill.com", "pic": null, "role": "admin"}
        }"#;
        let session = session_from_sign_in("auth/signin", 200, body).unwrap();
        assert_eq!(session.access_token, "tok-1");
        let user = session.user.unwrap();
        assert_eq!(user.name, "Ada Obi");
        assert_eq!(user.role.as_deref(), Some("admin"));

        let failed = session_from_sign_in(
            "auth/signin",
            200,
            r#"{"status": "failed", "message": "Invalid credentials"}"#,
        );
        assert_eq!(
            failed.unwrap_err().to_string(),
            "request rejected: Invalid credentials"
        );
    }

    #[tokio::test]
    async fn requests_carry_the_bearer_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 8192];
            let mut received = Vec::new();
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                received.extend_from_slice(&buffer[..read]);
                if read == 0 || received.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let body = r#"{"status":"success","data":{"waitlist":3,"faqs":4,"posts":5,"draft_posts":1,"published_posts":4,"lecturers":6,"active_lecturers":5,"inactive_lecturers":1,"admins":2,"students":40}}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        let client = ApiClient::new(
            format!("http://{address}/api/v1"),
            &Session::from_token("tok-xyz"),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        let analytics: crate::models::Analytics = client.get("analytics").await.unwrap();
        assert_eq!(analytics.students, 40);
        assert_eq!(analytics.cohorts, None);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/v1/analytics http/1.1"));
        assert!(request.contains("authorization: bearer tok-xyz"));
        assert!(request.contains("x-request-id: "));
    }
}

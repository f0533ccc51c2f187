//! Shared HTTP client for the portal API.
//!
//! This module wraps a `reqwest::Client` configured once at startup with:
//! - the API base URL (or the page origin when none is configured)
//! - a request timeout (10 seconds by default)
//! - `Content-Type: application/json` on every request unless overridden per call
//!
//! Every failed request passes through the registered [`ResponseInterceptor`]s
//! before the error is returned to the caller. Interceptors observe failures;
//! they never swallow them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ClientConfig;
use crate::error::ClientError;

/// Hook run on every failed request before the caller sees the error.
pub trait ResponseInterceptor: Send + Sync {
    /// Inspects a failure. The error is re-raised unchanged afterwards.
    fn intercept(&self, error: &ClientError);
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&ClientError) + Send + Sync,
{
    fn intercept(&self, error: &ClientError) {
        self(error)
    }
}

/// A successful (2xx) response with its body fully read.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Response body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: ClientConfig,
    default_headers: HeaderMap,
    interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl HttpClientBuilder {
    /// Starts a builder from `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            default_headers: HeaderMap::new(),
            interceptors: Vec::new(),
        }
    }

    /// Adds (or replaces) a header sent with every request.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Registers an interceptor. Interceptors run in registration order.
    pub fn interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Registers an already shared interceptor.
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the underlying client cannot be
    /// initialized (e.g. TLS backend failure).
    pub fn build(self) -> Result<HttpClient, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(self.default_headers);

        let builder = reqwest::Client::builder().default_headers(headers);

        // reqwest has no client-level timeout on wasm32
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(self.config.timeout);

        let inner = builder.build().map_err(ClientError::Network)?;

        tracing::trace!(
            "HTTP client ready: base_url={:?}, timeout={}ms, interceptors={}",
            self.config.api_base_url,
            self.config.timeout.as_millis(),
            self.interceptors.len()
        );

        Ok(HttpClient {
            inner,
            base_url: self.config.api_base_url,
            timeout: self.config.timeout,
            interceptors: Arc::new(self.interceptors),
        })
    }
}

/// Shared HTTP client for the portal API.
///
/// Cheap to clone; clones share the connection pool and interceptors.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Option<String>,
    timeout: Duration,
    interceptors: Arc<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl HttpClient {
    /// Returns a builder for `config`.
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder::new(config)
    }

    /// Builds a client without interceptors.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::builder(config).build()
    }

    /// Configured base URL, `None` for same-origin requests.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves `path` against the base URL (or the page origin).
    ///
    /// Absolute URLs are passed through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the result is not a valid URL, or
    /// if `path` is relative and there is neither a base URL nor a page origin.
    pub fn url(&self, path: &str) -> Result<String, ClientError> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let base = match &self.base_url {
                Some(base) => base.clone(),
                None => page_origin(path)?,
            };
            format!("{}/{}", base, path.trim_start_matches('/'))
        };

        reqwest::Url::parse(&url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(url)
    }

    /// Sends a request with an optional JSON body.
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request_with_headers(method, path, body, HeaderMap::new())
            .await
    }

    /// Sends a request, with `headers` overriding the defaults for this call only.
    ///
    /// # Errors
    ///
    /// - `ClientError::Network` on transport failure
    /// - `ClientError::Timeout` when the timeout elapses
    /// - `ClientError::Unauthorized` on 401, `ClientError::Http` on other non-2xx
    /// - `ClientError::Encode` / `ClientError::InvalidUrl` before anything is sent
    pub async fn request_with_headers<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let result = self.execute(method, path, body, headers).await;
        if let Err(err) = &result {
            for interceptor in self.interceptors.iter() {
                interceptor.intercept(err);
            }
        }
        result
    }

    /// `GET path`
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request::<()>(Method::GET, path, None).await
    }

    /// `DELETE path`
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.request::<()>(Method::DELETE, path, None).await
    }

    /// `POST path` with a JSON body
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PUT path` with a JSON body
    pub async fn put<B>(&self, path: &str, body: &B) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// `PATCH path` with a JSON body
    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::trace!("{} {}", method, url);

        let mut builder = self.inner.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        tracing::trace!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            return Err(ClientError::from_status(status, error_message(status, &body)));
        }

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Network(error)
        }
    }
}

/// Extracts a human-readable message from an error body.
///
/// The backend reports errors as `{ "detail": ... }`; other bodies are used
/// verbatim, and an empty body falls back to the status reason.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
        && let Some(detail) = value.get("detail")
    {
        return match detail.as_str() {
            Some(text) => text.to_string(),
            None => detail.to_string(),
        };
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        text.to_string()
    }
}

#[cfg(target_arch = "wasm32")]
fn page_origin(_path: &str) -> Result<String, ClientError> {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .ok_or_else(|| ClientError::InvalidUrl("failed to get window origin".to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
fn page_origin(path: &str) -> Result<String, ClientError> {
    Err(ClientError::InvalidUrl(format!(
        "relative path '{}' requires an API base URL outside the browser",
        path
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::new(ClientConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = HttpClient::new(ClientConfig::new("http://localhost:8000/")).unwrap();
        assert_eq!(
            client.url("/api/auth/login").unwrap(),
            "http://localhost:8000/api/auth/login"
        );
        assert_eq!(
            client.url("api/lunches").unwrap(),
            "http://localhost:8000/api/lunches"
        );
    }

    #[test]
    fn test_url_passes_absolute_through() {
        let client = HttpClient::new(ClientConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(
            client.url("https://other.example.com/x").unwrap(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_url_relative_without_base_fails_natively() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        let err = client.url("/api/auth/login").unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_default_timeout() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(10));
        assert!(client.base_url().is_none());
    }

    #[test]
    fn test_error_message_from_detail() {
        let msg = error_message(StatusCode::UNAUTHORIZED, br#"{"detail":"Invalid credentials"}"#);
        assert_eq!(msg, "Invalid credentials");
    }

    #[test]
    fn test_error_message_from_structured_detail() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail":[{"loc":["body","subdomain"]}]}"#,
        );
        assert!(msg.contains("subdomain"));
    }

    #[test]
    fn test_error_message_from_text_and_empty_body() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, b" upstream down "), "upstream down");
        assert_eq!(error_message(StatusCode::NOT_FOUND, b""), "Not Found");
    }

    #[tokio::test]
    async fn test_post_sends_json_with_default_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"hello": "world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .post("/api/echo", &json!({"hello": "world"}))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_per_call_header_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/upload"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = client_for(&server)
            .request_with_headers(Method::PUT, "/api/upload", Some("raw"), headers)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/lunches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let values: Vec<u32> = client_for(&server)
            .get("/api/lunches")
            .await
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_decode_mismatch_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/lunches"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let response = client_for(&server).get("/api/lunches").await.unwrap();
        let err = response.json::<Vec<u32>>().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/lunches"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Session expired"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).get("/api/lunches").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Unauthorized: Session expired");
    }

    #[tokio::test]
    async fn test_other_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/lunches/3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).delete("/api/lunches/3").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::new(
            ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = client.get("/api/slow").await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn test_network_failure() {
        // Nothing listens on port 1
        let client = HttpClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let err = client.get("/api/lunches").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_interceptors_see_failures_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&seen);
        let second = Arc::clone(&seen);

        let client = HttpClient::builder(ClientConfig::new(server.uri()))
            .interceptor(move |err: &ClientError| {
                first.lock().push(format!("first:{}", err.status().map_or(0, |s| s.as_u16())));
            })
            .interceptor(move |_: &ClientError| second.lock().push("second".to_string()))
            .build()
            .unwrap();

        client.get("/api/ok").await.unwrap();
        assert!(seen.lock().is_empty());

        let err = client.get("/api/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(*seen.lock(), vec!["first:404".to_string(), "second".to_string()]);
    }
}

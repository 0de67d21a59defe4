//! Request/response channel to the engine.
//!
//! The core treats a transport as a blocking call that either yields a
//! response or fails. Timeouts and TLS live entirely in the implementation.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use solr_types::Settings;

use crate::error::ConnectionError;

/// Content type of every update request.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrRequest {
    pub method: Method,
    /// Path plus query string, relative to the engine's base URL
    pub path: String,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl SolrRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            content_type: None,
            body: None,
        }
    }

    pub fn post_xml(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            content_type: Some(XML_CONTENT_TYPE.to_string()),
            body: Some(body.into()),
        }
    }
}

/// Renders `"<METHOD> <path>"`, followed by the body on the next line.
impl fmt::Display for SolrRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(body) = &self.body {
            write!(f, "\n{}", body)?;
        }
        Ok(())
    }
}

/// Raw engine response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolrResponse {
    pub status: u16,
    pub body: String,
}

impl SolrResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response channel owned by one connection.
pub trait Transport: Send {
    /// Send one request and wait for the response.
    fn send(&mut self, request: &SolrRequest) -> Result<SolrResponse, ConnectionError>;

    /// Release any resources held by the channel.
    fn close(&mut self) {}
}

/// Creates the transport for each new connection.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Transport>, ConnectionError>;
}

/// HTTP transport over a blocking reqwest client.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport talking to `base_url` (scheme, host and port).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConnectionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: &SolrRequest) -> Result<SolrResponse, ConnectionError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), request.path);
        debug!(method = %request.method, %url, "Sending engine request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(SolrResponse { status, body })
    }
}

/// Builds one [`HttpTransport`] per connection from [`Settings`].
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
    base_url: String,
    timeout: Duration,
}

impl HttpTransportFactory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.base_url(),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

impl TransportFactory for HttpTransportFactory {
    fn create(&self) -> Result<Box<dyn Transport>, ConnectionError> {
        Ok(Box::new(HttpTransport::new(
            self.base_url.clone(),
            self.timeout,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_display() {
        let get = SolrRequest::get("/solr/admin/get-file.jsp?file=schema.xml");
        assert_eq!(
            get.to_string(),
            "GET /solr/admin/get-file.jsp?file=schema.xml"
        );

        let post = SolrRequest::post_xml("/solr/update", "<commit/>");
        assert_eq!(post.to_string(), "POST /solr/update\n<commit/>");
        assert_eq!(post.content_type.as_deref(), Some(XML_CONTENT_TYPE));
    }

    #[test]
    fn test_response_success_range() {
        assert!(SolrResponse::ok("").is_success());
        assert!(SolrResponse::new(204, "").is_success());
        assert!(!SolrResponse::new(400, "").is_success());
        assert!(!SolrResponse::new(503, "").is_success());
    }

    #[test]
    fn test_factory_from_settings() {
        let settings = Settings {
            host: "search.internal".to_string(),
            port: 8080,
            ..Settings::default()
        };
        let factory = HttpTransportFactory::from_settings(&settings);
        assert_eq!(factory.base_url, "http://search.internal:8080");
        assert_eq!(factory.timeout, Duration::from_secs(10));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_transport_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/solr/update"))
            .and(header("content-type", XML_CONTENT_TYPE))
            .and(body_string("<commit/>"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<response/>"))
            .expect(1)
            .mount(&server)
            .await;

        let base_url = server.uri();
        let response = tokio::task::spawn_blocking(move || {
            let mut transport = HttpTransport::new(base_url, Duration::from_secs(5)).unwrap();
            transport.send(&SolrRequest::post_xml("/solr/update", "<commit/>"))
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<response/>");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_transport_get_with_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/admin/get-file.jsp"))
            .and(query_param("file", "schema.xml"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let base_url = server.uri();
        let response = tokio::task::spawn_blocking(move || {
            let mut transport = HttpTransport::new(base_url, Duration::from_secs(5)).unwrap();
            transport.send(&SolrRequest::get("/solr/admin/get-file.jsp?file=schema.xml"))
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[test]
    fn test_http_transport_unreachable() {
        // Port 9 (discard) is almost never listening.
        let mut transport =
            HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = transport.send(&SolrRequest::get("/solr/ping")).unwrap_err();
        assert!(matches!(err, ConnectionError::Http(_)));
    }
}

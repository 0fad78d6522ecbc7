//! HTTP transport to the rendering service.
//!
//! The [`Transport`] trait is the seam between the pipelines and the
//! network. [`HttpTransport`] is the production implementation (reqwest,
//! multipart POST); tests substitute a recording mock.
//!
//! A transport call is one round trip: open the image, POST the multipart
//! body, require a 2xx status and read the whole body. There is no retry and
//! no timeout.

use crate::config::ServerConfig;
use crate::request::{GenerationRequest, UPLOAD_FILE_NAME, UPLOAD_MIME};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },
}

/// Which server operation to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /generate-preview/`, answers with a raster image.
    Preview,
    /// `POST /generate-stencil/`, answers with a PDF.
    Stencil,
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    /// The `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

pub trait Transport: Sync {
    /// Send `request` to `endpoint` and return the full response body.
    fn send(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Payload, TransportError>> + Send;
}

/// reqwest-backed transport against a fixed origin.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    preview_path: String,
    stencil_path: String,
}

impl HttpTransport {
    pub fn new(server: &ServerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), server)
    }

    pub fn with_client(client: reqwest::Client, server: &ServerConfig) -> Self {
        Self {
            client,
            base_url: server.base_url.clone(),
            preview_path: server.preview_path.clone(),
            stencil_path: server.stencil_path.clone(),
        }
    }

    /// Absolute URL for `endpoint`.
    pub fn url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::Preview => &self.preview_path,
            Endpoint::Stencil => &self.stencil_path,
        };
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<Payload, TransportError> {
        let url = self.url(endpoint);
        let path = request.image.path();
        let image = tokio::fs::read(path)
            .await
            .map_err(|source| TransportError::Image {
                path: path.to_path_buf(),
                source,
            })?;

        let file = Part::bytes(image)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)?;
        let mut form = Form::new().part("file", file);
        for (name, value) in request.text_fields() {
            debug!(field = name, %value, "form field");
            form = form.text(name, value);
        }

        info!(%url, "sending request");
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        debug!(len = bytes.len(), ?content_type, "response body read");

        Ok(Payload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::request::{SelectedImage, build_request};
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(&ServerConfig {
            base_url: base.to_string(),
            ..ServerConfig::default()
        })
    }

    #[test]
    fn default_endpoints() {
        let t = HttpTransport::new(&ServerConfig::default());
        assert_eq!(
            t.url(Endpoint::Preview),
            "https://stencil-maker-backend.onrender.com/generate-preview/"
        );
        assert_eq!(
            t.url(Endpoint::Stencil),
            "https://stencil-maker-backend.onrender.com/generate-stencil/"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_not_doubled() {
        let t = transport("http://localhost:8000/");
        assert_eq!(
            t.url(Endpoint::Preview),
            "http://localhost:8000/generate-preview/"
        );
    }

    #[tokio::test]
    async fn missing_image_fails_before_any_request() {
        // Port 9 (discard) is never contacted: reading the image fails first.
        let t = transport("http://127.0.0.1:9");
        let request = crate::request::build_request(
            &crate::form::FormState::default(),
            Some(&crate::request::SelectedImage::new(
                "/definitely/not/here.jpg",
            )),
        )
        .unwrap();
        let err = t.send(Endpoint::Preview, &request).await.unwrap_err();
        assert!(matches!(err, TransportError::Image { .. }));
    }

    /// Whether `buf` holds a full HTTP request (headers plus body).
    fn request_complete(buf: &[u8]) -> bool {
        let Some(split) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&buf[..split]).to_ascii_lowercase();
        let body = &buf[split + 4..];
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        match length {
            Some(length) => body.len() >= length,
            None => body.ends_with(b"0\r\n\r\n"),
        }
    }

    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }
        buf
    }

    /// Answer a single request on a local port; the handle yields the raw
    /// request bytes.
    async fn serve_once(status: u16, body: &'static [u8]) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let head = format!(
                "HTTP/1.1 {status} Test\r\n\
                 Content-Type: application/pdf\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            let _ = stream.shutdown().await;
            request
        });
        (base, handle)
    }

    fn local_transport(base: &str) -> HttpTransport {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpTransport::with_client(
            client,
            &ServerConfig {
                base_url: base.to_string(),
                ..ServerConfig::default()
            },
        )
    }

    fn request_with_image(tmp: &TempDir) -> GenerationRequest {
        let image = tmp.path().join("cat.jpg");
        std::fs::write(&image, b"jpeg bytes stand-in").unwrap();
        build_request(&FormState::default(), Some(&SelectedImage::new(&image))).unwrap()
    }

    #[tokio::test]
    async fn sends_multipart_body_to_endpoint() {
        let tmp = TempDir::new().unwrap();
        let request = request_with_image(&tmp);
        let (base, server) = serve_once(200, b"%PDF-1.4").await;

        let payload = local_transport(&base)
            .send(Endpoint::Stencil, &request)
            .await
            .unwrap();
        assert_eq!(payload.bytes, b"%PDF-1.4");
        assert_eq!(payload.content_type.as_deref(), Some("application/pdf"));

        let raw = String::from_utf8_lossy(&server.await.unwrap()).into_owned();
        assert!(raw.starts_with("POST /generate-stencil/ HTTP/1.1"), "{raw}");
        assert!(raw.contains(r#"name="file"; filename="upload.jpg""#));
        assert!(raw.to_ascii_lowercase().contains("content-type: image/jpeg"));
        assert!(raw.contains("jpeg bytes stand-in"));
        for (name, value) in request.text_fields() {
            assert!(raw.contains(&format!(r#"name="{name}""#)), "missing {name}");
            assert!(
                raw.contains(&format!("\r\n\r\n{value}\r\n")),
                "missing value {value} for {name}"
            );
        }
    }

    #[tokio::test]
    async fn server_error_status_is_reported() {
        let tmp = TempDir::new().unwrap();
        let request = request_with_image(&tmp);
        let (base, server) = serve_once(500, b"boom").await;

        let err = local_transport(&base)
            .send(Endpoint::Preview, &request)
            .await
            .unwrap_err();
        match err {
            TransportError::Status { status, url } => {
                assert_eq!(status, 500);
                assert_eq!(url, format!("{base}/generate-preview/"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
        server.await.unwrap();
    }
}

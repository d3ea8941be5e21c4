//! Overlay images
//!
//! The overlay model as authored by the editor, and the HTTP collaborator
//! that downloads overlay images for a render.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ImageFetcher;

/// Width used when an overlay does not specify one (reference units)
pub const DEFAULT_OVERLAY_WIDTH: f64 = 300.0;

/// An image placed on the video, in the 280-unit reference frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    /// Image URL; overlays without one are skipped
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_overlay_width")]
    pub width: f64,
}

fn default_overlay_width() -> f64 {
    DEFAULT_OVERLAY_WIDTH
}

impl Overlay {
    /// Image URL, if present and non-blank
    pub fn source(&self) -> Option<&str> {
        self.src.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Extension for the downloaded image (`png` or `jpg`)
    pub fn image_extension(&self) -> &'static str {
        match self.source() {
            Some(src) if src.contains(".png") => "png",
            _ => "jpg",
        }
    }
}

/// Why an overlay image could not be fetched
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads overlay images over HTTP(S)
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("reelcap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_defaults() {
        let overlay: Overlay =
            serde_json::from_str(r#"{"src": "https://placehold.co/100.png"}"#).unwrap();
        assert_eq!(overlay.x, 0.0);
        assert_eq!(overlay.y, 0.0);
        assert_eq!(overlay.width, DEFAULT_OVERLAY_WIDTH);
    }

    #[test]
    fn test_overlay_without_src_has_no_source() {
        let overlay: Overlay = serde_json::from_str(r#"{"x": 10, "y": 20}"#).unwrap();
        assert_eq!(overlay.source(), None);

        let blank: Overlay = serde_json::from_str(r#"{"src": "  "}"#).unwrap();
        assert_eq!(blank.source(), None);
    }

    #[test]
    fn test_image_extension() {
        let png: Overlay = serde_json::from_str(r#"{"src": "https://a/b.png?x=1"}"#).unwrap();
        let jpg: Overlay = serde_json::from_str(r#"{"src": "https://a/b.webp"}"#).unwrap();
        assert_eq!(png.image_extension(), "png");
        assert_eq!(jpg.image_extension(), "jpg");
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            url: "https://a/b.png".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404: https://a/b.png");
    }

    /// Serves one canned HTTP response on a local port and returns its URL.
    async fn serve_once(response: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/overlay.png", addr)
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_status_error() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();

        match fetcher.fetch(&url).await {
            Err(FetchError::Status { status, url: failed }) => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPNG!",
        )
        .await;
        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), b"PNG!");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_transport_error() {
        let fetcher = HttpImageFetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/overlay.png").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}

//! Render responses
//!
//! Transport-agnostic response shape: status, headers, body. A web layer
//! copies these onto its own response type.

use serde::Serialize;

use crate::core::render::RenderOutcome;
use crate::core::CoreError;

/// Header carrying the auto-save location
pub const SAVED_PATH_HEADER: &str = "X-Saved-Path";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const DOWNLOAD_FILE_NAME: &str = "rendered_video.mp4";

/// Error body (`{"detail": "..."}`)
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct RenderResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RenderResponse {
    /// 200 with the video and, if auto-save succeeded, `X-Saved-Path`.
    pub fn from_outcome(outcome: RenderOutcome) -> Self {
        let mut headers = vec![
            ("Content-Type".to_string(), VIDEO_CONTENT_TYPE.to_string()),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ];
        if let Some(path) = &outcome.saved_path {
            headers.push((SAVED_PATH_HEADER.to_string(), path.display().to_string()));
        }

        Self {
            status: 200,
            headers,
            body: outcome.bytes,
        }
    }

    /// Error status with a JSON `detail` body.
    pub fn from_error(err: &CoreError) -> Self {
        let body = ErrorBody {
            detail: err.to_string(),
        };

        Self {
            status: status_for(err),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(&body).unwrap_or_else(|_| body.detail.into_bytes()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP status for an error
pub fn status_for(err: &CoreError) -> u16 {
    match err {
        CoreError::ClientInput(_) => 400,
        CoreError::Timeout(_) => 504,
        _ => 500,
    }
}

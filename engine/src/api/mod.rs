//! Render API
//!
//! Request decoding and response shaping for the render endpoint. The
//! transport (HTTP server, CLI) hands in the uploaded video and the raw form
//! fields and gets back a [`RenderResponse`].

mod form;
mod response;

pub use form::{decode_upload, parse_fps, RenderForm};
pub use response::{
    status_for, ErrorBody, RenderResponse, DOWNLOAD_FILE_NAME, SAVED_PATH_HEADER,
    VIDEO_CONTENT_TYPE,
};

use crate::core::render::CaptionRenderer;

/// Handles one render request end to end.
///
/// Never fails: every error is mapped onto a response status with a
/// `detail` body.
pub async fn handle_render(
    renderer: &CaptionRenderer,
    video: Option<Vec<u8>>,
    form: &RenderForm,
) -> RenderResponse {
    let (input, request) = match decode_upload(video, form) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Rejected render request: {}", e);
            return RenderResponse::from_error(&e);
        }
    };

    match renderer.render(input, &request).await {
        Ok(outcome) => {
            if !outcome.report.is_clean() {
                tracing::warn!(report = ?outcome.report, "Render completed with degraded steps");
            }
            RenderResponse::from_outcome(outcome)
        }
        Err(e) => RenderResponse::from_error(&e),
    }
}

//! Render form decoding
//!
//! The editor posts a render as multipart form fields whose values are JSON
//! strings. Decoding is the only place a `ClientInput` error is produced,
//! and it runs before any file is written.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::captions::{normalize_captions, CaptionPayload, StyleAttributes};
use crate::core::render::{Overlay, RenderInput, RenderRequest};
use crate::core::{BlockKey, CoreError, CoreResult, Offset};

/// Raw form fields of a render request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderForm {
    pub captions_json: Option<String>,
    pub style_json: Option<String>,
    pub offsets_json: Option<String>,
    pub overrides_json: Option<String>,
    pub overlays_json: Option<String>,
    pub fps: Option<String>,
}

impl RenderForm {
    /// Decodes the fields into a typed request.
    ///
    /// `captions_json`, `style_json` and `offsets_json` are required;
    /// `overrides_json`, `overlays_json` and `fps` may be missing or empty.
    pub fn decode(&self) -> CoreResult<RenderRequest> {
        let payloads: Vec<CaptionPayload> = required(&self.captions_json, "captions_json")?;
        let style: StyleAttributes = required(&self.style_json, "style_json")?;
        let offsets: HashMap<BlockKey, Offset> = required(&self.offsets_json, "offsets_json")?;
        let overrides: HashMap<BlockKey, StyleAttributes> =
            optional(&self.overrides_json, "overrides_json")?.unwrap_or_default();
        let overlays: Vec<Overlay> =
            optional(&self.overlays_json, "overlays_json")?.unwrap_or_default();

        Ok(RenderRequest {
            captions: normalize_captions(payloads),
            style,
            offsets,
            overrides,
            overlays,
            fps: parse_fps(self.fps.as_deref())?,
        })
    }
}

/// Decodes an upload: the video bytes plus the form.
pub fn decode_upload(
    video: Option<Vec<u8>>,
    form: &RenderForm,
) -> CoreResult<(RenderInput, RenderRequest)> {
    let request = form.decode()?;
    let video = video
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| CoreError::ClientInput("missing video file".to_string()))?;

    Ok((RenderInput::Bytes(video), request))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_field<T: DeserializeOwned>(raw: &str, field: &str) -> CoreResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| CoreError::ClientInput(format!("{} is not valid: {}", field, e)))
}

fn required<T: DeserializeOwned>(value: &Option<String>, field: &str) -> CoreResult<T> {
    let raw = non_blank(value)
        .ok_or_else(|| CoreError::ClientInput(format!("missing field {}", field)))?;
    parse_field(raw, field)
}

fn optional<T: DeserializeOwned>(value: &Option<String>, field: &str) -> CoreResult<Option<T>> {
    non_blank(value).map(|raw| parse_field(raw, field)).transpose()
}

/// Parses the `fps` field; absent or blank means "use the default".
pub fn parse_fps(raw: Option<&str>) -> CoreResult<Option<f64>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(fps) if fps.is_finite() && fps > 0.0 => Ok(Some(fps)),
        _ => Err(CoreError::ClientInput(format!(
            "fps must be a positive number, got {:?}",
            raw
        ))),
    }
}

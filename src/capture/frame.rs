use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("not a data URL: missing `data:` scheme")]
    MissingScheme,
    #[error("not a data URL: missing payload separator")]
    MissingPayload,
    #[error("unsupported data URL encoding (expected base64)")]
    NotBase64Encoded,
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// A still frame snapshotted from the live camera preview, as handed over by
/// the webview: a media type plus the base64 payload of the encoded image.
/// The payload is carried verbatim so encode/decode round-trips are lossless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedFrame {
    pub media_type: String,
    pub data: String,
}

impl CapturedFrame {
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    /// Parses a `data:<media type>;base64,<payload>` URL, the form produced
    /// by `canvas.toDataURL("image/jpeg")` on the frontend.
    pub fn from_data_url(data_url: &str) -> Result<Self, FrameError> {
        let rest = data_url.strip_prefix("data:").ok_or(FrameError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(FrameError::MissingPayload)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(FrameError::NotBase64Encoded)?;

        Ok(Self {
            media_type: media_type.to_string(),
            data: payload.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>, FrameError> {
        Ok(BASE64.decode(self.data.as_bytes())?)
    }
}

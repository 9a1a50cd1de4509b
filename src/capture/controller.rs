use anyhow::{bail, Result};
use log::info;
use serde::{Deserialize, Serialize};

use super::CapturedFrame;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CapturePurpose {
    Lock,
    Proof,
}

struct ActiveCapture {
    purpose: CapturePurpose,
    frozen: Option<CapturedFrame>,
}

/// Bookkeeping for the camera modal. The device stream itself lives in the
/// webview; this side enforces the resource contract: exactly one active
/// capture at a time, released on confirm, on close and on cancel.
pub struct CaptureController {
    active: Option<ActiveCapture>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn open(&mut self, purpose: CapturePurpose) -> Result<()> {
        if self.active.is_some() {
            bail!("capture already active");
        }
        info!("camera capture opened ({purpose:?})");
        self.active = Some(ActiveCapture {
            purpose,
            frozen: None,
        });
        Ok(())
    }

    /// Records the snapshotted frame. The frontend stops the device stream at
    /// the same moment, so a frozen frame implies no live stream.
    pub fn freeze(&mut self, frame: CapturedFrame) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            bail!("no capture in progress");
        };
        if active.frozen.is_some() {
            bail!("a frame is already frozen; retake or confirm it first");
        }
        active.frozen = Some(frame);
        Ok(())
    }

    /// Discards the frozen frame; the frontend reacquires the stream.
    pub fn retake(&mut self) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            bail!("no capture in progress");
        };
        if active.frozen.take().is_none() {
            bail!("no frozen frame to retake");
        }
        Ok(())
    }

    /// Hands the frozen frame to the caller and ends the capture session.
    pub fn confirm(&mut self) -> Result<(CapturePurpose, CapturedFrame)> {
        let Some(mut active) = self.active.take() else {
            bail!("no capture in progress");
        };
        let Some(frame) = active.frozen.take() else {
            // Put the session back so the user can still snap a frame.
            self.active = Some(active);
            bail!("no frame captured yet");
        };
        info!("camera capture confirmed ({:?})", active.purpose);
        Ok((active.purpose, frame))
    }

    /// Unconditional release. Safe to call when nothing is open.
    pub fn close(&mut self) -> Option<CapturePurpose> {
        let released = self.active.take().map(|active| active.purpose);
        if let Some(purpose) = released {
            info!("camera capture closed ({purpose:?})");
        }
        released
    }

    pub fn purpose(&self) -> Option<CapturePurpose> {
        self.active.as_ref().map(|active| active.purpose)
    }
}

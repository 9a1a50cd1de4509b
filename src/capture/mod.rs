pub mod controller;
pub mod frame;

pub use controller::{CaptureController, CapturePurpose};
pub use frame::{CapturedFrame, FrameError};

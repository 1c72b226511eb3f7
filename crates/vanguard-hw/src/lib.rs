//! vanguard-hw — Kiosk camera capture.
//!
//! Captures stills from the kiosk's V4L2 camera and hands them to the
//! scanner as quality-70 JPEG frames, the format the recognition
//! service expects.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, FrameSource};
pub use frame::JpegFrame;

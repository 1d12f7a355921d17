//! Camera input and frame handling.
//!
//! The camera is an external collaborator. This module defines the
//! interface the flows require from it, a scoped session type that
//! guarantees the device is released, and a mock used by tests and the
//! demo binary.

mod camera;
mod config;
mod frame;

pub use camera::{capture_once, Camera, CameraError, CaptureSession, MockCamera};
pub use config::{CaptureConfig, CaptureConfigError};
pub use frame::Frame;

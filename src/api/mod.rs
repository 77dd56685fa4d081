//! Host-facing facade over the capture and processing cores.

pub mod session;

pub use session::CaptureSession;

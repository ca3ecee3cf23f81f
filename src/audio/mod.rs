pub mod backend;
pub mod capture;
pub mod file;
pub mod signal;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use capture::WavCaptureDevice;
pub use file::{AudioFile, FileBackend};
pub use signal::SignalBackend;

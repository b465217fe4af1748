//! Audio I/O layer for the polivoz synthesis engine.
//!
//! The synthesis core only produces interleaved float samples; this crate
//! provides the external collaborators that move them somewhere useful:
//!
//! - **WAV file output**: [`write_wav`] for offline renders
//! - **Real-time streaming**: [`AudioStream`] drives an output device and
//!   pulls samples from a generator callback each hardware period
//! - **Device discovery**: [`list_devices`] and [`default_output`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polivoz_io::{AudioStream, StreamConfig, WavSpec, write_wav};
//!
//! // Offline: write an interleaved stereo render to disk
//! let samples = vec![0.0f32; 96000];
//! let spec = WavSpec { channels: 2, ..WavSpec::default() };
//! write_wav("render.wav", &samples, spec)?;
//!
//! // Realtime: pump a generator into the default output device
//! let mut stream = AudioStream::new(StreamConfig::default())?;
//! stream.run_output(|buffer| buffer.fill(0.0))?;
//! ```

mod stream;
mod wav;

pub use stream::{
    AudioDevice, AudioStream, StreamConfig, default_output, find_output_device, list_devices,
};
pub use wav::{WavSpec, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

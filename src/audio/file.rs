use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Capture length of the file
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_seconds)
    }
}

/// Replays a WAV file as if it were live input
///
/// Frames are emitted every `buffer_duration_ms`; the channel closes when the
/// file runs out or the backend is stopped.
pub struct FileBackend {
    audio: Arc<AudioFile>,
    buffer_ms: u64,
    is_capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>, config: AudioBackendConfig) -> Result<Self> {
        let audio = AudioFile::open(path)?;

        Ok(Self {
            audio: Arc::new(audio),
            buffer_ms: config.buffer_duration_ms.max(1),
            is_capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(100);
        let audio = Arc::clone(&self.audio);
        let buffer_ms = self.buffer_ms;
        let is_capturing = Arc::clone(&self.is_capturing);

        is_capturing.store(true, Ordering::SeqCst);
        info!("Replaying {} in {}ms frames", audio.path, buffer_ms);

        self.task = Some(tokio::spawn(async move {
            let channels = audio.channels.max(1) as usize;
            let samples_per_frame =
                (audio.sample_rate as u64 * buffer_ms / 1000) as usize * channels;
            let period = Duration::from_millis(buffer_ms);
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            let mut timestamp_ms = 0u64;

            for chunk in audio.samples.chunks(samples_per_frame.max(channels)) {
                if !is_capturing.load(Ordering::SeqCst) {
                    break;
                }
                interval.tick().await;

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: audio.sample_rate,
                    channels: audio.channels,
                    timestamp_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += buffer_ms;
            }

            is_capturing.store(false, Ordering::SeqCst);
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

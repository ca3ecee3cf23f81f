use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
use crate::recording::{CaptureDevice, CaptureOutput, PermissionStatus};

/// Capture device that records frames from an [`AudioBackend`] into a WAV file
pub struct WavCaptureDevice {
    source: AudioSource,
    config: AudioBackendConfig,
    access: PermissionStatus,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    backend: Box<dyn AudioBackend>,
    writer_task: JoinHandle<Result<ClipSummary>>,
}

impl WavCaptureDevice {
    pub fn new(source: AudioSource, config: AudioBackendConfig, access: PermissionStatus) -> Self {
        Self {
            source,
            config,
            access,
            active: None,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavCaptureDevice {
    async fn request_permission(&mut self) -> Result<PermissionStatus> {
        Ok(self.access)
    }

    async fn open(&mut self, target: &Path) -> Result<()> {
        if self.active.is_some() {
            anyhow::bail!("Capture already open");
        }

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).context("Failed to create recordings directory")?;
        }

        let mut backend = AudioBackendFactory::create(&self.source, self.config.clone())
            .context("Failed to create audio backend")?;

        let audio_rx = backend
            .start()
            .await
            .context("Failed to start audio capture")?;

        info!("Capturing {} into {}", backend.name(), target.display());

        let writer_task = tokio::spawn(write_clip(target.to_path_buf(), audio_rx));

        self.active = Some(ActiveCapture {
            backend,
            writer_task,
        });

        Ok(())
    }

    async fn finalize(&mut self) -> Result<CaptureOutput> {
        let mut active = self
            .active
            .take()
            .context("No capture open")?;

        // Stopping the backend closes the frame channel, which ends the writer
        if let Err(e) = active.backend.stop().await {
            warn!("Failed to stop audio backend: {}", e);
        }

        let summary = active
            .writer_task
            .await
            .context("Clip writer task panicked")??;

        info!(
            "Capture finalized: {:.1}s, {} samples",
            summary.duration.as_secs_f64(),
            summary.sample_count
        );

        Ok(CaptureOutput {
            file: summary.file,
            duration: summary.duration,
        })
    }

    fn name(&self) -> &str {
        "wav"
    }
}

impl Drop for WavCaptureDevice {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            warn!("Capture device dropped with an open capture; aborting writer");
            active.writer_task.abort();
        }
    }
}

struct ClipSummary {
    file: Option<PathBuf>,
    duration: Duration,
    sample_count: usize,
}

/// Drain frames into a WAV file; the file is created on the first frame
async fn write_clip(path: PathBuf, mut audio_rx: mpsc::Receiver<AudioFrame>) -> Result<ClipSummary> {
    let mut writer: Option<ClipWriter> = None;

    while let Some(frame) = audio_rx.recv().await {
        if writer.is_none() {
            writer = Some(ClipWriter::new(path.clone(), frame.sample_rate, frame.channels)?);
        }
        if let Some(writer) = writer.as_mut() {
            writer.write_frame(&frame)?;
        }
    }

    match writer {
        Some(writer) => writer.finish(),
        None => {
            warn!("No audio frames captured for {}", path.display());
            Ok(ClipSummary {
                file: None,
                duration: Duration::ZERO,
                sample_count: 0,
            })
        }
    }
}

/// Writes a single clip to disk as WAV file
struct ClipWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    sample_count: usize,
}

impl ClipWriter {
    fn new(path: PathBuf, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            anyhow::bail!(
                "Cannot write WAV with {}Hz and {} channel(s)",
                sample_rate,
                channels
            );
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer: Some(writer),
            path,
            sample_rate,
            channels,
            sample_count: 0,
        })
    }

    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer.write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.sample_count += frame.samples.len();
        }

        Ok(())
    }

    fn finish(mut self) -> Result<ClipSummary> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()
                .context("Failed to finalize WAV file")?;
        }

        let per_second = self.sample_rate as f64 * self.channels.max(1) as f64;
        let duration = Duration::from_secs_f64(self.sample_count as f64 / per_second);

        Ok(ClipSummary {
            file: Some(self.path.clone()),
            duration,
            sample_count: self.sample_count,
        })
    }
}

impl Drop for ClipWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}

use anyhow::Result;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

const TONE_AMPLITUDE: f32 = 0.25;

/// Generated audio paced in real time
pub struct SignalBackend {
    config: AudioBackendConfig,
    frequency_hz: Option<f32>,
    is_capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    name: String,
}

impl SignalBackend {
    pub fn tone(config: AudioBackendConfig, frequency_hz: f32) -> Self {
        Self {
            config,
            frequency_hz: Some(frequency_hz),
            is_capturing: Arc::new(AtomicBool::new(false)),
            task: None,
            name: format!("tone-{frequency_hz}hz"),
        }
    }

    pub fn silence(config: AudioBackendConfig) -> Self {
        Self {
            config,
            frequency_hz: None,
            is_capturing: Arc::new(AtomicBool::new(false)),
            task: None,
            name: "silence".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for SignalBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.is_capturing.load(Ordering::SeqCst) {
            anyhow::bail!("{} backend already capturing", self.name);
        }

        let (tx, rx) = mpsc::channel(100);
        let sample_rate = self.config.target_sample_rate;
        let channels = self.config.target_channels;
        let buffer_ms = self.config.buffer_duration_ms.max(1);
        let frames_per_buffer = (sample_rate as u64 * buffer_ms / 1000) as usize;
        let frequency_hz = self.frequency_hz;
        let is_capturing = Arc::clone(&self.is_capturing);

        is_capturing.store(true, Ordering::SeqCst);
        info!(
            "Starting {} backend: {}Hz, {}ch, {}ms buffers",
            self.name, sample_rate, channels, buffer_ms
        );

        self.task = Some(tokio::spawn(async move {
            // A frame is only due once a full buffer of time has passed
            let period = Duration::from_millis(buffer_ms);
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            let mut phase = 0.0f32;
            let step = frequency_hz.map(|f| TAU * f / sample_rate as f32).unwrap_or(0.0);
            let mut timestamp_ms = 0u64;

            while is_capturing.load(Ordering::SeqCst) {
                interval.tick().await;

                let mut samples = Vec::with_capacity(frames_per_buffer * channels as usize);
                for _ in 0..frames_per_buffer {
                    let value = if frequency_hz.is_some() {
                        let v = (phase.sin() * TONE_AMPLITUDE * i16::MAX as f32) as i16;
                        phase = (phase + step) % TAU;
                        v
                    } else {
                        0
                    };
                    samples.extend(std::iter::repeat(value).take(channels as usize));
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate,
                    channels,
                    timestamp_ms,
                };

                if tx.send(frame).await.is_err() {
                    warn!("Frame receiver dropped; stopping signal generator");
                    break;
                }
                timestamp_ms += buffer_ms;
            }

            debug!("Signal generator stopped at {}ms", timestamp_ms);
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.is_capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            // Abort rather than wait out the current interval tick
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for SignalBackend {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// Shared fixtures for integration tests
//
// `ScriptedDevice` stands in for a microphone: it answers the permission
// request as configured, pretends to record into the requested target and
// reports that path back (or nothing) on finalize. It never touches the
// filesystem, so it is safe under tokio's paused clock.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use voice_study::recording::{CaptureDevice, CaptureOutput, PermissionStatus};
use voice_study::timer::{CountdownTimer, TokioClock};

/// Counters shared between a test and the device it handed away
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub permission_requests: AtomicUsize,
    pub opens: AtomicUsize,
    pub finalizes: AtomicUsize,
    pub targets: Mutex<Vec<PathBuf>>,
}

impl DeviceLog {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn finalizes(&self) -> usize {
        self.finalizes.load(Ordering::SeqCst)
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<PathBuf> {
        self.targets.lock().unwrap().clone()
    }
}

pub struct ScriptedDevice {
    permission: PermissionStatus,
    produce_file: bool,
    fail_open: bool,
    open: Option<(PathBuf, Instant)>,
    log: Arc<DeviceLog>,
}

impl ScriptedDevice {
    pub fn granted() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            produce_file: true,
            fail_open: false,
            open: None,
            log: Arc::new(DeviceLog::default()),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            ..Self::granted()
        }
    }

    /// Finalize reports no file
    pub fn without_file(mut self) -> Self {
        self.produce_file = false;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn log(&self) -> Arc<DeviceLog> {
        Arc::clone(&self.log)
    }

    pub fn boxed(self) -> Box<dyn CaptureDevice> {
        Box::new(self)
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn request_permission(&mut self) -> Result<PermissionStatus> {
        self.log.permission_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.permission)
    }

    async fn open(&mut self, target: &Path) -> Result<()> {
        if self.fail_open {
            bail!("device busy");
        }
        if self.open.is_some() {
            bail!("already open");
        }

        self.log.opens.fetch_add(1, Ordering::SeqCst);
        self.log.targets.lock().unwrap().push(target.to_path_buf());
        self.open = Some((target.to_path_buf(), Instant::now()));
        Ok(())
    }

    async fn finalize(&mut self) -> Result<CaptureOutput> {
        let Some((target, opened_at)) = self.open.take() else {
            bail!("not open");
        };

        self.log.finalizes.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureOutput {
            file: self.produce_file.then_some(target),
            duration: opened_at.elapsed(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Timer on tokio's clock with a 100 ms poll
pub fn tokio_timer() -> CountdownTimer {
    CountdownTimer::new(Arc::new(TokioClock), Duration::from_millis(100))
}

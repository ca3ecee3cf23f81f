use thiserror::Error;
use tracing::{info, warn};

use super::definition::ExerciseDefinition;
use super::sequencer::{Completion, ExerciseSequencer, SequenceError};
use crate::recording::{CaptureError, CapturedClip, RecordingController};
use crate::timer::{TimerEvents, TimerState};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("The exercise timer stopped before it ran out")]
    TimerCancelled,
}

/// Runs a list of exercises in order, one capture at a time
pub struct ExerciseFlow {
    exercises: Vec<ExerciseDefinition>,
    sequencer: ExerciseSequencer,
    controller: RecordingController,
}

impl ExerciseFlow {
    pub fn new(exercises: Vec<ExerciseDefinition>, controller: RecordingController) -> Self {
        let sequencer = ExerciseSequencer::new(exercises.len());
        Self {
            exercises,
            sequencer,
            controller,
        }
    }

    /// Start exercise `ordinal`: sequencer guard first, then capture
    ///
    /// If capture cannot begin the exercise goes back to idle.
    pub async fn start_exercise(&mut self, ordinal: usize) -> Result<TimerEvents, FlowError> {
        self.sequencer.start(ordinal)?;

        match self.controller.begin_capture(&self.exercises[ordinal]).await {
            Ok(events) => Ok(events),
            Err(e) => {
                self.sequencer.abort_active();
                Err(e.into())
            }
        }
    }

    /// Handle the countdown expiry of the active exercise
    ///
    /// Returns `None` for a duplicate expiry.
    pub async fn finish_exercise(&mut self) -> Result<Option<Completion>, FlowError> {
        if self.controller.on_expiry().await.is_none() {
            return Ok(None);
        }
        Ok(Some(self.sequencer.complete_active()?))
    }

    /// Start `ordinal`, wait out its countdown, and finish it
    ///
    /// `on_tick` sees every countdown update, including the final zero.
    pub async fn run_exercise<F>(&mut self, ordinal: usize, mut on_tick: F) -> Result<Completion, FlowError>
    where
        F: FnMut(&TimerState),
    {
        let TimerEvents {
            mut state,
            mut expiry,
        } = self.start_exercise(ordinal).await?;

        loop {
            tokio::select! {
                biased;

                fired = &mut expiry => {
                    if fired.is_err() {
                        warn!("Countdown for exercise {} cancelled", ordinal);
                        self.abandon().await;
                        return Err(FlowError::TimerCancelled);
                    }
                    break;
                }

                changed = state.changed() => {
                    if changed.is_ok() {
                        on_tick(&*state.borrow_and_update());
                    }
                }
            }
        }

        on_tick(&*state.borrow());

        self.finish_exercise()
            .await?
            .ok_or(FlowError::Sequence(SequenceError::NothingActive))
    }

    /// Run every remaining exercise back to back, in order
    pub async fn run_all<F>(&mut self, mut on_tick: F) -> Result<(), FlowError>
    where
        F: FnMut(&ExerciseDefinition, &TimerState),
    {
        while let Some(ordinal) = self.sequencer.next_startable() {
            let exercise = self.exercises[ordinal].clone();
            info!("Starting exercise {} ({})", ordinal, exercise.name);
            self.run_exercise(ordinal, |state| on_tick(&exercise, state)).await?;
        }
        Ok(())
    }

    /// Drop out of the active exercise, discarding its capture
    pub async fn abandon(&mut self) {
        if self.controller.abort().await {
            info!("Abandoned active exercise");
        }
        self.sequencer.abort_active();
    }

    pub fn exercises(&self) -> &[ExerciseDefinition] {
        &self.exercises
    }

    pub fn sequencer(&self) -> &ExerciseSequencer {
        &self.sequencer
    }

    pub fn all_complete(&self) -> bool {
        self.sequencer.all_complete()
    }

    pub fn is_capturing(&self) -> bool {
        self.controller.is_capturing()
    }

    pub fn clips(&self) -> &[CapturedClip] {
        self.controller.clips()
    }

    pub fn into_clips(self) -> Vec<CapturedClip> {
        self.controller.into_clips()
    }
}

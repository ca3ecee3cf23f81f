use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("There is no exercise {0}")]
    UnknownExercise(usize),

    #[error("Exercise {active} is still in progress")]
    Busy { active: usize },

    #[error("Exercise {requested} cannot start before exercise {waiting_on} is complete")]
    OutOfOrder { requested: usize, waiting_on: usize },

    #[error("Exercise {0} is already complete")]
    AlreadyComplete(usize),

    #[error("No exercise is in progress")]
    NothingActive,
}

/// Result of completing the active exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub ordinal: usize,
    pub all_complete: bool,
}

/// Enforces in-order completion of a fixed list of exercises
///
/// `Idle(i) -> Active(i)` via [`start`](Self::start), `Active(i) -> Idle(i+1)`
/// via [`complete_active`](Self::complete_active). Rejected transitions leave
/// the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseSequencer {
    completed: Vec<bool>,
    active: Option<usize>,
}

impl ExerciseSequencer {
    pub fn new(len: usize) -> Self {
        Self {
            completed: vec![false; len],
            active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Why `ordinal` cannot start right now, if anything
    pub fn check_start(&self, ordinal: usize) -> Result<(), SequenceError> {
        if ordinal >= self.completed.len() {
            return Err(SequenceError::UnknownExercise(ordinal));
        }
        if let Some(active) = self.active {
            return Err(SequenceError::Busy { active });
        }
        if self.completed[ordinal] {
            return Err(SequenceError::AlreadyComplete(ordinal));
        }
        if ordinal > 0 && !self.completed[ordinal - 1] {
            return Err(SequenceError::OutOfOrder {
                requested: ordinal,
                waiting_on: ordinal - 1,
            });
        }
        Ok(())
    }

    pub fn is_startable(&self, ordinal: usize) -> bool {
        self.check_start(ordinal).is_ok()
    }

    pub fn start(&mut self, ordinal: usize) -> Result<(), SequenceError> {
        self.check_start(ordinal)?;
        self.active = Some(ordinal);
        debug!("Exercise {} active", ordinal);
        Ok(())
    }

    /// Mark the active exercise complete and go idle
    pub fn complete_active(&mut self) -> Result<Completion, SequenceError> {
        let ordinal = self.active.take().ok_or(SequenceError::NothingActive)?;
        self.completed[ordinal] = true;

        let all_complete = self.all_complete();
        if all_complete {
            info!("All {} exercises complete", self.completed.len());
        }

        Ok(Completion {
            ordinal,
            all_complete,
        })
    }

    /// Go idle without completing the active exercise
    pub fn abort_active(&mut self) -> Option<usize> {
        self.active.take()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_complete(&self, ordinal: usize) -> bool {
        self.completed.get(ordinal).copied().unwrap_or(false)
    }

    pub fn completed(&self) -> &[bool] {
        &self.completed
    }

    /// True only when every exercise has completed (false for an empty list)
    pub fn all_complete(&self) -> bool {
        !self.completed.is_empty() && self.completed.iter().all(|&done| done)
    }

    /// The exercise a user could start now
    pub fn next_startable(&self) -> Option<usize> {
        (0..self.completed.len()).find(|&i| self.is_startable(i))
    }
}

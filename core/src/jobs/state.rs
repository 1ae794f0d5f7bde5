use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Created,
    RunningBeforeHooks,
    ExpandingTasks,
    RunningTasks,
    RunningAfterHooks,
    Completed,
    Errored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobState, to: JobState },
    #[error("cannot leave terminal job state {state}")]
    FromTerminalState { state: JobState },
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::RunningBeforeHooks => "running-before-hooks",
            Self::ExpandingTasks => "expanding-tasks",
            Self::RunningTasks => "running-tasks",
            Self::RunningAfterHooks => "running-after-hooks",
            Self::Completed => "completed",
            Self::Errored => "errored",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    /// Task failures are isolated, so `RunningTasks` never goes to `Errored`.
    /// Expansion failures do: the job fails before any task is scheduled.
    pub fn can_transition_to(self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Created, RunningBeforeHooks)
                | (RunningBeforeHooks, ExpandingTasks)
                | (ExpandingTasks, RunningTasks)
                | (RunningTasks, RunningAfterHooks)
                | (RunningAfterHooks, Completed)
                | (Created, Errored)
                | (RunningBeforeHooks, Errored)
                | (ExpandingTasks, Errored)
                | (RunningAfterHooks, Errored)
        )
    }

    pub fn validate(self, to: JobState) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::FromTerminalState { state: self });
        }
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from: self, to })
        }
    }

    pub fn next(self) -> Option<JobState> {
        match self {
            Self::Created => Some(Self::RunningBeforeHooks),
            Self::RunningBeforeHooks => Some(Self::ExpandingTasks),
            Self::ExpandingTasks => Some(Self::RunningTasks),
            Self::RunningTasks => Some(Self::RunningAfterHooks),
            Self::RunningAfterHooks => Some(Self::Completed),
            Self::Completed | Self::Errored => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_valid() {
        let mut state = JobState::Created;
        while let Some(next) = state.next() {
            assert!(state.validate(next).is_ok(), "{state} -> {next}");
            state = next;
        }
        assert_eq!(state, JobState::Completed);
    }

    #[test]
    fn running_tasks_cannot_error() {
        assert!(!JobState::RunningTasks.can_transition_to(JobState::Errored));
        assert!(JobState::RunningBeforeHooks.can_transition_to(JobState::Errored));
        assert!(JobState::RunningAfterHooks.can_transition_to(JobState::Errored));
    }

    #[test]
    fn terminal_states_are_final() {
        assert_eq!(
            JobState::Completed.validate(JobState::Errored),
            Err(TransitionError::FromTerminalState { state: JobState::Completed })
        );
        assert!(matches!(
            JobState::Created.validate(JobState::RunningTasks),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(JobState::RunningBeforeHooks).unwrap(),
            serde_json::json!("running-before-hooks")
        );
    }
}

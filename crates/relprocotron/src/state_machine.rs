//! Run State Machine: explicit states and legal transition guards.
//!
//! Each issue-creation run moves forward through a fixed graph; it never
//! returns to an earlier state. Every transition is logged and recorded so a
//! run summary can show exactly how far a run got.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The set of run states.
///
/// Every run starts at `Loading` and terminates at either `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Reading and parsing the task document.
    Loading,
    /// Printing previews without touching the tracker.
    DryRunPreview,
    /// Checking that every required label exists on the tracker.
    Validating,
    /// Creating top-level issues.
    CreatingParents,
    /// Creating sub-task issues that reference their parents.
    CreatingChildren,
    /// Appending sub-task checklists to parent issues.
    PatchingParents,
    /// Run completed. Terminal.
    Done,
    /// Fatal error. Terminal.
    Failed,
}

impl RunState {
    /// Whether this is a terminal state (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::DryRunPreview => write!(f, "DryRunPreview"),
            Self::Validating => write!(f, "Validating"),
            Self::CreatingParents => write!(f, "CreatingParents"),
            Self::CreatingChildren => write!(f, "CreatingChildren"),
            Self::PatchingParents => write!(f, "PatchingParents"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Legal transitions between run states.
///
/// ```text
/// Loading → DryRunPreview | Validating | Failed
/// DryRunPreview → Done
/// Validating → CreatingParents | Failed
/// CreatingParents → CreatingChildren
/// CreatingChildren → PatchingParents
/// PatchingParents → Done
/// ```
///
/// Once issue creation has started, the run can no longer fail as a whole:
/// per-issue failures are isolated.
fn is_legal_transition(from: RunState, to: RunState) -> bool {
    use RunState::*;

    matches!(
        (from, to),
        (Loading, DryRunPreview)
            | (Loading, Validating)
            | (Loading, Failed)
            | (DryRunPreview, Done)
            | (Validating, CreatingParents)
            | (Validating, Failed)
            | (CreatingParents, CreatingChildren)
            | (CreatingChildren, PatchingParents)
            | (PatchingParents, Done)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: RunState,
    pub to: RunState,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: RunState,
    pub to: RunState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal state transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Tracks the current state and the full transition log of one run.
#[derive(Debug)]
pub struct RunStateMachine {
    current: RunState,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl RunStateMachine {
    /// Create a new state machine starting at `Loading`.
    pub fn new() -> Self {
        Self {
            current: RunState::Loading,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> RunState {
        self.current
    }

    /// Attempt to advance to the next state.
    pub fn advance(&mut self, to: RunState, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        tracing::debug!(from = %self.current, to = %to, "State transition");

        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        });
        self.current = to;
        Ok(())
    }

    /// Transition to `Failed` from a state where a fatal error is possible.
    pub fn fail(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(RunState::Failed, Some(reason))
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// States visited, starting with `Loading`.
    pub fn path(&self) -> Vec<RunState> {
        std::iter::once(RunState::Loading)
            .chain(self.transitions.iter().map(|t| t.to))
            .collect()
    }

    /// One-line history, e.g. `Loading → Validating → Failed (3ms)`.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self.path().iter().map(ToString::to_string).collect();
        format!(
            "{} ({}ms)",
            states.join(" → "),
            self.created_at.elapsed().as_millis()
        )
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

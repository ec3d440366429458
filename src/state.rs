use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifies one user of the workflow; typically a chat id supplied by the
/// transport. State is never shared across ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Recorded selection for one step. The variant is decided by the kind of
/// the button that wrote it: a step holds exactly one representation at a
/// time, coerced explicitly when a differently-kinded button is activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    Single(String),
    Radio(BTreeMap<String, String>),
    Checkboxes(BTreeSet<String>),
    Toggles(BTreeMap<String, bool>),
}

impl SelectionValue {
    pub fn as_radio(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Radio(groups) => Some(groups),
            _ => None,
        }
    }

    pub fn as_checkboxes(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Checkboxes(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_toggles(&self) -> Option<&BTreeMap<String, bool>> {
        match self {
            Self::Toggles(states) => Some(states),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepPointer {
    #[default]
    NotStarted,
    AtStep(String),
    Ended,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserWorkflowState {
    pub pointer: StepPointer,
    pub selections: BTreeMap<String, SelectionValue>,
}

impl UserWorkflowState {
    pub fn at_step(step_key: impl Into<String>) -> Self {
        Self {
            pointer: StepPointer::AtStep(step_key.into()),
            selections: BTreeMap::new(),
        }
    }

    pub fn current_step(&self) -> Option<&str> {
        match &self.pointer {
            StepPointer::AtStep(step) => Some(step),
            _ => None,
        }
    }

    /// Detached copy of the selections mapping, safe to serialize or hand to
    /// callers without exposing internal state.
    pub fn selections_snapshot(&self) -> BTreeMap<String, SelectionValue> {
        self.selections.clone()
    }
}

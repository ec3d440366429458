use crate::activation::Activation;
use crate::completion::can_complete;
use crate::definition::{ButtonKind, CompletionMode, WorkflowDefinition};
use crate::navigation::{next_step_key, previous_step_key};
use crate::render::{
    render, TerminalView, UiResponse, COMPLETED_TEXT, INTERNAL_ERROR_TEXT, STATE_LOST_TEXT,
    VALIDATION_WARNING_TEXT,
};
use crate::selection::record_selection;
use crate::state::{SelectionValue, StepPointer, UserId, UserWorkflowState};
use crate::store::{InMemoryStateStore, StateStore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Drives the workflow for all users of one definition. Every activation is
/// processed synchronously to completion; all recoverable conditions (stale
/// or malformed tokens, lost state, validation failures) are absorbed into
/// the returned descriptor and never surface as errors. Activations for the
/// same user must be serialized by the caller.
pub struct WorkflowEngine<S = InMemoryStateStore> {
    definition: WorkflowDefinition,
    store: S,
}

impl WorkflowEngine<InMemoryStateStore> {
    pub fn new(definition: WorkflowDefinition) -> Self {
        Self::with_store(definition, InMemoryStateStore::new())
    }
}

impl<S: StateStore> WorkflowEngine<S> {
    pub fn with_store(definition: WorkflowDefinition, store: S) -> Self {
        Self { definition, store }
    }

    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    /// Resets the user's state and presents the first step, or a terminal
    /// descriptor immediately when the workflow declares no steps.
    pub fn start(&mut self, user: &UserId) -> UiResponse {
        let mut state = UserWorkflowState::default();
        let response = match self.definition.first_step_key() {
            Some(first) => {
                let first = first.to_string();
                info!(user = %user, step = %first, "workflow started");
                state.pointer = StepPointer::AtStep(first.clone());
                render(&self.definition, &mut state, &first, None)
            }
            None => {
                warn!(user = %user, workflow = self.definition.name(), "workflow has no steps");
                state.pointer = StepPointer::Ended;
                UiResponse::Terminal(TerminalView {
                    text: COMPLETED_TEXT.to_string(),
                    selections: BTreeMap::new(),
                })
            }
        };
        self.store.put(user, state);
        response
    }

    /// Processes one button activation and returns the next UI to present.
    pub fn activate(&mut self, user: &UserId, token: &str) -> UiResponse {
        let mut state = self.store.get(user).unwrap_or_default();
        let response = self.process(user, &mut state, token);
        self.store.put(user, state);
        response
    }

    /// Detached snapshot of everything the user has selected so far.
    pub fn selections(&self, user: &UserId) -> BTreeMap<String, SelectionValue> {
        self.store
            .get(user)
            .map(|state| state.selections_snapshot())
            .unwrap_or_default()
    }

    pub fn reset(&mut self, user: &UserId) {
        info!(user = %user, "user workflow state reset");
        self.store.delete(user);
    }

    fn process(&self, user: &UserId, state: &mut UserWorkflowState, token: &str) -> UiResponse {
        let current = match &state.pointer {
            StepPointer::AtStep(step) => step.clone(),
            StepPointer::Ended => {
                debug!(user = %user, "activation after workflow end; re-rendering summary");
                return self.terminal(state);
            }
            StepPointer::NotStarted => {
                warn!(user = %user, token, "activation without an active step; resetting state");
                return Self::lost_state(state);
            }
        };
        if self.definition.step(&current).is_none() {
            warn!(
                user = %user,
                step = %current,
                "current step is not declared in the definition; resetting state"
            );
            return Self::lost_state(state);
        }

        let activation = match Activation::parse(token) {
            Ok(activation) => activation,
            Err(err) => {
                warn!(user = %user, error = %err, "malformed activation token");
                return render(&self.definition, state, &current, Some(INTERNAL_ERROR_TEXT));
            }
        };

        // A token minted for a superseded step is expected under double
        // clicks; re-render the real current step without complaint.
        if activation.step() != current {
            debug!(
                user = %user,
                claimed = activation.step(),
                actual = %current,
                "stale activation ignored"
            );
            return render(&self.definition, state, &current, None);
        }

        match activation {
            Activation::Back { .. } => match previous_step_key(&self.definition, &current) {
                Ok(Some(previous)) => {
                    let previous = previous.to_string();
                    debug!(user = %user, from = %current, to = %previous, "navigated back");
                    state.pointer = StepPointer::AtStep(previous.clone());
                    render(&self.definition, state, &previous, None)
                }
                Ok(None) => render(&self.definition, state, &current, None),
                Err(err) => {
                    warn!(user = %user, error = %err, "back navigation from unknown step");
                    Self::lost_state(state)
                }
            },
            Activation::Done { .. } => {
                if can_complete(&self.definition, state, &current) {
                    self.advance(user, state, &current, 0)
                } else {
                    debug!(user = %user, step = %current, "manual completion validation failed");
                    render(
                        &self.definition,
                        state,
                        &current,
                        Some(VALIDATION_WARNING_TEXT),
                    )
                }
            }
            Activation::Button { row, column, .. } => {
                self.press_button(user, state, &current, row, column)
            }
        }
    }

    fn press_button(
        &self,
        user: &UserId,
        state: &mut UserWorkflowState,
        current: &str,
        row: usize,
        column: usize,
    ) -> UiResponse {
        let Some(step) = self.definition.step(current) else {
            return Self::lost_state(state);
        };
        let Some(button) = step.options.get(row).and_then(|buttons| buttons.get(column)) else {
            warn!(
                user = %user,
                step = current,
                row,
                column,
                "activation indices out of declared bounds"
            );
            return render(&self.definition, state, current, Some(INTERNAL_ERROR_TEXT));
        };

        record_selection(state, current, button);
        match button.kind {
            ButtonKind::Finish => {
                info!(user = %user, step = current, "workflow finished by finish button");
                self.end(state)
            }
            ButtonKind::Skip => self.advance(user, state, current, button.skip_count),
            ButtonKind::Radio | ButtonKind::Checkbox | ButtonKind::Toggle => {
                render(&self.definition, state, current, None)
            }
            ButtonKind::Plain => {
                if step.completion_mode == CompletionMode::Auto {
                    self.advance(user, state, current, 0)
                } else {
                    debug!(
                        user = %user,
                        step = current,
                        "plain button in a manual step records a selection only"
                    );
                    render(&self.definition, state, current, None)
                }
            }
        }
    }

    fn advance(
        &self,
        user: &UserId,
        state: &mut UserWorkflowState,
        current: &str,
        skip: usize,
    ) -> UiResponse {
        match next_step_key(&self.definition, current, skip) {
            Ok(Some(next)) => {
                let next = next.to_string();
                debug!(user = %user, from = current, to = %next, skip, "advanced");
                state.pointer = StepPointer::AtStep(next.clone());
                render(&self.definition, state, &next, None)
            }
            Ok(None) => {
                info!(user = %user, step = current, "workflow ended");
                self.end(state)
            }
            Err(err) => {
                warn!(user = %user, error = %err, "advance from unknown step");
                Self::lost_state(state)
            }
        }
    }

    fn end(&self, state: &mut UserWorkflowState) -> UiResponse {
        state.pointer = StepPointer::Ended;
        self.terminal(state)
    }

    fn terminal(&self, state: &UserWorkflowState) -> UiResponse {
        UiResponse::Terminal(TerminalView {
            text: COMPLETED_TEXT.to_string(),
            selections: state.selections_snapshot(),
        })
    }

    fn lost_state(state: &mut UserWorkflowState) -> UiResponse {
        *state = UserWorkflowState::default();
        UiResponse::Terminal(TerminalView {
            text: STATE_LOST_TEXT.to_string(),
            selections: BTreeMap::new(),
        })
    }
}

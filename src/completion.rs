use crate::definition::{CompletionMode, WorkflowDefinition};
use crate::state::{SelectionValue, UserWorkflowState};
use tracing::debug;

/// Decides whether a step may be completed via its done control. Auto steps
/// and steps without radio groups always pass; otherwise every declared
/// radio group must have a recorded value. Checkbox and toggle selections
/// are never required.
pub fn can_complete(
    definition: &WorkflowDefinition,
    state: &UserWorkflowState,
    step_key: &str,
) -> bool {
    let Some(step) = definition.step(step_key) else {
        return false;
    };
    if step.completion_mode != CompletionMode::Manual {
        return true;
    }
    let required_groups = definition.radio_groups_for(step_key);
    if required_groups.is_empty() {
        return true;
    }

    let Some(SelectionValue::Radio(selected)) = state.selections.get(step_key) else {
        debug!(
            step = step_key,
            "manual step requires radio selections but none are recorded"
        );
        return false;
    };
    for group in required_groups {
        if !selected.contains_key(group) {
            debug!(step = step_key, group = %group, "missing selection for radio group");
            return false;
        }
    }
    true
}

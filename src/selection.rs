use crate::definition::{ButtonConfig, ButtonKind};
use crate::state::{SelectionValue, UserWorkflowState};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Applies one button activation to the step's recorded selection. Plain,
/// skip and finish buttons overwrite the slot with a single value; radio
/// sets its group, checkbox toggles membership, toggle flips a per-value
/// boolean. A slot holding a differently-shaped value is coerced to the
/// shape the activated button requires.
pub fn record_selection(state: &mut UserWorkflowState, step_key: &str, button: &ButtonConfig) {
    match button.kind {
        ButtonKind::Plain | ButtonKind::Skip | ButtonKind::Finish => {
            let Some(value) = button.value.as_ref() else {
                debug!(step = step_key, label = %button.label, "button has no value; nothing recorded");
                return;
            };
            state
                .selections
                .insert(step_key.to_string(), SelectionValue::Single(value.clone()));
            debug!(step = step_key, value = %value, "selection recorded");
        }
        ButtonKind::Radio => {
            let Some(group) = button.radio_group.as_ref() else {
                warn!(
                    step = step_key,
                    label = %button.label,
                    "radio button has no radio group; activation ignored"
                );
                return;
            };
            let Some(value) = button.value.as_ref() else {
                warn!(step = step_key, label = %button.label, "radio button has no value; activation ignored");
                return;
            };
            if !matches!(
                state.selections.get(step_key),
                Some(SelectionValue::Radio(_))
            ) {
                state
                    .selections
                    .insert(step_key.to_string(), SelectionValue::Radio(BTreeMap::new()));
            }
            if let Some(SelectionValue::Radio(groups)) = state.selections.get_mut(step_key) {
                groups.insert(group.clone(), value.clone());
                debug!(step = step_key, group = %group, value = %value, "radio selection recorded");
            }
        }
        ButtonKind::Checkbox => {
            let Some(value) = button.value.as_ref() else {
                warn!(step = step_key, label = %button.label, "checkbox has no value; activation ignored");
                return;
            };
            if !matches!(
                state.selections.get(step_key),
                Some(SelectionValue::Checkboxes(_))
            ) {
                state.selections.insert(
                    step_key.to_string(),
                    SelectionValue::Checkboxes(BTreeSet::new()),
                );
            }
            if let Some(SelectionValue::Checkboxes(values)) = state.selections.get_mut(step_key) {
                if values.remove(value) {
                    debug!(step = step_key, value = %value, "checkbox deselected");
                } else {
                    values.insert(value.clone());
                    debug!(step = step_key, value = %value, "checkbox selected");
                }
            }
        }
        ButtonKind::Toggle => {
            let Some(value) = button.value.as_ref() else {
                warn!(step = step_key, label = %button.label, "toggle has no value; activation ignored");
                return;
            };
            if !matches!(
                state.selections.get(step_key),
                Some(SelectionValue::Toggles(_))
            ) {
                state.selections.insert(
                    step_key.to_string(),
                    SelectionValue::Toggles(BTreeMap::new()),
                );
            }
            if let Some(SelectionValue::Toggles(states)) = state.selections.get_mut(step_key) {
                let current = states
                    .get(value)
                    .copied()
                    .unwrap_or(button.initial_toggle_state);
                states.insert(value.clone(), !current);
                debug!(step = step_key, value = %value, on = !current, "toggle flipped");
            }
        }
    }
}

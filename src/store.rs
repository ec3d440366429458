use crate::state::{UserId, UserWorkflowState};
use std::collections::BTreeMap;

/// Per-user state storage. The engine reads a user's state before each
/// activation and writes it back after; implementations may keep state in
/// memory, in an external cache, or in a durable store.
pub trait StateStore {
    fn get(&self, user: &UserId) -> Option<UserWorkflowState>;
    fn put(&mut self, user: &UserId, state: UserWorkflowState);
    fn delete(&mut self, user: &UserId);
}

impl<S: StateStore> StateStore for &mut S {
    fn get(&self, user: &UserId) -> Option<UserWorkflowState> {
        (**self).get(user)
    }

    fn put(&mut self, user: &UserId, state: UserWorkflowState) {
        (**self).put(user, state)
    }

    fn delete(&mut self, user: &UserId) {
        (**self).delete(user)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: BTreeMap<UserId, UserWorkflowState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, user: &UserId) -> Option<UserWorkflowState> {
        self.states.get(user).cloned()
    }

    fn put(&mut self, user: &UserId, state: UserWorkflowState) {
        self.states.insert(user.clone(), state);
    }

    fn delete(&mut self, user: &UserId) {
        self.states.remove(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SelectionValue, UserWorkflowState};

    #[test]
    fn put_get_delete_round_trip() {
        let mut store = InMemoryStateStore::new();
        let user = UserId::from("42");
        assert!(store.get(&user).is_none());

        let mut state = UserWorkflowState::at_step("intro");
        state
            .selections
            .insert("intro".to_string(), SelectionValue::Single("a".to_string()));
        store.put(&user, state.clone());
        assert_eq!(store.get(&user), Some(state));
        assert_eq!(store.len(), 1);

        store.delete(&user);
        assert!(store.get(&user).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn users_are_isolated() {
        let mut store = InMemoryStateStore::new();
        store.put(&UserId::from("a"), UserWorkflowState::at_step("one"));
        store.put(&UserId::from("b"), UserWorkflowState::at_step("two"));

        store.delete(&UserId::from("a"));
        assert_eq!(
            store
                .get(&UserId::from("b"))
                .and_then(|state| state.current_step().map(str::to_string)),
            Some("two".to_string())
        );
    }
}

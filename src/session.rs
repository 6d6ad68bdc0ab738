//! Session State Module
//! Interaction state for one dashboard session: which detail popovers are
//! open, the drafts typed into them and the last send result.

use std::collections::HashMap;

/// Identifies one recommendation card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PopupKey {
    pub module: String,
    pub action: String,
}

impl PopupKey {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
        }
    }

    /// Stable string id, used for widget ids.
    pub fn id(&self) -> String {
        format!("popup_{}_{}", self.module, self.action)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopoverState {
    pub open: bool,
    pub instructions: String,
    pub team: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Sent(String),
    Failed(String),
}

impl StatusMessage {
    pub fn for_result(action: &str, success: bool) -> Self {
        if success {
            StatusMessage::Sent(format!("Immediate action sent for '{action}'."))
        } else {
            StatusMessage::Failed(format!(
                "Failed to send the immediate action for '{action}'. Check your configuration."
            ))
        }
    }

    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Sent(text) | StatusMessage::Failed(text) => text,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    popovers: HashMap<PopupKey, PopoverState>,
    status: Option<StatusMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the popover for `key` and return the new visibility.
    pub fn toggle(&mut self, key: &PopupKey) -> bool {
        let state = self.popover_mut(key);
        state.open = !state.open;
        state.open
    }

    pub fn is_open(&self, key: &PopupKey) -> bool {
        self.popovers.get(key).is_some_and(|p| p.open)
    }

    /// Hide the popover. The draft stays so reopening shows it again.
    pub fn close(&mut self, key: &PopupKey) {
        if let Some(state) = self.popovers.get_mut(key) {
            state.open = false;
        }
    }

    pub fn popover(&self, key: &PopupKey) -> Option<&PopoverState> {
        self.popovers.get(key)
    }

    pub fn popover_mut(&mut self, key: &PopupKey) -> &mut PopoverState {
        self.popovers.entry(key.clone()).or_default()
    }

    pub fn open_popovers(&self) -> Vec<PopupKey> {
        self.popovers
            .iter()
            .filter(|(_, state)| state.open)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Remove and return the pending status. It is shown once.
    pub fn take_status(&mut self) -> Option<StatusMessage> {
        self.status.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_visibility_per_key() {
        let mut session = SessionState::new();
        let weight = PopupKey::new("Quantitative", "By Weight");
        let brand = PopupKey::new("Qualitative", "By Brand");

        assert!(!session.is_open(&weight));
        assert!(session.toggle(&weight));
        assert!(session.is_open(&weight));
        assert!(!session.is_open(&brand));

        assert!(!session.toggle(&weight));
        assert!(!session.is_open(&weight));
    }

    #[test]
    fn same_action_in_different_modules_is_distinct() {
        let mut session = SessionState::new();
        let a = PopupKey::new("M1", "Shared");
        let b = PopupKey::new("M2", "Shared");

        session.toggle(&a);
        assert!(session.is_open(&a));
        assert!(!session.is_open(&b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn close_keeps_draft() {
        let mut session = SessionState::new();
        let key = PopupKey::new("M", "A");
        session.toggle(&key);
        session.popover_mut(&key).instructions = "weekly update".into();
        session.popover_mut(&key).team = 2;

        session.close(&key);
        assert!(!session.is_open(&key));
        assert!(session.open_popovers().is_empty());

        let state = session.popover(&key).unwrap();
        assert_eq!(state.instructions, "weekly update");
        assert_eq!(state.team, 2);
    }

    #[test]
    fn status_is_shown_once() {
        let mut session = SessionState::new();
        session.set_status(StatusMessage::for_result("Push", true));

        assert_eq!(
            session.status().map(StatusMessage::text),
            Some("Immediate action sent for 'Push'.")
        );
        assert!(matches!(session.take_status(), Some(StatusMessage::Sent(_))));
        assert!(session.take_status().is_none());
    }

    #[test]
    fn failure_status_text() {
        let status = StatusMessage::for_result("Push", false);
        assert_eq!(
            status.text(),
            "Failed to send the immediate action for 'Push'. Check your configuration."
        );
    }
}

//! Hot/active/focus bookkeeping for the immediate-mode GUI
//!
//! A widget is *hot* while the pointer is over it and *active* in the one
//! frame it gets triggered. Triggering by pointer requires the widget to have
//! been hot in the previous frame as well, so a click that lands on a widget
//! which only appeared this frame does nothing.
//!
//! Keyboard focus is a separate cursor over the focusable widgets, in the
//! order they are called. It survives between frames because widget ids are
//! stable from one frame to the next.

use std::collections::HashSet;

use log::warn;

use crate::input::KeyAction;

pub type WidgetId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    /// No widget has keyboard focus
    Unset,
    /// The next focusable widget takes focus (after Down)
    Advance,
    On(WidgetId),
}

/// What keyboard navigation did to one widget this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigation {
    pub focused: bool,
    /// Focus moved away from this widget by Up/Down
    pub left: bool,
    /// Select was pressed while this widget had focus
    pub confirmed: bool,
}

#[derive(Debug)]
pub struct WidgetState {
    hot: Option<WidgetId>,
    previous_hot: Option<WidgetId>,
    active: Option<WidgetId>,
    held: Option<WidgetId>,
    focus: Focus,
    last_widget: Option<WidgetId>,
    previous_last_widget: Option<WidgetId>,
    pending_key: Option<KeyAction>,
    seen: HashSet<WidgetId>,
    duplicates: u32,
    inactive: bool,
}

impl WidgetState {
    pub fn new() -> Self {
        WidgetState {
            hot: None,
            previous_hot: None,
            active: None,
            held: None,
            focus: Focus::Unset,
            last_widget: None,
            previous_last_widget: None,
            pending_key: None,
            seen: HashSet::new(),
            duplicates: 0,
            inactive: false,
        }
    }

    /// Starts a frame: rolls hot over to previous-hot and forgets the
    /// per-frame registrations
    pub fn begin(&mut self, key: Option<KeyAction>, pointer_held: bool) {
        self.previous_hot = self.hot.take();
        self.active = None;
        self.previous_last_widget = self.last_widget.take();
        self.pending_key = key;
        self.seen.clear();
        if !pointer_held {
            self.held = None;
        }
    }

    /// Records that `id` was used this frame. Returns false for a duplicate.
    pub fn register(&mut self, id: WidgetId) -> bool {
        if self.seen.insert(id) {
            return true;
        }
        self.duplicates += 1;
        warn!("GUI widget id {} used more than once in one frame", id);
        false
    }

    /// Marks `id` hot when the pointer is inside it. Later calls win.
    pub fn hover(&mut self, id: WidgetId, inside: bool) -> bool {
        if self.inactive || !inside {
            return false;
        }
        self.hot = Some(id);
        true
    }

    /// Makes `id` the active widget of this frame if `fired` and no other
    /// widget got there first
    pub fn trigger(&mut self, id: WidgetId, fired: bool) -> bool {
        if self.inactive || !fired || self.active.is_some() {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Pointer trigger: a release while the widget is hot now and was hot
    /// in the previous frame
    pub fn pointer_trigger(&mut self, id: WidgetId, hot: bool, released: bool) -> bool {
        let fired = released && hot && self.previous_hot == Some(id);
        self.trigger(id, fired)
    }

    /// Pointer drag capture. The widget pressed on keeps the drag until the
    /// button goes up, even when the pointer leaves it.
    pub fn hold(&mut self, id: WidgetId, hot: bool, pointer_held: bool) -> bool {
        if self.inactive || !pointer_held {
            return false;
        }
        if hot && self.held.is_none() {
            self.held = Some(id);
        }
        self.held == Some(id)
    }

    /// Runs keyboard navigation for a focusable widget. Must be called once
    /// per focusable widget, in drawing order.
    pub fn navigate(&mut self, id: WidgetId) -> Navigation {
        let mut navigation = Navigation::default();
        if !self.inactive {
            if self.focus == Focus::Advance {
                self.focus = Focus::On(id);
            }
            match (self.focus, self.pending_key) {
                (Focus::Unset, Some(KeyAction::Down)) => {
                    self.focus = Focus::On(id);
                    self.pending_key = None;
                }
                (Focus::Unset, Some(KeyAction::Up)) => {
                    if let Some(last) = self.previous_last_widget {
                        self.focus = Focus::On(last);
                        self.pending_key = None;
                    }
                }
                (Focus::On(focused), Some(KeyAction::Down)) if focused == id => {
                    self.focus = Focus::Advance;
                    self.pending_key = None;
                    navigation.left = true;
                }
                (Focus::On(focused), Some(KeyAction::Up)) if focused == id => {
                    let previous = self.last_widget.or(self.previous_last_widget).unwrap_or(id);
                    self.focus = Focus::On(previous);
                    self.pending_key = None;
                    navigation.left = previous != id;
                }
                (Focus::On(focused), Some(KeyAction::Select)) if focused == id => {
                    self.pending_key = None;
                    navigation.confirmed = true;
                }
                _ => {}
            }
            navigation.focused = self.focus == Focus::On(id);
        }
        self.last_widget = Some(id);
        navigation
    }

    /// Hands the pending key to the focused widget if it is one of `keys`,
    /// consuming it
    pub fn take_key(&mut self, id: WidgetId, keys: &[KeyAction]) -> Option<KeyAction> {
        if self.inactive || self.focus != Focus::On(id) {
            return None;
        }
        let key = self.pending_key.filter(|key| keys.contains(key))?;
        self.pending_key = None;
        Some(key)
    }

    pub fn set_focus(&mut self, id: WidgetId) {
        self.focus = Focus::On(id);
    }

    /// Clears keyboard focus and any drag in progress
    pub fn reset_selection(&mut self) {
        self.focus = Focus::Unset;
        self.held = None;
    }

    pub fn set_inactive(&mut self, inactive: bool) {
        self.inactive = inactive;
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    #[cfg(test)]
    pub fn hot(&self) -> Option<WidgetId> {
        self.hot
    }

    pub fn active(&self) -> Option<WidgetId> {
        self.active
    }

    pub fn focused(&self) -> Option<WidgetId> {
        match self.focus {
            Focus::On(id) => Some(id),
            _ => None,
        }
    }

    pub fn duplicate_ids(&self) -> u32 {
        self.duplicates
    }
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One frame with a single button-like widget
    fn frame(state: &mut WidgetState, id: WidgetId, inside: bool, released: bool) -> bool {
        state.begin(None, false);
        state.register(id);
        let hot = state.hover(id, inside);
        state.pointer_trigger(id, hot, released)
    }

    #[test]
    fn test_no_input_keeps_active_unchanged() {
        let mut state = WidgetState::new();
        frame(&mut state, 1, true, false);
        let before = state.active();
        frame(&mut state, 1, true, false);
        assert_eq!(state.active(), before);
        assert_eq!(state.active(), None);
    }

    #[test]
    fn test_release_triggers_once() {
        let mut state = WidgetState::new();
        frame(&mut state, 7, true, false);
        assert_eq!(state.hot(), Some(7));

        assert!(frame(&mut state, 7, true, true));
        assert_eq!(state.active(), Some(7));

        assert!(!frame(&mut state, 7, true, false));
        assert_eq!(state.active(), None);
    }

    #[test]
    fn test_release_needs_previous_hot() {
        let mut state = WidgetState::new();
        assert!(!frame(&mut state, 3, true, true));
        assert_eq!(state.active(), None);
    }

    #[test]
    fn test_only_one_active_per_frame() {
        let mut state = WidgetState::new();
        for released in [false, true] {
            state.begin(None, false);
            for id in [1, 2] {
                state.register(id);
                let hot = state.hover(id, true);
                state.pointer_trigger(id, hot, released);
            }
        }
        // Both overlap; only the previous-frame hot (the last one) triggers
        assert_eq!(state.active(), Some(2));
    }

    #[test]
    fn test_duplicate_ids_counted() {
        let mut state = WidgetState::new();
        state.begin(None, false);
        assert!(state.register(4));
        assert!(!state.register(4));
        assert_eq!(state.duplicate_ids(), 1);

        state.begin(None, false);
        assert!(state.register(4));
        assert_eq!(state.duplicate_ids(), 1);
    }

    fn navigate_frame(state: &mut WidgetState, key: Option<KeyAction>, ids: &[WidgetId]) -> Vec<Navigation> {
        state.begin(key, false);
        ids.iter().map(|&id| state.navigate(id)).collect()
    }

    #[test]
    fn test_focus_moves_down_and_wraps() {
        let mut state = WidgetState::new();
        let ids = [10, 11, 12];
        navigate_frame(&mut state, None, &ids);
        assert_eq!(state.focused(), None);

        navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        assert_eq!(state.focused(), Some(10));

        let nav = navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        assert!(nav[0].left);
        assert!(nav[1].focused);
        assert_eq!(state.focused(), Some(11));

        navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        // Off the end: the first widget picks it up on the next frame
        assert_eq!(state.focused(), None);
        navigate_frame(&mut state, None, &ids);
        assert_eq!(state.focused(), Some(10));
    }

    #[test]
    fn test_focus_moves_up_and_wraps() {
        let mut state = WidgetState::new();
        let ids = [1, 2, 3];
        navigate_frame(&mut state, None, &ids);
        navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        assert_eq!(state.focused(), Some(1));

        navigate_frame(&mut state, Some(KeyAction::Up), &ids);
        assert_eq!(state.focused(), Some(3));

        navigate_frame(&mut state, Some(KeyAction::Up), &ids);
        assert_eq!(state.focused(), Some(2));
    }

    #[test]
    fn test_select_confirms_focused_only() {
        let mut state = WidgetState::new();
        let ids = [1, 2];
        navigate_frame(&mut state, Some(KeyAction::Down), &ids);
        let nav = navigate_frame(&mut state, Some(KeyAction::Select), &ids);
        assert!(nav[0].confirmed);
        assert!(!nav[1].confirmed);
    }

    #[test]
    fn test_take_key_only_for_focused() {
        let mut state = WidgetState::new();
        navigate_frame(&mut state, Some(KeyAction::Down), &[1, 2]);
        state.begin(Some(KeyAction::Left), false);
        state.navigate(1);
        state.navigate(2);
        let arrows = [KeyAction::Left, KeyAction::Right];
        assert_eq!(state.take_key(2, &arrows), None);
        assert_eq!(state.take_key(1, &[KeyAction::Home]), None);
        assert_eq!(state.take_key(1, &arrows), Some(KeyAction::Left));
        assert_eq!(state.take_key(1, &arrows), None);
    }

    #[test]
    fn test_inactive_ignores_input() {
        let mut state = WidgetState::new();
        frame(&mut state, 1, true, false);
        state.set_inactive(true);
        assert!(!frame(&mut state, 1, true, true));
        assert_eq!(state.hot(), None);

        state.begin(Some(KeyAction::Down), false);
        assert!(!state.navigate(1).focused);
    }

    #[test]
    fn test_hold_keeps_drag_outside() {
        let mut state = WidgetState::new();
        state.begin(None, true);
        assert!(state.hold(5, true, true));
        state.begin(None, true);
        assert!(state.hold(5, false, true));
        assert!(!state.hold(6, true, true));
        state.begin(None, false);
        assert!(!state.hold(5, false, false));
    }

    #[test]
    fn test_reset_selection_clears_focus() {
        let mut state = WidgetState::new();
        navigate_frame(&mut state, Some(KeyAction::Down), &[1]);
        assert_eq!(state.focused(), Some(1));
        state.reset_selection();
        assert_eq!(state.focused(), None);
    }
}

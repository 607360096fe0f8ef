use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;
use callscope_types::LogLevel;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    FilterInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::CloseOverlay);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        // Line navigation
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::SelectDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::SelectDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::SelectUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::SelectUp(1));
        // Page navigation (less-style)
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation (less-style)
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::SelectTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::SelectBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::SelectTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::SelectBottom);
        // Row expansion
        log_viewer.insert(KeyBinding::new(KeyCode::Enter), Action::ToggleExpand);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::ToggleExpand);
        // Level toggles
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('1')),
            Action::ToggleLevel(LogLevel::Debug),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('2')),
            Action::ToggleLevel(LogLevel::Log),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('3')),
            Action::ToggleLevel(LogLevel::Warn),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('4')),
            Action::ToggleLevel(LogLevel::Error),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('5')),
            Action::ToggleLevel(LogLevel::default()),
        );
        log_viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::ToggleSortOrder);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('t')), Action::ToggleTimestamps);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        // Search
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearFilter);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('i')), Action::ToggleCaseSensitive);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('R')), Action::Reload);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Filter input bindings (when search bar is active)
        let mut filter_input = HashMap::new();
        filter_input.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyFilter);
        filter_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        filter_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        filter_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        filter_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::FilterInput, filter_input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context)
            && let Some(action) = context_bindings.get(&binding)
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in filter input mode
    /// Returns Some(Action) for special keys, None for regular character input
    pub fn get_filter_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // Check filter input bindings first
        if let Some(filter_bindings) = self.bindings.get(&KeyContext::FilterInput)
            && let Some(action) = filter_bindings.get(&binding)
        {
            return Some(action.clone());
        }

        // For regular characters, return SearchInput action
        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::SearchInput(c));
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_log_viewer_bindings() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('3'), KeyModifiers::NONE)),
            Some(Action::ToggleLevel(LogLevel::Warn))
        );
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::ToggleExpand)
        );
    }

    #[test]
    fn test_falls_back_to_global() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('x'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn test_filter_input_captures_characters() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_filter_input_action(&key(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::SearchInput('q'))
        );
        assert_eq!(
            bindings.get_filter_input_action(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Action::SearchInput('A'))
        );
        assert_eq!(
            bindings.get_filter_input_action(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::ApplyFilter)
        );
        assert_eq!(
            bindings.get_filter_input_action(&key(KeyCode::Char('x'), KeyModifiers::ALT)),
            None
        );
    }
}

use crate::internal::ui::app::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Screen a binding applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBindingContext {
    Global,
    List,
    Detail,
}

/// Maps key events to actions, per context
#[derive(Debug, Clone, Default)]
pub struct KeyBindingMap {
    global: HashMap<KeyEvent, Action>,
    list: HashMap<KeyEvent, Action>,
    detail: HashMap<KeyEvent, Action>,
}

impl KeyBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn context_map(&self, context: KeyBindingContext) -> &HashMap<KeyEvent, Action> {
        match context {
            KeyBindingContext::Global => &self.global,
            KeyBindingContext::List => &self.list,
            KeyBindingContext::Detail => &self.detail,
        }
    }

    /// Context-specific bindings win over global ones
    pub fn get_action(&self, key: &KeyEvent, context: KeyBindingContext) -> Option<Action> {
        let key = normalize(key);
        self.context_map(context)
            .get(&key)
            .or_else(|| self.global.get(&key))
            .cloned()
    }

    pub fn add_binding(&mut self, context: KeyBindingContext, key: KeyEvent, action: Action) {
        let map = match context {
            KeyBindingContext::Global => &mut self.global,
            KeyBindingContext::List => &mut self.list,
            KeyBindingContext::Detail => &mut self.detail,
        };
        map.insert(normalize(&key), action);
    }

    /// Merge custom keybindings from configuration
    pub fn merge_config(&mut self, config: &crate::config::KeyBindingConfig) {
        let mut merge = |ctx: KeyBindingContext, bindings: &HashMap<String, Action>| {
            for (key_str, action) in bindings {
                match parse_key_str(key_str) {
                    Some(key_event) => self.add_binding(ctx, key_event, action.clone()),
                    None => tracing::warn!("Invalid key string in config: {}", key_str),
                }
            }
        };

        merge(KeyBindingContext::Global, &config.global);
        merge(KeyBindingContext::List, &config.list);
        merge(KeyBindingContext::Detail, &config.detail);
    }

    /// Bindings for one context (without the global fallback), as display strings.
    pub fn describe(&self, context: KeyBindingContext) -> Vec<(String, Action)> {
        let mut entries: Vec<_> = self
            .context_map(context)
            .iter()
            .map(|(key, action)| (format_key(key), action.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Terminals report kind/state differently; only code and modifiers matter.
/// Shift is dropped for plain characters since the char already carries it.
fn normalize(key: &KeyEvent) -> KeyEvent {
    let mut modifiers = key.modifiers;
    if let KeyCode::Char(_) = key.code {
        modifiers.remove(KeyModifiers::SHIFT);
    }
    KeyEvent::new(key.code, modifiers)
}

/// Parse a key string into a KeyEvent
/// Supported formats:
/// - Single char: "j", "k", "1"
/// - Special keys: "Enter", "Tab", "Esc", "Up", "Down", "Left", "Right"
/// - With modifiers: "Ctrl+r", "Shift+Tab"
pub fn parse_key_str(key_str: &str) -> Option<KeyEvent> {
    let parts: Vec<&str> = key_str.split('+').collect();
    let (key_part, modifier_parts) = parts.split_last()?;

    let mut modifiers = KeyModifiers::empty();
    for modifier in modifier_parts {
        match modifier.to_lowercase().as_str() {
            "ctrl" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let code = match *key_part {
        "Enter" => KeyCode::Enter,
        "Tab" => KeyCode::Tab,
        "Esc" => KeyCode::Esc,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };

    Some(KeyEvent::new(code, modifiers))
}

pub fn format_key(key: &KeyEvent) -> String {
    let mut out = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        out.push_str("Ctrl+");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        out.push_str("Alt+");
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        out.push_str("Shift+");
    }
    match key.code {
        KeyCode::Char(c) => out.push(c),
        other => out.push_str(&format!("{:?}", other)),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_char() {
        let key = parse_key_str("j").unwrap();
        assert_eq!(key.code, KeyCode::Char('j'));
        assert_eq!(key.modifiers, KeyModifiers::empty());
    }

    #[test]
    fn test_parse_hangul_char() {
        let key = parse_key_str("ㄱ").unwrap();
        assert_eq!(key.code, KeyCode::Char('ㄱ'));
    }

    #[test]
    fn test_parse_with_modifier() {
        let key = parse_key_str("Ctrl+r").unwrap();
        assert_eq!(key.code, KeyCode::Char('r'));
        assert!(key.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_key_str("Hyper+x").is_none());
        assert!(parse_key_str("Space bar").is_none());
        assert!(parse_key_str("").is_none());
    }

    #[test]
    fn test_global_fallback() {
        let mut map = KeyBindingMap::new();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::empty());
        map.add_binding(KeyBindingContext::Global, key, Action::Quit);

        assert!(matches!(
            map.get_action(&key, KeyBindingContext::Detail),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn test_context_override() {
        let mut map = KeyBindingMap::new();
        let key = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::empty());
        map.add_binding(KeyBindingContext::Global, key, Action::ToggleHelp);
        map.add_binding(KeyBindingContext::List, key, Action::Refresh);

        assert!(matches!(
            map.get_action(&key, KeyBindingContext::List),
            Some(Action::Refresh)
        ));
        assert!(matches!(
            map.get_action(&key, KeyBindingContext::Detail),
            Some(Action::ToggleHelp)
        ));
    }

    #[test]
    fn test_shifted_char_matches_plain_binding() {
        let mut map = KeyBindingMap::new();
        map.add_binding(
            KeyBindingContext::List,
            KeyEvent::new(KeyCode::Char('H'), KeyModifiers::empty()),
            Action::CollectHistorical,
        );
        let pressed = KeyEvent::new(KeyCode::Char('H'), KeyModifiers::SHIFT);
        assert!(matches!(
            map.get_action(&pressed, KeyBindingContext::List),
            Some(Action::CollectHistorical)
        ));
    }

    #[test]
    fn test_merge_config_overrides_defaults() {
        let mut map = crate::internal::ui::keybindings_default::create_default_keybindings();
        let mut config = crate::config::KeyBindingConfig::default();
        config.list.insert("x".to_string(), Action::ClearFilters);
        config.list.insert("Bogus+x".to_string(), Action::Quit);
        map.merge_config(&config);

        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty());
        assert!(matches!(
            map.get_action(&key, KeyBindingContext::List),
            Some(Action::ClearFilters)
        ));
    }
}

//! Keyboard shortcuts stored as text such as `Ctrl+Shift+S`.

use eframe::egui::{self, Key, KeyboardShortcut, Modifiers};

pub fn parse_shortcut(text: &str) -> Option<KeyboardShortcut> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut modifiers = Modifiers::NONE;
    let mut key = None;
    for part in text.split('+').map(str::trim) {
        match part.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers = modifiers | Modifiers::CTRL,
            "shift" => modifiers = modifiers | Modifiers::SHIFT,
            "alt" | "option" => modifiers = modifiers | Modifiers::ALT,
            "cmd" | "command" | "meta" => modifiers = modifiers | Modifiers::MAC_CMD,
            _ => {
                if key.is_some() {
                    return None;
                }
                key = Some(parse_key(part)?);
            }
        }
    }
    key.map(|key| KeyboardShortcut::new(modifiers, key))
}

fn parse_key(name: &str) -> Option<Key> {
    Key::from_name(name).or_else(|| Key::from_name(&name.to_uppercase()))
}

pub fn shortcut_text(modifiers: Modifiers, key: Key) -> String {
    let mut parts = Vec::new();
    if modifiers.ctrl {
        parts.push("Ctrl");
    }
    if modifiers.alt {
        parts.push("Alt");
    }
    if modifiers.shift {
        parts.push("Shift");
    }
    if modifiers.mac_cmd {
        parts.push("Cmd");
    }
    parts.push(key.name());
    parts.join("+")
}

/// The first key pressed this frame, formatted for storage. Escape is ignored so
/// it can cancel recording.
pub fn captured_shortcut(ctx: &egui::Context) -> Option<String> {
    ctx.input(|input| {
        input.events.iter().find_map(|event| match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } if *key != Key::Escape => Some(shortcut_text(*modifiers, *key)),
            _ => None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_combinations() {
        assert_eq!(
            parse_shortcut("Ctrl+Shift+S"),
            Some(KeyboardShortcut::new(Modifiers::CTRL | Modifiers::SHIFT, Key::S))
        );
        assert_eq!(
            parse_shortcut(" alt + F5 "),
            Some(KeyboardShortcut::new(Modifiers::ALT, Key::F5))
        );
        assert_eq!(
            parse_shortcut("Space"),
            Some(KeyboardShortcut::new(Modifiers::NONE, Key::Space))
        );
    }

    #[test]
    fn rejects_incomplete_or_unknown_shortcuts() {
        assert_eq!(parse_shortcut(""), None);
        assert_eq!(parse_shortcut("Ctrl+Shift"), None);
        assert_eq!(parse_shortcut("Ctrl+NotAKey"), None);
        assert_eq!(parse_shortcut("A+B"), None);
    }

    #[test]
    fn formatted_shortcuts_parse_back() {
        let text = shortcut_text(Modifiers::CTRL | Modifiers::ALT, Key::K);
        assert_eq!(text, "Ctrl+Alt+K");
        assert_eq!(
            parse_shortcut(&text),
            Some(KeyboardShortcut::new(Modifiers::CTRL | Modifiers::ALT, Key::K))
        );
    }
}

// Terminal-independent key model and the `<name>` sequence notation

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Tab,
    Backspace,
    Delete,
    Home,
    End,
}

impl NamedKey {
    pub fn name(&self) -> &'static str {
        match self {
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::Enter => "enter",
            NamedKey::Esc => "esc",
            NamedKey::Tab => "tab",
            NamedKey::Backspace => "backspace",
            NamedKey::Delete => "del",
            NamedKey::Home => "home",
            NamedKey::End => "end",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "enter" | "return" | "cr" => NamedKey::Enter,
            "esc" | "escape" => NamedKey::Esc,
            "tab" => NamedKey::Tab,
            "backspace" | "bs" => NamedKey::Backspace,
            "del" | "delete" => NamedKey::Delete,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            _ => return None,
        })
    }
}

/// One key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    /// Ctrl + letter, stored lowercase
    Ctrl(char),
    Named(NamedKey),
}

impl Key {
    pub fn ctrl(c: char) -> Self {
        Key::Ctrl(c.to_ascii_lowercase())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char('<') => write!(f, "<lt>"),
            Key::Char(' ') => write!(f, "<space>"),
            Key::Char(c) => write!(f, "{}", c),
            Key::Ctrl(c) => write!(f, "<C-{}>", c),
            Key::Named(named) => write!(f, "<{}>", named.name()),
        }
    }
}

/// Render a sequence in the same notation `parse_sequence` reads.
pub fn format_sequence(keys: &[Key]) -> String {
    keys.iter().map(|k| k.to_string()).collect()
}

/// Parse a key sequence such as `dd`, `<up>`, `<C-s>` or `g<enter>`.
pub fn parse_sequence(input: &str) -> Result<Vec<Key>, String> {
    let mut keys = Vec::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            keys.push(Key::Char(c));
            continue;
        }

        let mut name = String::new();
        let mut closed = false;
        for n in chars.by_ref() {
            if n == '>' {
                closed = true;
                break;
            }
            name.push(n);
        }
        if !closed {
            return Err(format!("unterminated key name in {:?}", input));
        }
        keys.push(parse_key_name(&name).ok_or_else(|| format!("unknown key <{}>", name))?);
    }

    if keys.is_empty() {
        return Err("empty key sequence".to_string());
    }
    Ok(keys)
}

fn parse_key_name(name: &str) -> Option<Key> {
    let lower = name.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("c-") {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Key::ctrl(c)),
            _ => None,
        };
    }
    match lower.as_str() {
        "lt" => Some(Key::Char('<')),
        "space" => Some(Key::Char(' ')),
        _ => NamedKey::from_name(&lower).map(Key::Named),
    }
}

//! Key names recognized in macro combos and swap maps.
//!
//! Names are case-insensitive. Single letters and digits stand for themselves,
//! `f1`..`f24` are function keys, and a fixed table covers the named keys
//! (with a few common aliases such as `esc`, `ctrl`, `win`).
//!
//! A key stroke is a key name with an optional direction suffix:
//! `w_down` presses, `w_up` releases, bare `w` clicks.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A recognized keyboard key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// `a`..`z` and `0`..`9`.
    Char(char),
    /// `f1`..`f24`.
    Function(u8),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
}

/// Named keys; the first entry for a key is its canonical spelling.
const NAMED_KEYS: &[(&str, Key)] = &[
    ("space", Key::Space),
    ("enter", Key::Enter),
    ("return", Key::Enter),
    ("tab", Key::Tab),
    ("escape", Key::Escape),
    ("esc", Key::Escape),
    ("backspace", Key::Backspace),
    ("delete", Key::Delete),
    ("del", Key::Delete),
    ("insert", Key::Insert),
    ("home", Key::Home),
    ("end", Key::End),
    ("pageup", Key::PageUp),
    ("pgup", Key::PageUp),
    ("pagedown", Key::PageDown),
    ("pgdn", Key::PageDown),
    ("up", Key::Up),
    ("down", Key::Down),
    ("left", Key::Left),
    ("right", Key::Right),
    ("shift", Key::Shift),
    ("ctrl", Key::Control),
    ("control", Key::Control),
    ("alt", Key::Alt),
    ("meta", Key::Meta),
    ("super", Key::Meta),
    ("win", Key::Meta),
    ("capslock", Key::CapsLock),
];

/// Error produced when a key name or stroke cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("empty key name")]
    Empty,
}

impl FromStr for Key {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Ok(Key::Char(c));
            }
        }

        if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=24).contains(&n) {
                return Ok(Key::Function(n));
            }
        }

        NAMED_KEYS
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, key)| *key)
            .ok_or_else(|| KeyParseError::UnknownKey(s.trim().to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Function(n) => write!(f, "f{n}"),
            named => {
                let name = NAMED_KEYS
                    .iter()
                    .find(|(_, key)| key == named)
                    .map_or("?", |(alias, _)| *alias);
                f.write_str(name)
            }
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What happens to a key in a stroke.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    /// `<key>_down`
    Press,
    /// `<key>_up`
    Release,
    /// bare `<key>`: press then release.
    Click,
}

/// A single key with a direction, e.g. `w_down`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub key: Key,
    pub direction: KeyDirection,
}

impl FromStr for KeyStroke {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if let Some((name, suffix)) = token.rsplit_once('_') {
            let direction = match suffix.to_ascii_lowercase().as_str() {
                "down" => Some(KeyDirection::Press),
                "up" => Some(KeyDirection::Release),
                _ => None,
            };
            if let Some(direction) = direction {
                return Ok(KeyStroke {
                    key: name.parse()?,
                    direction,
                });
            }
        }
        Ok(KeyStroke {
            key: token.parse()?,
            direction: KeyDirection::Click,
        })
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            KeyDirection::Press => write!(f, "{}_down", self.key),
            KeyDirection::Release => write!(f, "{}_up", self.key),
            KeyDirection::Click => write!(f, "{}", self.key),
        }
    }
}

/// A comma-joined group of strokes applied together, e.g. `w_down,s_down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo(pub Vec<KeyStroke>);

impl KeyCombo {
    pub fn strokes(&self) -> &[KeyStroke] {
        &self.0
    }
}

impl FromStr for KeyCombo {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::parse::<KeyStroke>)
            .collect::<Result<Vec<_>, _>>()
            .map(KeyCombo)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stroke) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{stroke}")?;
        }
        Ok(())
    }
}

impl Serialize for KeyCombo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

//! DOM events delivered to components

use std::fmt;
use std::str::FromStr;

use super::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    KeyDown,
    Input,
    Submit,
    MouseEnter,
    MouseLeave,
}

/// Keyboard key, named after `KeyboardEvent.key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Tab,
    Enter,
    Other(String),
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Tab" => Key::Tab,
            "Enter" => Key::Enter,
            other => Key::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Escape => f.write_str("Escape"),
            Key::ArrowLeft => f.write_str("ArrowLeft"),
            Key::ArrowRight => f.write_str("ArrowRight"),
            Key::Tab => f.write_str("Tab"),
            Key::Enter => f.write_str("Enter"),
            Key::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    pub key: Option<Key>,
    pub shift_key: bool,
    default_prevented: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            shift_key: false,
            default_prevented: false,
        }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventKind::KeyDown, target)
        }
    }

    /// Shift+Tab and friends
    pub fn key_down_shifted(target: NodeId, key: Key) -> Self {
        Self {
            shift_key: true,
            ..Self::key_down(target, key)
        }
    }

    pub fn input(target: NodeId) -> Self {
        Self::new(EventKind::Input, target)
    }

    pub fn submit(form: NodeId) -> Self {
        Self::new(EventKind::Submit, form)
    }

    pub fn mouse_enter(target: NodeId) -> Self {
        Self::new(EventKind::MouseEnter, target)
    }

    pub fn mouse_leave(target: NodeId) -> Self {
        Self::new(EventKind::MouseLeave, target)
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

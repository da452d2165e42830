//! Colour theme preference
//!
//! A stored preference always wins; without one the system preference
//! decides. The active theme is exposed as `data-theme` on the root element.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::config::Storage;
use crate::constants::storage::THEME_KEY;
use crate::dom::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => bail!("unknown theme '{other}', expected 'dark' or 'light'"),
        }
    }
}

/// The stored theme, if one is set and recognised
pub fn stored(storage: &Storage) -> Option<Theme> {
    let raw = storage.get_string(THEME_KEY)?;
    raw.parse()
        .inspect_err(|e| warn!(value = raw, error = %e, "ignoring stored theme"))
        .ok()
}

pub fn resolve(storage: &Storage, prefers_dark: bool) -> Theme {
    stored(storage).unwrap_or_else(|| Theme::from_system(prefers_dark))
}

pub fn apply(doc: &mut Document, theme: Theme) {
    let root = doc.root();
    doc.set_attr(root, "data-theme", theme.as_str());
    debug!(theme = theme.as_str(), "theme applied");
}

/// Resolve and apply the theme on page init
pub fn setup(doc: &mut Document, storage: &Storage, prefers_dark: bool) -> Theme {
    let theme = resolve(storage, prefers_dark);
    apply(doc, theme);
    theme
}

/// Follow a system preference change unless the user picked a theme
pub fn system_changed(doc: &mut Document, storage: &Storage, prefers_dark: bool) -> Option<Theme> {
    if stored(storage).is_some() {
        return None;
    }
    let theme = Theme::from_system(prefers_dark);
    apply(doc, theme);
    Some(theme)
}

/// Persist and apply an explicit choice
pub fn set_theme(doc: &mut Document, storage: &mut Storage, theme: Theme) -> Result<()> {
    storage
        .set(THEME_KEY, theme.as_str())
        .context(format!("Failed to persist theme '{theme}'"))?;
    apply(doc, theme);
    info!(theme = theme.as_str(), "theme set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir) -> Storage {
        Storage::open(dir.path().join("storage.json"))
    }

    #[test]
    fn test_system_preference_without_stored() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let mut doc = Document::new();
        assert_eq!(setup(&mut doc, &storage, true), Theme::Dark);
        assert_eq!(doc.attr(doc.root(), "data-theme"), Some("dark"));
        assert_eq!(system_changed(&mut doc, &storage, false), Some(Theme::Light));
        assert_eq!(doc.attr(doc.root(), "data-theme"), Some("light"));
    }

    #[test]
    fn test_stored_preference_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = storage(&dir);
        let mut doc = Document::new();
        set_theme(&mut doc, &mut storage, Theme::Light).unwrap();

        let reopened = Storage::open(storage.path());
        assert_eq!(reopened.get_string("theme"), Some("light"));
        assert_eq!(setup(&mut doc, &reopened, true), Theme::Light);
        assert_eq!(system_changed(&mut doc, &reopened, true), None);
        assert_eq!(doc.attr(doc.root(), "data-theme"), Some("light"));
    }

    #[test]
    fn test_unknown_stored_value_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = storage(&dir);
        storage.set("theme", "sepia").unwrap();
        assert_eq!(resolve(&storage, false), Theme::Light);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("azul".parse::<Theme>().is_err());
    }
}

//! Light/dark theme, persisted in the preference store.

use crate::document::PageQuery;
use crate::preferences::{PreferenceStore, THEME_KEY};
use anyhow::Result;
use tracing::{debug, info};

/// Body class enabling the light theme.
pub const LIGHT_CLASS: &str = "light";

pub const THEME_TOGGLE_ID: &str = "themeToggle";

const SUN_ICON: &str = "fa-sun";
const MOON_ICON: &str = "fa-moon";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Interpret a stored value: only `"light"` selects the light theme.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }

    /// The theme currently shown by the page.
    pub fn current<D: PageQuery + ?Sized>(doc: &D) -> Self {
        match doc.body() {
            Some(body) if doc.has_class(body, LIGHT_CLASS) => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Show this theme: body class plus the toggle button's icon.
    pub fn apply<D: PageQuery + ?Sized>(self, doc: &mut D) {
        let light = self == Theme::Light;

        match doc.body() {
            Some(body) => doc.set_class(body, LIGHT_CLASS, light),
            None => debug!("No body element, theme not applied"),
        }

        let icon = doc
            .element_by_id(THEME_TOGGLE_ID)
            .and_then(|toggle| doc.descendant_by_tag(toggle, "i"));
        if let Some(icon) = icon {
            doc.set_class(icon, SUN_ICON, light);
            doc.set_class(icon, MOON_ICON, !light);
        }
    }
}

/// Apply the stored theme to the page.
pub fn load_saved_theme<D: PageQuery + ?Sized>(doc: &mut D, store: &dyn PreferenceStore) -> Theme {
    let theme = Theme::from_stored(store.get(THEME_KEY).as_deref());
    theme.apply(doc);
    debug!("Loaded {} theme", theme.as_str());
    theme
}

/// Flip the page's theme and persist the new choice.
pub fn toggle_theme<D: PageQuery + ?Sized>(doc: &mut D, store: &dyn PreferenceStore) -> Result<Theme> {
    let theme = Theme::current(doc).toggled();
    theme.apply(doc);
    store.set(THEME_KEY, theme.as_str())?;
    info!("Theme switched to {}", theme.as_str());
    Ok(theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementSpec, MemoryDocument};
    use crate::preferences::MemoryPreferences;

    fn page() -> MemoryDocument {
        MemoryDocument::from_spec(
            &ElementSpec::new("body").with_child(
                ElementSpec::new("button")
                    .with_id(THEME_TOGGLE_ID)
                    .with_child(ElementSpec::new("i").with_id("icon").with_class("fas").with_class(MOON_ICON)),
            ),
        )
    }

    #[test]
    fn test_from_stored() {
        assert_eq!(Theme::from_stored(Some("light")), Theme::Light);
        assert_eq!(Theme::from_stored(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("LIGHT")), Theme::Dark);
        assert_eq!(Theme::from_stored(None), Theme::Dark);
    }

    #[test]
    fn test_load_saved_light_theme() {
        let mut doc = page();
        let store = MemoryPreferences::with(THEME_KEY, "light");

        assert_eq!(load_saved_theme(&mut doc, &store), Theme::Light);

        let body = doc.body().unwrap();
        let icon = doc.element_by_id("icon").unwrap();
        assert!(doc.has_class(body, LIGHT_CLASS));
        assert!(doc.has_class(icon, SUN_ICON));
        assert!(!doc.has_class(icon, MOON_ICON));
        assert!(doc.has_class(icon, "fas"));
    }

    #[test]
    fn test_toggle_round_trip_persists() {
        let mut doc = page();
        let store = MemoryPreferences::new();

        assert_eq!(toggle_theme(&mut doc, &store).unwrap(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));

        assert_eq!(toggle_theme(&mut doc, &store).unwrap(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        assert!(!doc.has_class(doc.body().unwrap(), LIGHT_CLASS));
    }

    #[test]
    fn test_apply_without_toggle_button() {
        let mut doc = MemoryDocument::from_spec(&ElementSpec::new("body"));
        Theme::Light.apply(&mut doc);
        assert_eq!(Theme::current(&doc), Theme::Light);
    }
}

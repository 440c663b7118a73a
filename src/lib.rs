pub mod config;
pub mod document;
pub mod i18n;
pub mod page;
pub mod preferences;
pub mod site;
pub mod theme;
pub mod typewriter;

//! Auxiliary page updaters driven by the active language.
//!
//! Each updater works on whatever anchor elements are present and does
//! nothing (returning `false`) when its anchor is missing.

use crate::document::PageQuery;
use crate::i18n::Language;
use tracing::debug;

/// Class marking language flags.
pub const LANG_FLAG_CLASS: &str = "lang-flag";

/// Attribute carrying a flag's language code.
pub const LANG_ATTR: &str = "data-lang";

pub const ACTIVE_CLASS: &str = "active";

pub const CURRENT_LANG_ID: &str = "currentLang";

pub const DOWNLOAD_CV_ID: &str = "downloadCV";

/// Element showing the copyright year. It carries no translation key, so
/// translation passes never touch it.
pub const COPYRIGHT_YEAR_ID: &str = "currentYear";

/// Mark the flag for `language` as active and every other flag inactive.
///
/// Returns `true` when a flag for `language` was found.
pub fn update_language_indicator<D: PageQuery + ?Sized>(doc: &mut D, language: Language) -> bool {
    let flags = doc.elements_with_class(LANG_FLAG_CLASS);
    if flags.is_empty() {
        debug!("No language flags on page");
        return false;
    }

    let mut found = false;
    for flag in flags {
        let is_active = doc.attribute(flag, LANG_ATTR) == Some(language.code());
        doc.set_class(flag, ACTIVE_CLASS, is_active);
        found |= is_active;
    }

    if !found {
        debug!("No language flag for {}", language);
    }
    found
}

/// Point the current-language button's image at the language's flag.
pub fn update_current_lang_button<D: PageQuery + ?Sized>(doc: &mut D, language: Language) -> bool {
    let Some(button) = doc.element_by_id(CURRENT_LANG_ID) else {
        debug!("No #{} button on page", CURRENT_LANG_ID);
        return false;
    };
    let Some(img) = doc.descendant_by_tag(button, "img") else {
        debug!("#{} has no image", CURRENT_LANG_ID);
        return false;
    };

    doc.set_attribute(img, "src", language.config().flag_url);
    doc.set_attribute(img, "alt", &language.code().to_uppercase());
    true
}

/// Point the CV download link at the language's CV.
pub fn update_cv_link<D: PageQuery + ?Sized>(doc: &mut D, language: Language) -> bool {
    let Some(link) = doc.element_by_id(DOWNLOAD_CV_ID) else {
        debug!("No #{} link on page", DOWNLOAD_CV_ID);
        return false;
    };

    doc.set_attribute(link, "href", language.config().cv_path);
    true
}

/// Show `year` in the copyright element if it displays anything else.
///
/// Returns `true` when the element was rewritten.
pub fn update_copyright_year<D: PageQuery + ?Sized>(doc: &mut D, year: i32) -> bool {
    let Some(node) = doc.element_by_id(COPYRIGHT_YEAR_ID) else {
        debug!("No #{} element on page", COPYRIGHT_YEAR_ID);
        return false;
    };

    let year = year.to_string();
    if doc.content(node) == Some(year.as_str()) {
        return false;
    }
    doc.set_content(node, &year);
    true
}

/// Run every language-dependent updater.
pub fn update_language_ui<D: PageQuery + ?Sized>(doc: &mut D, language: Language) {
    update_language_indicator(doc, language);
    update_current_lang_button(doc, language);
    update_cv_link(doc, language);
}

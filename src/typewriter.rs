//! Typewriter animation of the hero title.
//!
//! The translated title and name are typed into `#typewriter-text` one
//! character per interval behind a cursor; a second after the last
//! character the cursor is dropped. Restarting aborts the running animation.

use crate::document::PageQuery;
use crate::i18n::Bundle;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

pub const TYPEWRITER_ID: &str = "typewriter-text";

const CURSOR: &str = r#"<span class="cursor">|</span>"#;

/// Pause between the last typed character and the final cursorless text.
const FINISH_DELAY: Duration = Duration::from_secs(1);

/// Text typed by the animation: `hero-title` and `hero-name`, space separated.
///
/// Missing keys show as the key itself, like any other translation.
pub fn typewriter_text(bundle: &Bundle) -> String {
    let title = bundle.get("hero-title").unwrap_or("hero-title");
    let name = bundle.get("hero-name").unwrap_or("hero-name");
    format!("{} {}", title, name)
}

/// Frames written while typing: every non-empty prefix followed by the
/// cursor.
pub fn frames(text: &str) -> Vec<String> {
    text.char_indices()
        .map(|(i, c)| format!("{}{}", &text[..i + c.len_utf8()], CURSOR))
        .collect()
}

/// Owns the currently running animation, if any.
#[derive(Debug)]
pub struct Typewriter {
    interval: Duration,
    running: Mutex<Option<JoinHandle<()>>>,
}

impl Typewriter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: Mutex::new(None),
        }
    }

    /// Start typing `text`, aborting any animation already running.
    ///
    /// Returns `false` without starting when the page has no typewriter
    /// element.
    pub fn restart<D>(&self, document: &Arc<Mutex<D>>, text: String) -> bool
    where
        D: PageQuery + Send + 'static,
    {
        self.stop();

        let has_target = document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .element_by_id(TYPEWRITER_ID)
            .is_some();
        if !has_target {
            debug!("No #{} element, typewriter disabled", TYPEWRITER_ID);
            return false;
        }

        let document = Arc::clone(document);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            for frame in frames(&text) {
                write(&document, &frame);
                tokio::time::sleep(interval).await;
            }
            tokio::time::sleep(FINISH_DELAY).await;
            write(&document, &text);
            debug!("Typewriter finished");
        });

        *self.lock_running() = Some(handle);
        true
    }

    /// Abort the running animation, leaving the current frame displayed.
    pub fn stop(&self) {
        if let Some(handle) = self.lock_running().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_running()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Typewriter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn write<D: PageQuery>(document: &Arc<Mutex<D>>, html: &str) {
    let mut doc = document
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(node) = doc.element_by_id(TYPEWRITER_ID) {
        doc.set_content(node, html);
    }
}

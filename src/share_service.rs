use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::log;

pub const SUCCESS_MESSAGE_ID: &str = "success-message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardError(pub String);

impl Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ClipboardError {}

pub trait Clipboard: Send + 'static {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard. Initialization fails on headless machines.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut ctx = arboard::Clipboard::new().map_err(|e| ClipboardError(format!("clipboard init: {e}")))?;
        ctx.set_text(text.to_owned())
            .map_err(|e| ClipboardError(format!("clipboard set: {e}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Copies the game link and drives the `success-message` confirmation.
pub struct ClipboardShare<C: Clipboard> {
    clipboard: Arc<Mutex<C>>,
    page_url: String,
    hide_after: Duration,
    visibility: Arc<watch::Sender<Visibility>>,
    shown: Arc<AtomicU64>,
}

impl<C: Clipboard> ClipboardShare<C> {
    pub fn new(clipboard: C, page_url: &str, hide_after: Duration) -> ClipboardShare<C> {
        let (visibility, _) = watch::channel(Visibility::Hidden);
        ClipboardShare {
            clipboard: Arc::new(Mutex::new(clipboard)),
            page_url: page_url.to_string(),
            hide_after,
            visibility: Arc::new(visibility),
            shown: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn visibility(&self) -> Visibility {
        *self.visibility.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.visibility.subscribe()
    }

    pub async fn copy_link(&self) -> Result<(), ClipboardError> {
        log::info!("[SHARE] URL is `{}`", self.page_url);
        let clipboard = self.clipboard.clone();
        let url = self.page_url.clone();
        let res = tokio::task::spawn_blocking(move || {
            let mut guard = clipboard.lock()
                .map_err(|_| ClipboardError("clipboard lock poisoned".to_string()))?;
            guard.set_text(&url)
        })
        .await
        .map_err(|e| ClipboardError(format!("clipboard task: {e}")))
        .and_then(|e| e);

        if let Err(e) = &res {
            log::error!("[SHARE] Copy failed: {e}");
            return res;
        }

        let generation = self.shown.fetch_add(1, Ordering::SeqCst) + 1;
        self.visibility.send_replace(Visibility::Visible);

        let (visibility, shown, hide_after) = (self.visibility.clone(), self.shown.clone(), self.hide_after);
        tokio::spawn(async move {
            tokio::time::sleep(hide_after).await;
            // a newer copy owns the message now
            if shown.load(Ordering::SeqCst) == generation {
                visibility.send_replace(Visibility::Hidden);
            }
        });
        Ok(())
    }
}

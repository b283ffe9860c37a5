//! Capabilities the browsing session needs from whatever hosts it.
//!
//! The session never reaches for the network listing, the system browser or
//! the display directly; it is handed a `Host` and calls through it.

use crate::error::Result;
use crate::models::{ArticleContext, ArticleMeta, Hit};

/// Type tag on every article message sent to the host.
pub const ARTICLE_MESSAGE_TYPE: &str = "hn-article-context";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostMessage {
    pub custom_type: &'static str,
    pub content: String,
    pub details: ArticleMeta,
    pub display: bool,
}

impl HostMessage {
    pub fn article(context: ArticleContext) -> Self {
        Self {
            custom_type: ARTICLE_MESSAGE_TYPE,
            content: context.text,
            details: context.meta,
            display: true,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Host {
    async fn fetch_listing(&self) -> Result<Vec<Hit>>;

    fn open_url(&self, url: &str) -> Result<()>;

    fn send_message(&mut self, message: HostMessage);

    fn notify(&mut self, level: NotifyLevel, text: &str);
}

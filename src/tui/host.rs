use crate::config::Config;
use crate::error::Result;
use crate::host::{Host, HostMessage, NotifyLevel};
use crate::models::Hit;
use crate::services::{open_in_browser, FrontPageClient};

/// Terminal host: the listing comes from the front-page API, messages are
/// kept for the context pane and the latest notification is shown in the
/// status line.
pub struct TuiHost {
    client: FrontPageClient,
    pub messages: Vec<HostMessage>,
    pub status: Option<(NotifyLevel, String)>,
}

impl TuiHost {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: FrontPageClient::new(config)?,
            messages: Vec::new(),
            status: None,
        })
    }
}

impl Host for TuiHost {
    async fn fetch_listing(&self) -> Result<Vec<Hit>> {
        self.client.fetch().await
    }

    fn open_url(&self, url: &str) -> Result<()> {
        open_in_browser(url)
    }

    fn send_message(&mut self, message: HostMessage) {
        tracing::info!(
            "Added {} ({} chars) to context",
            message.details.url,
            message.details.char_count
        );
        self.messages.push(message);
    }

    fn notify(&mut self, level: NotifyLevel, text: &str) {
        self.status = Some((level, text.to_string()));
    }
}

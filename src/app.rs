use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::extract::{format_context, ArticleFetcher};
use crate::host::{Host, HostMessage, NotifyLevel};
use crate::models::{ExtractionState, Hit, ReadBuffer, ReadableArticle, SeenItem};
use crate::tui::AppAction;

// Message for a finished extraction
pub struct ExtractionResult {
    pub hn_id: String,
    pub result: Result<ReadableArticle>,
}

pub struct App<H: Host> {
    // Data
    pub hits: Vec<Hit>,
    pub read_ids: HashSet<String>,

    // UI State
    pub selected_index: usize,
    pub show_help: bool,
    pub is_refreshing: bool,

    // Async state
    pub extraction: ExtractionState,
    extraction_rx: mpsc::Receiver<ExtractionResult>,
    extraction_tx: mpsc::Sender<ExtractionResult>,
    closed: Arc<AtomicBool>,
    read_buffer: ReadBuffer,

    // Services
    pub host: H,
    repository: Repository,
    fetcher: Arc<ArticleFetcher>,
}

impl<H: Host> App<H> {
    pub fn new(config: &Config, host: H) -> Result<Self> {
        Self::with_repository(config, host, Repository::new(config.store_path()))
    }

    pub fn with_repository(config: &Config, host: H, repository: Repository) -> Result<Self> {
        let fetcher = Arc::new(ArticleFetcher::new(config)?);
        let (extraction_tx, extraction_rx) = mpsc::channel(1);

        let mut app = Self {
            hits: Vec::new(),
            read_ids: HashSet::new(),
            selected_index: 0,
            show_help: false,
            is_refreshing: false,
            extraction: ExtractionState::Idle,
            extraction_rx,
            extraction_tx,
            closed: Arc::new(AtomicBool::new(false)),
            read_buffer: ReadBuffer::new(config.read_flush_threshold),
            host,
            repository,
            fetcher,
        };

        // A broken store must not keep the user from browsing.
        if let Err(e) = app.repository.ensure_ready() {
            tracing::warn!(
                "Read-state store {} unavailable: {}",
                app.repository.path().display(),
                e
            );
            app.host
                .notify(NotifyLevel::Warning, &format!("Read state unavailable: {e}"));
        }

        Ok(app)
    }

    pub fn selected_hit(&self) -> Option<&Hit> {
        self.hits.get(self.selected_index)
    }

    pub fn is_read(&self, hit: &Hit) -> bool {
        self.read_ids.contains(&hit.hn_id)
    }

    pub fn unread_count(&self) -> usize {
        self.hits.iter().filter(|h| !self.is_read(h)).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => {
                self.close();
                return Ok(true);
            }

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.hits.len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.hits.len().saturating_sub(1);
            }

            AppAction::OpenInBrowser => self.open_selected(),

            AppAction::AddToContext => self.add_selected_to_context(),

            AppAction::Refresh => self.refresh().await,

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    /// Reloads the front page. Listing and store failures are reported to
    /// the host; neither aborts the session.
    pub async fn refresh(&mut self) {
        self.is_refreshing = true;

        match self.host.fetch_listing().await {
            Ok(hits) => {
                self.hits = hits;
                if self.selected_index >= self.hits.len() {
                    self.selected_index = self.hits.len().saturating_sub(1);
                }
                self.sync_read_state();
                let text = format!("Loaded {} stories", self.hits.len());
                self.host.notify(NotifyLevel::Info, &text);
            }
            Err(e) => {
                tracing::error!("Failed to load front page: {}", e);
                self.host
                    .notify(NotifyLevel::Error, &format!("Failed to load front page: {e}"));
            }
        }

        self.is_refreshing = false;
    }

    fn sync_read_state(&mut self) {
        let items: Vec<SeenItem> = self.hits.iter().map(Hit::seen_item).collect();
        let ids: Vec<&str> = self.hits.iter().map(|h| h.hn_id.as_str()).collect();

        let lookup = self
            .repository
            .upsert_seen(&items)
            .and_then(|()| self.repository.lookup_read(&ids));

        match lookup {
            Ok(read) => {
                self.read_ids = read;
                // marks not flushed yet still count for this session
                self.read_ids
                    .extend(self.read_buffer.pending().iter().map(|i| i.hn_id.clone()));
            }
            Err(e) => {
                tracing::warn!("Read state unavailable: {}", e);
                self.host
                    .notify(NotifyLevel::Warning, &format!("Read state unavailable: {e}"));
            }
        }
    }

    fn open_selected(&mut self) {
        let Some(hit) = self.selected_hit().cloned() else {
            return;
        };

        self.mark_read(hit.seen_item());

        if let Err(e) = self.host.open_url(&hit.link()) {
            tracing::error!("{}", e);
            self.host.notify(NotifyLevel::Error, &e.to_string());
        }
    }

    fn add_selected_to_context(&mut self) {
        let Some(hit) = self.selected_hit().cloned() else {
            return;
        };

        if let Err(busy) = self.extraction.begin(&hit.hn_id) {
            self.host.notify(
                NotifyLevel::Warning,
                &format!(
                    "Article fetch already in progress (item {})",
                    busy.pending_hn_id
                ),
            );
            return;
        }

        self.mark_read(hit.seen_item());
        self.host
            .notify(NotifyLevel::Info, &format!("Fetching \"{}\"...", hit.title));

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.extraction_tx.clone();
        let closed = Arc::clone(&self.closed);
        let hn_id = hit.hn_id.clone();
        let url = hit.link();

        // The request itself is never aborted; a late result is dropped.
        tokio::spawn(async move {
            let result = fetcher.fetch(&url).await;
            if closed.load(Ordering::SeqCst) {
                tracing::debug!("Session closed, discarding article {}", hn_id);
                return;
            }
            let _ = tx.send(ExtractionResult { hn_id, result }).await;
        });
    }

    /// Poll for a finished extraction (non-blocking)
    pub fn poll_extraction_result(&mut self) {
        let Ok(done) = self.extraction_rx.try_recv() else {
            return;
        };

        if self.is_closed() || self.extraction.pending() != Some(done.hn_id.as_str()) {
            return;
        }
        self.extraction.finish();

        match done.result {
            Ok(article) => {
                let context = format_context(&done.hn_id, &article, Utc::now());
                let text = format!(
                    "Added \"{}\" to context ({} chars)",
                    context.meta.title, context.meta.char_count
                );
                self.host.send_message(HostMessage::article(context));
                self.host.notify(NotifyLevel::Info, &text);
            }
            Err(e) => {
                tracing::error!("Failed to extract article {}: {}", done.hn_id, e);
                self.host.notify(
                    NotifyLevel::Error,
                    &format!("Failed to add article to context: {e}"),
                );
            }
        }
    }

    fn mark_read(&mut self, item: SeenItem) {
        self.read_ids.insert(item.hn_id.clone());
        if self.read_buffer.push(item) {
            self.flush_reads();
        }
    }

    /// Writes buffered read marks. Failures are reported, not retried.
    pub fn flush_reads(&mut self) {
        let items = self.read_buffer.take();
        if items.is_empty() {
            return;
        }

        match self.repository.upsert_read(&items) {
            Ok(()) => tracing::debug!("Flushed {} read marks", items.len()),
            Err(e) => {
                tracing::warn!("Failed to save {} read marks: {}", items.len(), e);
                self.host
                    .notify(NotifyLevel::Warning, &format!("Failed to save read state: {e}"));
            }
        }
    }

    /// Ends the session: late extraction results are ignored from here on
    /// and pending read marks are written.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.flush_reads();
    }
}

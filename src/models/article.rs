use serde::{Deserialize, Serialize};

/// One persisted row of the read-state store. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: u64,
    pub hn_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub read_at: Option<i64>,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ArticleRecord {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// On-disk shape of the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFile {
    pub next_id: u64,
    pub articles: Vec<ArticleRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            next_id: 1,
            articles: Vec::new(),
        }
    }
}

/// Input to the store's upsert operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenItem {
    pub hn_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl SeenItem {
    pub fn new(hn_id: impl Into<String>) -> Self {
        Self {
            hn_id: hn_id.into(),
            title: None,
            url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

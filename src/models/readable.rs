use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one extraction run. Never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadableArticle {
    pub title: String,
    /// Final URL after redirects.
    pub url: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
    pub text_content: String,
    pub length: usize,
}

/// Structured details attached to the message handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub hn_id: String,
    pub title: String,
    pub url: String,
    pub site_name: Option<String>,
    pub byline: Option<String>,
    pub length: usize,
    pub char_count: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleContext {
    pub text: String,
    pub meta: ArticleMeta,
}

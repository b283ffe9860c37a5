use chrono::{DateTime, Utc};

use crate::models::{discussion_url, ArticleContext, ArticleMeta, ReadableArticle};

use super::normalize::collapse_whitespace;

pub const TEXT_MARKER: &str = "Article Text:";

/// Renders the plain-text document handed to the host, plus its metadata.
pub fn format_context(
    hn_id: &str,
    article: &ReadableArticle,
    fetched_at: DateTime<Utc>,
) -> ArticleContext {
    let mut lines = vec![
        format!("Title: {}", article.title),
        format!("URL: {}", article.url),
        format!("Discussion: {}", discussion_url(hn_id)),
    ];

    let optional = [
        ("Site", &article.site_name),
        ("Byline", &article.byline),
        ("Excerpt", &article.excerpt),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().map(collapse_whitespace) {
            if !value.is_empty() {
                lines.push(format!("{label}: {value}"));
            }
        }
    }

    lines.push(String::new());
    lines.push(TEXT_MARKER.to_string());
    lines.push(article.text_content.clone());

    ArticleContext {
        text: lines.join("\n"),
        meta: ArticleMeta {
            hn_id: hn_id.to_string(),
            title: article.title.clone(),
            url: article.url.clone(),
            site_name: article.site_name.clone(),
            byline: article.byline.clone(),
            length: article.length,
            char_count: article.text_content.chars().count(),
            fetched_at,
        },
    }
}

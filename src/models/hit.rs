use serde::Deserialize;
use serde_json::Value;

use super::SeenItem;

const DISCUSSION_BASE: &str = "https://news.ycombinator.com/item?id=";

pub fn discussion_url(hn_id: &str) -> String {
    format!("{DISCUSSION_BASE}{hn_id}")
}

/// A front-page entry as the listing API returns it. The item id comes
/// either as a string `objectID` or a numeric `story_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    #[serde(rename = "objectID")]
    pub object_id: Option<Value>,
    pub story_id: Option<Value>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub points: Option<u32>,
    pub num_comments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub hn_id: String,
    pub title: String,
    pub url: Option<String>,
    pub points: u32,
    pub num_comments: u32,
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RawHit {
    pub fn into_hit(self) -> Option<Hit> {
        let hn_id = self
            .object_id
            .as_ref()
            .and_then(id_from_value)
            .or_else(|| self.story_id.as_ref().and_then(id_from_value))?;

        let url = self.url.filter(|u| !u.trim().is_empty());

        Some(Hit {
            hn_id,
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "(untitled)".to_string()),
            url,
            points: self.points.unwrap_or(0),
            num_comments: self.num_comments.unwrap_or(0),
        })
    }
}

impl Hit {
    pub fn discussion_url(&self) -> String {
        discussion_url(&self.hn_id)
    }

    /// Article URL, or the discussion thread for text posts.
    pub fn link(&self) -> String {
        self.url.clone().unwrap_or_else(|| self.discussion_url())
    }

    pub fn seen_item(&self) -> SeenItem {
        SeenItem {
            hn_id: self.hn_id.clone(),
            title: Some(self.title.clone()),
            url: Some(self.link()),
        }
    }
}

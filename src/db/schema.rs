use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::StoreFile;

fn corrupt(path: &Path, reason: impl ToString) -> AppError {
    AppError::CorruptStore {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Parses the store file, checking its shape before decoding records.
/// Nothing is repaired here: any deviation is reported as-is.
pub fn parse_store(path: &Path, content: &str) -> Result<StoreFile> {
    let value: Value = serde_json::from_str(content).map_err(|e| corrupt(path, e))?;

    let Some(object) = value.as_object() else {
        return Err(corrupt(path, "expected a JSON object at the top level"));
    };

    if !object.get("next_id").is_some_and(Value::is_u64) {
        return Err(corrupt(path, "`next_id` must be a non-negative integer"));
    }

    if !object.get("articles").is_some_and(Value::is_array) {
        return Err(corrupt(path, "`articles` must be an array"));
    }

    let store: StoreFile = serde_json::from_value(value).map_err(|e| corrupt(path, e))?;

    let mut hn_ids = HashSet::with_capacity(store.articles.len());
    for article in &store.articles {
        if article.id >= store.next_id {
            return Err(corrupt(
                path,
                format!(
                    "`next_id` {} is not past existing id {}",
                    store.next_id, article.id
                ),
            ));
        }
        if !hn_ids.insert(article.hn_id.as_str()) {
            return Err(corrupt(
                path,
                format!("duplicate hn_id `{}`", article.hn_id),
            ));
        }
    }

    Ok(store)
}

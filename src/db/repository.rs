use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, SeenItem, StoreFile};

use super::schema::parse_store;

/// Read-state table kept in a single JSON file.
///
/// Every mutating call is one full read followed by one atomic rewrite.
/// There is no locking: one process is expected to own the file.
pub struct Repository {
    path: PathBuf,
    ready: bool,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ready: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty store if the file is missing, otherwise validates it.
    /// Success is remembered; a failed attempt is retried on the next call.
    pub fn ensure_ready(&mut self) -> Result<()> {
        if self.ready {
            return Ok(());
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                parse_store(&self.path, &content)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.save(&StoreFile::default())?;
                tracing::debug!("Created read-state store at {}", self.path.display());
            }
            Err(e) => return Err(AppError::persist(&self.path, e)),
        }

        self.ready = true;
        Ok(())
    }

    pub fn upsert_seen(&mut self, items: &[SeenItem]) -> Result<()> {
        self.upsert_at(items, false, Utc::now().timestamp())
    }

    /// Like `upsert_seen`, but also stamps `read_at` on records that have
    /// none. Unknown items are created already read.
    pub fn upsert_read(&mut self, items: &[SeenItem]) -> Result<()> {
        self.upsert_at(items, true, Utc::now().timestamp())
    }

    /// Returns the candidates that have been read. Ids missing from the
    /// store count as unread.
    pub fn lookup_read<S: AsRef<str>>(&mut self, candidate_ids: &[S]) -> Result<HashSet<String>> {
        self.ensure_ready()?;
        let store = self.load()?;

        let read: HashSet<&str> = store
            .articles
            .iter()
            .filter(|a| a.is_read())
            .map(|a| a.hn_id.as_str())
            .collect();

        Ok(candidate_ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| read.contains(id))
            .map(str::to_string)
            .collect())
    }

    /// Snapshot of every record, in insertion order.
    pub fn all_articles(&mut self) -> Result<Vec<ArticleRecord>> {
        self.ensure_ready()?;
        Ok(self.load()?.articles)
    }

    fn upsert_at(&mut self, items: &[SeenItem], mark_read: bool, now: i64) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        self.ensure_ready()?;
        let mut store = self.load()?;

        let mut index: HashMap<String, usize> = HashMap::with_capacity(store.articles.len());
        for (pos, article) in store.articles.iter().enumerate() {
            index.entry(article.hn_id.clone()).or_insert(pos);
        }

        let mut created = 0usize;
        for item in items {
            match index.get(&item.hn_id) {
                Some(&pos) => {
                    let record = &mut store.articles[pos];
                    if let Some(title) = &item.title {
                        record.title = Some(title.clone());
                    }
                    if let Some(url) = &item.url {
                        record.url = Some(url.clone());
                    }
                    record.last_seen_at = now.max(record.first_seen_at);
                    if mark_read && record.read_at.is_none() {
                        record.read_at = Some(now);
                    }
                    record.updated_at = now;
                }
                None => {
                    let id = store.next_id;
                    store.next_id = id.checked_add(1).ok_or_else(|| AppError::CorruptStore {
                        path: self.path.clone(),
                        reason: "id counter exhausted".to_string(),
                    })?;
                    store.articles.push(ArticleRecord {
                        id,
                        hn_id: item.hn_id.clone(),
                        title: item.title.clone(),
                        url: item.url.clone(),
                        read_at: mark_read.then_some(now),
                        first_seen_at: now,
                        last_seen_at: now,
                        created_at: now,
                        updated_at: now,
                    });
                    index.insert(item.hn_id.clone(), store.articles.len() - 1);
                    created += 1;
                }
            }
        }

        self.save(&store)?;
        tracing::debug!(
            "Upserted {} items ({} new, mark_read={})",
            items.len(),
            created,
            mark_read
        );
        Ok(())
    }

    fn load(&self) -> Result<StoreFile> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_store(&self.path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(AppError::persist(&self.path, e)),
        }
    }

    fn save(&self, store: &StoreFile) -> Result<()> {
        let tmp = self.write_temp(store)?;
        self.commit(tmp)
    }

    /// First half of an atomic save: the full document lands in a sibling
    /// temp file. The store path is untouched until `commit`.
    fn write_temp(&self, store: &StoreFile) -> Result<NamedTempFile> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| AppError::persist(dir, e))?;

        let mut json = serde_json::to_string_pretty(store)?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::persist(dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| AppError::persist(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| AppError::persist(tmp.path(), e))?;
        Ok(tmp)
    }

    fn commit(&self, tmp: NamedTempFile) -> Result<()> {
        tmp.persist(&self.path)
            .map_err(|e| AppError::persist(&self.path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn scratch() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::new(dir.path().join("state").join("read-state.json"));
        (dir, repo)
    }

    fn read_file(repo: &Repository) -> StoreFile {
        let content = std::fs::read_to_string(repo.path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn item(id: &str) -> SeenItem {
        SeenItem::new(id).with_title(format!("Story {id}"))
    }

    #[test]
    fn ensure_ready_creates_empty_store() {
        let (_dir, mut repo) = scratch();
        assert_ok!(repo.ensure_ready());

        let content = std::fs::read_to_string(repo.path()).unwrap();
        assert!(content.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({ "next_id": 1, "articles": [] }));

        // cached: a second call does not need the file
        std::fs::remove_file(repo.path()).unwrap();
        assert_ok!(repo.ensure_ready());
        assert!(!repo.path().exists());
    }

    #[test]
    fn corrupt_store_is_reported_and_retried() {
        let (_dir, mut repo) = scratch();
        std::fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
        std::fs::write(repo.path(), "{\"articles\": 3}").unwrap();

        let err = assert_err!(repo.ensure_ready());
        assert!(matches!(err, AppError::CorruptStore { .. }));
        assert!(matches!(
            repo.upsert_seen(&[item("1")]),
            Err(AppError::CorruptStore { .. })
        ));
        // left exactly as found
        assert_eq!(
            std::fs::read_to_string(repo.path()).unwrap(),
            "{\"articles\": 3}"
        );

        std::fs::write(repo.path(), "{\"next_id\": 1, \"articles\": []}").unwrap();
        assert_ok!(repo.ensure_ready());
    }

    #[test]
    fn upsert_seen_twice_keeps_one_unread_record() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("42")], false, 100).unwrap();
        repo.upsert_at(&[item("42")], false, 200).unwrap();

        let store = read_file(&repo);
        assert_eq!(store.articles.len(), 1);
        let record = &store.articles[0];
        assert_eq!(record.read_at, None);
        assert_eq!(record.first_seen_at, 100);
        assert_eq!(record.last_seen_at, 200);
        assert_eq!(record.created_at, 100);
        assert_eq!(record.updated_at, 200);
    }

    #[test]
    fn seen_then_read_then_lookup() {
        let (_dir, mut repo) = scratch();

        let seen = SeenItem::new("42").with_title("A").with_url("http://x");
        repo.upsert_seen(&[seen.clone()]).unwrap();

        let store = read_file(&repo);
        assert_eq!(store.next_id, 2);
        assert_eq!(store.articles.len(), 1);
        let record = &store.articles[0];
        assert_eq!(record.id, 1);
        assert_eq!(record.hn_id, "42");
        assert_eq!(record.title.as_deref(), Some("A"));
        assert_eq!(record.url.as_deref(), Some("http://x"));
        assert_eq!(record.read_at, None);

        let before = Utc::now().timestamp();
        repo.upsert_read(&[seen]).unwrap();
        let after = Utc::now().timestamp();

        let store = read_file(&repo);
        assert_eq!(store.articles.len(), 1);
        let record = &store.articles[0];
        assert_eq!(record.id, 1);
        let read_at = record.read_at.unwrap();
        assert!(before <= read_at && read_at <= after);

        let read = repo.lookup_read(&["42", "99"]).unwrap();
        assert_eq!(read, HashSet::from(["42".to_string()]));
    }

    #[test]
    fn first_read_wins() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("7")], true, 100).unwrap();
        repo.upsert_at(&[item("7")], true, 200).unwrap();
        repo.upsert_at(&[item("7")], false, 300).unwrap();

        let record = &read_file(&repo).articles[0];
        assert_eq!(record.read_at, Some(100));
        assert_eq!(record.last_seen_at, 300);
    }

    #[test]
    fn read_of_unseen_item_creates_it_read() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("5")], true, 50).unwrap();

        let record = &read_file(&repo).articles[0];
        assert_eq!(record.id, 1);
        assert_eq!(record.read_at, Some(50));
        assert_eq!(record.first_seen_at, 50);
    }

    #[test]
    fn ids_are_unique_and_monotonic() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("a"), item("b"), item("a")], false, 1).unwrap();
        repo.upsert_at(&[item("c"), item("b")], true, 2).unwrap();
        repo.upsert_at(&[item("d")], false, 3).unwrap();

        let store = read_file(&repo);
        let hn_ids: Vec<&str> = store.articles.iter().map(|a| a.hn_id.as_str()).collect();
        let ids: Vec<u64> = store.articles.iter().map(|a| a.id).collect();
        assert_eq!(hn_ids, ["a", "b", "c", "d"]);
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(store.next_id, 5);
    }

    #[test]
    fn missing_title_does_not_erase_known_title() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("1")], false, 1).unwrap();
        repo.upsert_at(&[SeenItem::new("1")], true, 2).unwrap();

        let record = &read_file(&repo).articles[0];
        assert_eq!(record.title.as_deref(), Some("Story 1"));
        assert_eq!(record.read_at, Some(2));
    }

    #[test]
    fn empty_batch_never_touches_disk() {
        let (_dir, mut repo) = scratch();
        assert_ok!(repo.upsert_seen(&[]));
        assert_ok!(repo.upsert_read(&[]));
        assert!(!repo.path().exists());
    }

    #[test]
    fn crash_before_rename_leaves_previous_file() {
        let (_dir, mut repo) = scratch();
        repo.upsert_at(&[item("1")], false, 1).unwrap();
        let before = std::fs::read_to_string(repo.path()).unwrap();

        let mut next = read_file(&repo);
        next.articles.clear();
        next.next_id = 99;
        let tmp = repo.write_temp(&next).unwrap();
        // the process dies here: the temp file is dropped, never renamed
        drop(tmp);

        let after = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(before, after);
        assert_eq!(read_file(&repo).articles.len(), 1);

        let leftovers = std::fs::read_dir(repo.path().parent().unwrap())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn exhausted_counter_is_reported_without_writing() {
        let (_dir, mut repo) = scratch();
        std::fs::create_dir_all(repo.path().parent().unwrap()).unwrap();
        let content = format!("{{\"next_id\": {}, \"articles\": []}}", u64::MAX - 1);
        std::fs::write(repo.path(), &content).unwrap();

        repo.upsert_at(&[item("a")], false, 1).unwrap();
        let err = assert_err!(repo.upsert_at(&[item("b")], false, 2));
        assert!(matches!(err, AppError::CorruptStore { ref reason, .. } if reason == "id counter exhausted"));
        assert_eq!(read_file(&repo).articles.len(), 1);
    }

    #[test]
    fn lookup_treats_unknown_ids_as_unread() {
        let (_dir, mut repo) = scratch();
        let read = repo.lookup_read(&["1", "2"]).unwrap();
        assert!(read.is_empty());
        assert!(repo.path().exists());
    }
}

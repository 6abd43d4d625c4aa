//! Journaled binding store.
//!
//! [`JournalBindingStore`] keeps the same in-memory indices as
//! [`InMemoryBindingStore`](crate::InMemoryBindingStore) and additionally
//! appends every new binding to a JSON-lines file, so tokens survive a
//! restart.
//!
//! On-disk format, one binding per line:
//! ```text
//! {"token":"…","kind":"series","slug":"one-piece","issued_at":"2024-05-01T12:00:00Z"}
//! ```
//!
//! A binding is written and flushed before it becomes visible to readers.
//! A trailing line without a newline is the remains of an interrupted
//! append; it is dropped (and truncated away) when the journal is opened.
//!
//! Appends are blocking file writes made while the index write lock is held.
//! Async callers should issue through a blocking task when
//! [`BindingStore::is_durable`] is `true`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tokmap_types::{Binding, NamespacedKey, Token};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::generator::TokenGenerator;
use crate::indices::{Conflict, Indices};
use crate::traits::{BindingStore, Issued};

/// Options for opening a journal.
#[derive(Clone, Debug, Default)]
pub struct JournalOptions {
    /// `fsync` after every append instead of relying on the OS page cache.
    pub sync_each_append: bool,
}

/// A [`BindingStore`] backed by an append-only journal file.
#[derive(Debug)]
pub struct JournalBindingStore {
    path: PathBuf,
    options: JournalOptions,
    state: RwLock<JournalState>,
}

/// The append target behind a journal. Implemented by [`File`]; tests
/// substitute targets that fail mid-write.
pub(crate) trait JournalFile: Write + Send + Sync + std::fmt::Debug {
    fn truncate(&mut self, len: u64) -> std::io::Result<()>;
    fn sync(&mut self) -> std::io::Result<()>;
}

impl JournalFile for File {
    fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }
}

#[derive(Debug)]
struct JournalState {
    indices: Indices,
    file: Box<dyn JournalFile>,
    /// Length of the journal up to the last complete line.
    committed_len: u64,
}

impl JournalBindingStore {
    /// Open (or create) the journal at `path` and replay it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, JournalOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: JournalOptions) -> StoreResult<Self> {
        Self::open_inner(path, options, |file| Box::new(file))
    }

    pub(crate) fn open_inner(
        path: impl AsRef<Path>,
        options: JournalOptions,
        wrap: impl FnOnce(File) -> Box<dyn JournalFile>,
    ) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let raw = String::from_utf8(bytes)
            .map_err(|e| StoreError::Serialization(format!("journal is not UTF-8: {e}")))?;

        let (indices, committed_len) = replay(&raw)?;
        if committed_len < raw.len() as u64 {
            warn!(
                path = %path.display(),
                dropped_bytes = raw.len() as u64 - committed_len,
                "dropping incomplete trailing journal line"
            );
            file.set_len(committed_len)?;
        }

        info!(path = %path.display(), bindings = indices.len(), "journal opened");
        Ok(Self {
            path,
            options,
            state: RwLock::new(JournalState {
                indices,
                file: wrap(file),
                committed_len,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Rebuild the indices from journal text. Returns the indices and the byte
/// length of the complete-line prefix that was applied.
fn replay(raw: &str) -> StoreResult<(Indices, u64)> {
    let mut indices = Indices::default();
    let mut committed = 0usize;

    for (n, line) in raw.split_inclusive('\n').enumerate() {
        let line_no = n + 1;
        if !line.ends_with('\n') {
            break;
        }
        committed += line.len();

        let body = line.trim();
        if body.is_empty() {
            continue;
        }
        let binding: Binding = serde_json::from_str(body).map_err(|e| StoreError::Corrupt {
            line: line_no,
            reason: e.to_string(),
        })?;
        indices.insert(binding).map_err(|conflict| StoreError::Corrupt {
            line: line_no,
            reason: match conflict {
                Conflict::KeyBound(token) => format!("key already bound to {token}"),
                Conflict::TokenBound(key) => format!("token already bound to {key}"),
            },
        })?;
    }

    Ok((indices, committed as u64))
}

impl BindingStore for JournalBindingStore {
    fn lookup(&self, key: &NamespacedKey) -> StoreResult<Option<Token>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.indices.lookup(key).map(|b| b.token.clone()))
    }

    fn resolve(&self, token: &str) -> StoreResult<Option<NamespacedKey>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.indices.resolve(token).cloned())
    }

    fn bind(
        &self,
        key: &NamespacedKey,
        generator: &dyn TokenGenerator,
        max_attempts: u32,
    ) -> StoreResult<Issued> {
        {
            let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
            if let Some(existing) = state.indices.lookup(key) {
                return Ok(Issued {
                    binding: existing.clone(),
                    created: false,
                });
            }
        }

        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(existing) = state.indices.lookup(key) {
            return Ok(Issued {
                binding: existing.clone(),
                created: false,
            });
        }

        let token = state.indices.mint(generator, max_attempts)?;
        let binding = Binding::new(token, key.clone());

        let mut line = serde_json::to_vec(&binding)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push(b'\n');

        if let Err(e) = append(state.file.as_mut(), &line, self.options.sync_each_append) {
            // Cut off whatever part of the line made it to disk.
            let committed = state.committed_len;
            if let Err(trunc) = state.file.truncate(committed) {
                warn!(error = %trunc, "failed to roll back partial journal append");
            }
            return Err(e.into());
        }
        state.committed_len += line.len() as u64;

        debug!(key = %binding.key, token = binding.token.short_id(), "binding journaled");
        match state.indices.insert(binding.clone()) {
            Ok(()) => Ok(Issued {
                binding,
                created: true,
            }),
            Err(_) => Err(StoreError::TokenSpaceExhausted {
                attempts: max_attempts,
            }),
        }
    }

    fn len(&self) -> StoreResult<usize> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.indices.len())
    }

    fn bindings(&self) -> StoreResult<Vec<Binding>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.indices.bindings())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

fn append(file: &mut dyn JournalFile, line: &[u8], sync: bool) -> std::io::Result<()> {
    file.write_all(line)?;
    file.flush()?;
    if sync {
        file.sync()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::testing::ScriptedGenerator;
    use crate::generator::UuidV4Generator;

    fn key(kind: &str, slug: &str) -> NamespacedKey {
        NamespacedKey::parse(kind, slug).unwrap()
    }

    #[test]
    fn open_creates_empty_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bindings.jsonl");
        let store = JournalBindingStore::open(&path).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn bindings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");

        let (series, chapter) = {
            let store = JournalBindingStore::open(&path).unwrap();
            let s = store.bind(&key("series", "one-piece"), &UuidV4Generator, 8).unwrap();
            let c = store.bind(&key("chapter", "one-piece"), &UuidV4Generator, 8).unwrap();
            // Re-issuing must not append a second line.
            store.bind(&key("series", "one-piece"), &UuidV4Generator, 8).unwrap();
            (s.binding.token, c.binding.token)
        };

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let store = JournalBindingStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(
            store.resolve(series.as_str()).unwrap(),
            Some(key("series", "one-piece"))
        );
        assert_eq!(
            store.lookup(&key("chapter", "one-piece")).unwrap(),
            Some(chapter)
        );

        let again = store.bind(&key("series", "one-piece"), &UuidV4Generator, 8).unwrap();
        assert!(!again.created);
        assert_eq!(again.binding.token, series);
    }

    #[test]
    fn partial_trailing_line_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");
        {
            let store = JournalBindingStore::open(&path).unwrap();
            store
                .bind(&key("series", "a"), &ScriptedGenerator::new(&["t1"]), 8)
                .unwrap();
        }
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(br#"{"token":"t2","kind":"ser"#).unwrap();
        drop(f);

        let store = JournalBindingStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        store
            .bind(&key("series", "b"), &ScriptedGenerator::new(&["t3"]), 8)
            .unwrap();
        drop(store);

        let reopened = JournalBindingStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(reopened.resolve("t3").unwrap(), Some(key("series", "b")));
    }

    #[test]
    fn garbage_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");
        std::fs::write(&path, "\nnot json\n").unwrap();

        let err = JournalBindingStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn conflicting_lines_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");
        let a = r#"{"token":"t1","kind":"series","slug":"a","issued_at":"2024-01-01T00:00:00Z"}"#;
        let b = r#"{"token":"t1","kind":"series","slug":"b","issued_at":"2024-01-01T00:00:01Z"}"#;
        std::fs::write(&path, format!("{a}\n{b}\n")).unwrap();

        let err = JournalBindingStore::open(&path).unwrap_err();
        match err {
            StoreError::Corrupt { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("series:a"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Writes the first half of each buffer to the real file, then fails.
    #[derive(Debug)]
    struct TornFile {
        inner: File,
        torn: bool,
    }

    impl Write for TornFile {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.torn {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.torn = true;
            self.inner.write(&buf[..buf.len() / 2])
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl JournalFile for TornFile {
        fn truncate(&mut self, len: u64) -> std::io::Result<()> {
            self.inner.set_len(len)
        }

        fn sync(&mut self) -> std::io::Result<()> {
            self.inner.sync_data()
        }
    }

    #[test]
    fn failed_append_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");
        {
            let store = JournalBindingStore::open(&path).unwrap();
            store
                .bind(&key("series", "a"), &ScriptedGenerator::new(&["t1"]), 8)
                .unwrap();
        }
        let before = std::fs::read(&path).unwrap();

        let store = JournalBindingStore::open_inner(&path, JournalOptions::default(), |inner| {
            Box::new(TornFile { inner, torn: false })
        })
        .unwrap();
        let err = store
            .bind(&key("series", "b"), &ScriptedGenerator::new(&["t2"]), 8)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.resolve("t2").unwrap().is_none());
        assert!(store.lookup(&key("series", "b")).unwrap().is_none());
        drop(store);

        // The torn half-line was cut back off.
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let reopened = JournalBindingStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(reopened.resolve("t1").unwrap(), Some(key("series", "a")));
        assert!(reopened.resolve("t2").unwrap().is_none());
    }

    #[test]
    fn journal_store_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JournalBindingStore::open(dir.path().join("b.jsonl")).unwrap();
        assert!(store.is_durable());
    }

    #[test]
    fn sync_each_append_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.jsonl");
        let store = JournalBindingStore::open_with(
            &path,
            JournalOptions {
                sync_each_append: true,
            },
        )
        .unwrap();
        store.bind(&key("chapter", "x"), &UuidV4Generator, 8).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}

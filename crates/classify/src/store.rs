use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::persist::RulesError;
use crate::rules::{Categorizer, ClassificationResult, RuleTable};

/// Holds the active rule table.
///
/// Readers take an `Arc` snapshot and classify without holding the lock.
/// A reload parses a complete new table first and only then swaps the
/// pointer, so a failed reload leaves the current table in place.
#[derive(Debug, Default)]
pub struct RuleStore {
    current: RwLock<Arc<RuleTable>>,
}

impl RuleStore {
    pub fn new(table: RuleTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Starts from `path` if it holds a valid table, otherwise from the
    /// built-in defaults.
    pub fn open_or_default(path: &Path) -> Self {
        let store = Self::default();
        store.reload_or_keep(path);
        store
    }

    pub fn snapshot(&self) -> Arc<RuleTable> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn categorizer(&self) -> Categorizer {
        Categorizer::from_snapshot(self.snapshot())
    }

    pub fn classify(&self, description: &str) -> ClassificationResult {
        self.snapshot().classify(description)
    }

    pub fn replace(&self, table: RuleTable) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(table);
    }

    pub fn reload(&self, path: &Path) -> Result<(), RulesError> {
        let table = RuleTable::load(path)?;
        tracing::info!(path = %path.display(), categories = table.len(), "Rule table reloaded");
        self.replace(table);
        Ok(())
    }

    pub fn reload_from<R: Read>(&self, reader: R) -> Result<(), RulesError> {
        let table = RuleTable::read_from(reader)?;
        self.replace(table);
        Ok(())
    }

    /// Like [`reload`](Self::reload), but a failure is logged and the
    /// existing table keeps serving. Returns whether the table changed.
    pub fn reload_or_keep(&self, path: &Path) -> bool {
        match self.reload(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Keeping current rule table: {e}");
                false
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), RulesError> {
        let table = self.snapshot();
        table.save(path)?;
        tracing::info!(path = %path.display(), categories = table.len(), "Rule table saved");
        Ok(())
    }

    pub fn save_to<W: Write>(&self, writer: W) -> Result<(), RulesError> {
        self.snapshot().write_to(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CategoryRule;

    const SAMPLES: &[&str] = &[
        "Whole Foods Market",
        "STARBUCKS #1234",
        "Uber *trip",
        "Netflix.com",
        "Comcast internet",
        "Amazon Mktp",
        "Walgreens 0099",
        "Direct Dep ACME",
        "Zelle payment",
        "",
    ];

    fn custom_table() -> RuleTable {
        RuleTable::new(vec![
            CategoryRule::new("Travel", &["uber", "airline"]),
            CategoryRule::new("Coffee", &["starbucks"]),
        ])
        .unwrap()
    }

    fn classify_samples(store: &RuleStore) -> Vec<ClassificationResult> {
        SAMPLES.iter().map(|d| store.classify(d)).collect()
    }

    #[test]
    fn save_then_load_into_fresh_store_classifies_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");

        let original = RuleStore::new(custom_table());
        original.save(&path).unwrap();

        let fresh = RuleStore::default();
        fresh.reload(&path).unwrap();

        assert_eq!(classify_samples(&fresh), classify_samples(&original));
        assert_eq!(*fresh.snapshot(), custom_table());
    }

    #[test]
    fn stream_save_and_reload() {
        let original = RuleStore::new(custom_table());
        let mut buf = Vec::new();
        original.save_to(&mut buf).unwrap();

        let fresh = RuleStore::default();
        fresh.reload_from(buf.as_slice()).unwrap();
        assert_eq!(classify_samples(&fresh), classify_samples(&original));
    }

    #[test]
    fn reload_from_missing_file_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(custom_table());
        let before = store.classify("Uber to airport");
        assert_eq!(before.category, "Travel");

        let err = store.reload(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, RulesError::NotFound(_)));
        assert!(!store.reload_or_keep(&dir.path().join("nope.toml")));

        assert_eq!(store.classify("Uber to airport"), before);
    }

    #[test]
    fn reload_from_corrupt_file_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "version = 1\n[[rules]]\ncategory = ").unwrap();

        let store = RuleStore::new(custom_table());
        assert!(!store.reload_or_keep(&path));
        assert_eq!(*store.snapshot(), custom_table());
    }

    #[test]
    fn reload_from_corrupt_stream_keeps_table() {
        let store = RuleStore::new(custom_table());
        assert!(store.reload_from(&b"version = 9"[..]).is_err());
        assert_eq!(*store.snapshot(), custom_table());
    }

    #[test]
    fn open_or_default_falls_back_to_builtin_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::open_or_default(&dir.path().join("missing.toml"));
        assert_eq!(*store.snapshot(), RuleTable::default());
    }

    #[test]
    fn snapshot_outlives_replacement() {
        let store = RuleStore::default();
        let old = store.categorizer();
        store.replace(custom_table());

        assert_eq!(old.classify("Uber").category, "Transportation");
        assert_eq!(store.classify("Uber").category, "Travel");
    }

    #[test]
    fn concurrent_readers_during_reload() {
        let store = Arc::new(RuleStore::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let category = store.classify("uber ride").category;
                        assert!(category == "Transportation" || category == "Travel");
                    }
                })
            })
            .collect();
        store.replace(custom_table());
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.classify("uber ride").category, "Travel");
    }
}

//! Persistence collaborator interface.
//!
//! The analysis and report pipelines only see [`ConversationStore`]; the
//! SQLite [`Database`](crate::Database) is the shipped implementation.
//! Writers are assumed to be one-per-record at a time, and an update is a
//! plain read-modify-write where the last write wins.

use crate::types::{Category, ConversationRecord, RecordUpdate};
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Storage for conversation records, partitioned by category.
pub trait ConversationStore: Send + Sync {
    /// All records filed under `category`, oldest first.
    fn load_records(&self, category: Category) -> Result<Vec<ConversationRecord>>;

    /// Insert a record, replacing any record with the same id.
    fn save_record(&self, record: &ConversationRecord) -> Result<()>;

    /// Write analysis results onto an existing record.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) when no record
    /// with `id` exists in `category`.
    fn update_record(&self, category: Category, id: &str, update: &RecordUpdate) -> Result<()>;
}

/// Result of importing a legacy chat store file.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Records imported per category
    pub imported: HashMap<Category, usize>,
    /// Records whose `legalFocus` disagreed with the bucket they were filed in
    pub recategorized: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported.values().sum()
    }
}

#[derive(Debug, Deserialize)]
struct LegacyBucket {
    #[serde(default)]
    chats: Vec<ConversationRecord>,
}

/// Import a legacy chat store file into `store`.
///
/// The file is the JSON document written by the earlier chat tooling:
/// `{"commercial_contracts": {"chats": [...], "lastUpdated": ...}, "privacy": {...}}`.
/// The bucket a chat is filed under wins over its own category field.
pub fn import_chat_store(path: &Path, store: &dyn ConversationStore) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)?;
    let buckets: HashMap<Category, LegacyBucket> = serde_json::from_str(&content)?;

    let mut summary = ImportSummary::default();
    for (category, bucket) in buckets {
        for mut record in bucket.chats {
            if record.category != category {
                tracing::warn!(
                    id = %record.id,
                    filed_under = %category,
                    declared = %record.category,
                    "Chat filed under a different category; using the bucket"
                );
                record.category = category;
                summary.recategorized += 1;
            }
            store.save_record(&record)?;
            *summary.imported.entry(category).or_default() += 1;
        }
    }

    tracing::info!(
        path = %path.display(),
        imported = summary.total(),
        "Imported legacy chat store"
    );
    Ok(summary)
}

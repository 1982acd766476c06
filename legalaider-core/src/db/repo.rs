//! Database repository layer
//!
//! Provides query and insert operations for conversation records and the
//! clustering cache.

use crate::clustering::ClusterCache;
use crate::error::{Error, Result};
use crate::store::ConversationStore;
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Mutex;

/// Record counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    /// All stored conversations
    pub total: i64,
    /// Conversations with time savings populated
    pub analyzed: i64,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Conversation operations
    // ============================================

    /// Insert or replace a conversation record
    pub fn upsert_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let time_savings = record
            .time_savings
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO conversations
                (id, category, created_at, context, turns, metadata, time_savings, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                category = excluded.category,
                created_at = excluded.created_at,
                context = excluded.context,
                turns = excluded.turns,
                metadata = excluded.metadata,
                time_savings = excluded.time_savings,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id,
                record.category.as_str(),
                record.metadata.created_at.to_rfc3339(),
                serde_json::to_string(&record.context)?,
                serde_json::to_string(&record.turns)?,
                serde_json::to_string(&record.metadata)?,
                time_savings,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a conversation by ID
    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM conversations WHERE id = ?",
            [id],
            Self::row_to_conversation,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List conversations in a category, oldest first
    pub fn list_conversations(&self, category: Category) -> Result<Vec<ConversationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM conversations WHERE category = ? ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([category.as_str()], Self::row_to_conversation)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::from)
    }

    /// Overwrite the derived metadata and time savings of one conversation
    pub fn update_conversation_analysis(
        &self,
        category: Category,
        id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        let metadata = serde_json::to_string(&update.metadata)?;
        let time_savings = serde_json::to_string(&update.time_savings)?;

        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            r#"
            UPDATE conversations
            SET metadata = ?1, time_savings = ?2, updated_at = ?3
            WHERE id = ?4 AND category = ?5
            "#,
            params![
                metadata,
                time_savings,
                Utc::now().to_rfc3339(),
                id,
                category.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound {
                category: category.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Count stored and analyzed conversations in a category
    pub fn count_conversations(&self, category: Category) -> Result<CategoryCounts> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT COUNT(*), COUNT(time_savings)
            FROM conversations
            WHERE category = ?
            "#,
            [category.as_str()],
            |row| {
                Ok(CategoryCounts {
                    total: row.get(0)?,
                    analyzed: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
    }

    fn row_to_conversation(row: &Row) -> rusqlite::Result<ConversationRecord> {
        let category_str: String = row.get("category")?;
        let category = category_str.parse::<Category>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into())
        })?;

        Ok(ConversationRecord {
            id: row.get("id")?,
            category,
            context: json_column(row, "context")?,
            turns: json_column(row, "turns")?,
            metadata: json_column(row, "metadata")?,
            time_savings: json_column(row, "time_savings")?,
        })
    }

    // ============================================
    // Cluster cache operations
    // ============================================

    /// Get a cached clustering response by prompt hash
    pub fn get_cluster_response(&self, prompt_hash: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT raw_response FROM cluster_cache WHERE prompt_hash = ?",
            [prompt_hash],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    /// Store a clustering response (replaces any previous one)
    pub fn insert_cluster_response(
        &self,
        prompt_hash: &str,
        kind: &str,
        raw_response: &str,
        created_at: &DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO cluster_cache (prompt_hash, kind, raw_response, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![prompt_hash, kind, raw_response, created_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Decode a JSON text column; NULL decodes as JSON `null`.
fn json_column<T: DeserializeOwned>(row: &Row, name: &str) -> rusqlite::Result<T> {
    let idx = row.as_ref().column_index(name)?;
    let raw: Option<String> = row.get(idx)?;
    serde_json::from_str(raw.as_deref().unwrap_or("null"))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ConversationStore for Database {
    fn load_records(&self, category: Category) -> Result<Vec<ConversationRecord>> {
        self.list_conversations(category)
    }

    fn save_record(&self, record: &ConversationRecord) -> Result<()> {
        self.upsert_conversation(record)
    }

    fn update_record(&self, category: Category, id: &str, update: &RecordUpdate) -> Result<()> {
        self.update_conversation_analysis(category, id, update)
    }
}

impl ClusterCache for Database {
    fn get(&self, prompt_hash: &str) -> Result<Option<String>> {
        self.get_cluster_response(prompt_hash)
    }

    fn put(&self, prompt_hash: &str, kind: &str, raw_response: &str) -> Result<()> {
        self.insert_cluster_response(prompt_hash, kind, raw_response, &Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn record(id: &str, category: Category) -> ConversationRecord {
        ConversationRecord {
            id: id.to_string(),
            category,
            context: ConversationContext {
                user_role: "in-house counsel".to_string(),
                expertise_level: "intermediate".to_string(),
                jurisdiction: "California".to_string(),
                scenario: None,
            },
            turns: vec![ConversationTurn {
                role: Role::User,
                text: "Is a click-wrap agreement enforceable?".to_string(),
                timestamp: Utc::now(),
                kind: TurnKind::Question,
            }],
            metadata: ConversationMetadata {
                created_at: Utc::now(),
                chat_duration_minutes: 0,
                complexity: Complexity::Medium,
                topics: vec![],
                questions: vec![],
            },
            time_savings: None,
        }
    }

    #[test]
    fn test_conversation_round_trip() {
        let db = test_db();
        db.upsert_conversation(&record("c1", Category::Privacy))
            .unwrap();

        let loaded = db.get_conversation("c1").unwrap().unwrap();
        assert_eq!(loaded.category, Category::Privacy);
        assert_eq!(loaded.turns.len(), 1);
        assert!(loaded.time_savings.is_none());
        assert!(db.get_conversation("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_category() {
        let db = test_db();
        db.upsert_conversation(&record("a", Category::Privacy))
            .unwrap();
        db.upsert_conversation(&record("b", Category::CommercialContracts))
            .unwrap();

        let privacy = db.list_conversations(Category::Privacy).unwrap();
        assert_eq!(privacy.len(), 1);
        assert_eq!(privacy[0].id, "a");
    }

    #[test]
    fn test_update_writes_time_savings() {
        let db = test_db();
        let original = record("c1", Category::Privacy);
        db.upsert_conversation(&original).unwrap();

        let update = RecordUpdate {
            metadata: ConversationMetadata {
                chat_duration_minutes: 3,
                topics: vec!["GDPR".to_string()],
                ..original.metadata.clone()
            },
            time_savings: crate::savings::compute(3, &["GDPR"], &["q"], Complexity::Low),
        };
        db.update_record(Category::Privacy, "c1", &update).unwrap();

        let loaded = db.get_conversation("c1").unwrap().unwrap();
        assert_eq!(loaded.metadata.chat_duration_minutes, 3);
        assert_eq!(loaded.time_savings, Some(update.time_savings));

        let counts = db.count_conversations(Category::Privacy).unwrap();
        assert_eq!(counts, CategoryCounts { total: 1, analyzed: 1 });
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let db = test_db();
        db.upsert_conversation(&record("c1", Category::Privacy))
            .unwrap();
        let update = RecordUpdate {
            metadata: record("x", Category::Privacy).metadata,
            time_savings: crate::savings::compute(1, &["a"], &["b"], Complexity::Low),
        };

        let err = db
            .update_record(Category::Privacy, "nope", &update)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { ref id, .. } if id == "nope"));

        // Wrong category is also not found
        let err = db
            .update_record(Category::CommercialContracts, "c1", &update)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_cluster_cache_round_trip() {
        let db = test_db();
        assert!(ClusterCache::get(&db, "abc").unwrap().is_none());
        db.put("abc", "topics", "{\"topics\":[]}").unwrap();
        assert_eq!(
            ClusterCache::get(&db, "abc").unwrap().as_deref(),
            Some("{\"topics\":[]}")
        );
    }
}

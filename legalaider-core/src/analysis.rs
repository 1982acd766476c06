//! Per-conversation analysis.
//!
//! Populates a record's derived metadata and time savings: optional
//! insight extraction through the LLM, then duration estimation and the
//! traditional-time model. A batch fans records out over a bounded rayon
//! pool and writes results back in a single-threaded pass once every
//! record has resolved. One bad conversation never stops the batch.

use crate::estimator;
use crate::llm::{parse_json_response, TextGenerator};
use crate::savings;
use crate::store::ConversationStore;
use crate::types::{Category, Complexity, ConversationMetadata, ConversationRecord, RecordUpdate};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::Deserialize;

const MAX_TRANSCRIPT_CHARS: usize = 16_000;

/// Topics, questions and complexity of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationInsights {
    pub topics: Vec<String>,
    pub questions: Vec<String>,
    pub complexity: Complexity,
}

/// Source of [`ConversationInsights`] for a record.
pub trait InsightExtractor: Send + Sync {
    fn extract(&self, record: &ConversationRecord) -> Result<ConversationInsights>;
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    topics: Vec<String>,
    #[serde(alias = "faqs")]
    questions: Vec<String>,
    complexity: String,
}

/// Asks the text-generation collaborator to read the transcript.
pub struct LlmInsightExtractor<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> LlmInsightExtractor<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }
}

impl InsightExtractor for LlmInsightExtractor<'_> {
    fn extract(&self, record: &ConversationRecord) -> Result<ConversationInsights> {
        let raw = self.generator.generate(&insight_prompt(record))?;
        let parsed: InsightResponse = parse_json_response(&raw)
            .map_err(|e| Error::Llm(format!("insight extraction returned malformed output: {e}")))?;
        let complexity = parsed.complexity.parse::<Complexity>().map_err(Error::Llm)?;

        Ok(ConversationInsights {
            topics: parsed.topics,
            questions: parsed.questions,
            complexity,
        })
    }
}

fn insight_prompt(record: &ConversationRecord) -> String {
    let mut transcript = String::new();
    for turn in &record.turns {
        let line = format!(
            "[{}] {} {}: {}\n",
            turn.timestamp.to_rfc3339(),
            turn.role.as_str(),
            turn.kind.as_str(),
            turn.text.replace('\n', " ")
        );
        transcript.push_str(&line);
        if transcript.len() >= MAX_TRANSCRIPT_CHARS {
            let mut cut = MAX_TRANSCRIPT_CHARS;
            while !transcript.is_char_boundary(cut) {
                cut -= 1;
            }
            transcript.truncate(cut);
            transcript.push_str("\n...[truncated]");
            break;
        }
    }

    format!(
        r#"Read this legal consultation between a {} ({} level, {}) and an AI assistant.

List:
- topics: the distinct legal topics discussed
- questions: the distinct questions the user asked, rephrased as standalone questions
- complexity: "low", "medium" or "high"

Transcript:
{}
Respond with JSON only: {{"topics": ["..."], "questions": ["..."], "complexity": "medium"}}"#,
        record.context.user_role,
        record.context.expertise_level,
        record.context.jurisdiction,
        transcript
    )
}

/// Drop duplicates and blanks, keeping first occurrences in order.
fn distinct(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Options for [`ConversationAnalyzer::analyze_batch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Compute but do not write back
    pub dry_run: bool,
    /// Re-analyze records that already have time savings
    pub force: bool,
    /// Worker threads for per-record analysis
    pub max_parallelism: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            max_parallelism: 4,
        }
    }
}

/// Outcome of an analysis batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Records loaded for the category
    pub total: usize,
    /// Records skipped because they were already analyzed
    pub skipped: usize,
    /// Records analyzed successfully
    pub analyzed: usize,
    /// Records written back to the store
    pub updated: usize,
    /// Records that failed analysis or write-back
    pub failed: usize,
    /// (record id, error) for every record that failed
    pub failures: Vec<(String, String)>,
    pub dry_run: bool,
}

/// Runs the duration estimator and time model over conversation records.
#[derive(Default)]
pub struct ConversationAnalyzer<'a> {
    extractor: Option<&'a dyn InsightExtractor>,
}

impl<'a> ConversationAnalyzer<'a> {
    pub fn new() -> Self {
        Self { extractor: None }
    }

    /// Take topics, questions and complexity from `extractor` instead of
    /// the stored metadata.
    pub fn with_extractor(mut self, extractor: &'a dyn InsightExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Analyze one record. Pure apart from the optional extractor call.
    pub fn analyze(&self, record: &ConversationRecord) -> Result<RecordUpdate> {
        let insights = match self.extractor {
            Some(extractor) => extractor.extract(record)?,
            None => {
                let questions = if record.metadata.questions.is_empty() {
                    record.user_questions().map(str::to_string).collect()
                } else {
                    record.metadata.questions.clone()
                };
                ConversationInsights {
                    topics: record.metadata.topics.clone(),
                    questions,
                    complexity: record.metadata.complexity,
                }
            }
        };

        let topics = distinct(insights.topics);
        let questions = distinct(insights.questions);
        let chat_duration_minutes = estimator::estimate(&record.turns);
        let time_savings =
            savings::compute(chat_duration_minutes, &topics, &questions, insights.complexity);

        Ok(RecordUpdate {
            metadata: ConversationMetadata {
                created_at: record.metadata.created_at,
                chat_duration_minutes,
                complexity: insights.complexity,
                topics,
                questions,
            },
            time_savings,
        })
    }

    /// Analyze every record in `category` and write the results back.
    ///
    /// Failing to load the category is fatal. Failures on individual
    /// records, in analysis or on write-back, are logged and counted.
    pub fn analyze_batch(
        &self,
        store: &dyn ConversationStore,
        category: Category,
        options: BatchOptions,
    ) -> Result<BatchSummary> {
        let records = store.load_records(category)?;
        let mut summary = BatchSummary {
            total: records.len(),
            dry_run: options.dry_run,
            ..Default::default()
        };

        let pending: Vec<&ConversationRecord> = records
            .iter()
            .filter(|r| options.force || r.time_savings.is_none())
            .collect();
        summary.skipped = records.len() - pending.len();

        tracing::info!(
            category = %category,
            total = summary.total,
            pending = pending.len(),
            dry_run = options.dry_run,
            "Starting analysis batch"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_parallelism.max(1))
            .build()
            .map_err(|e| Error::Config(format!("failed to build analysis thread pool: {e}")))?;

        let results: Vec<(&ConversationRecord, Result<RecordUpdate>)> = pool.install(|| {
            pending
                .par_iter()
                .map(|record| (*record, self.analyze(record)))
                .collect()
        });

        for (record, result) in results {
            let update = match result {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "Failed to analyze conversation");
                    summary.failed += 1;
                    summary.failures.push((record.id.clone(), e.to_string()));
                    continue;
                }
            };
            summary.analyzed += 1;

            tracing::info!(
                id = %record.id,
                chat_minutes = update.metadata.chat_duration_minutes,
                traditional_minutes = update.time_savings.traditional_duration_minutes,
                time_saved = update.time_savings.time_saved_minutes,
                topics = update.metadata.topics.len(),
                questions = update.metadata.questions.len(),
                "Analyzed conversation"
            );

            if options.dry_run {
                tracing::info!(id = %record.id, "Dry run; not updating conversation");
                continue;
            }

            match store.update_record(category, &record.id, &update) {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "Failed to store analysis");
                    summary.failed += 1;
                    summary.failures.push((record.id.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            category = %category,
            analyzed = summary.analyzed,
            updated = summary.updated,
            failed = summary.failed,
            "Analysis batch complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FixedGenerator(&'static str);

    /// Record store held in memory; updates apply in place.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<ConversationRecord>>,
    }

    impl ConversationStore for MemoryStore {
        fn load_records(&self, category: Category) -> Result<Vec<ConversationRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|r| r.category == category).cloned().collect())
        }

        fn save_record(&self, record: &ConversationRecord) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            records.retain(|r| r.id != record.id);
            records.push(record.clone());
            Ok(())
        }

        fn update_record(&self, category: Category, id: &str, update: &RecordUpdate) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.category == category && r.id == id)
                .ok_or_else(|| Error::NotFound {
                    category: category.to_string(),
                    id: id.to_string(),
                })?;
            record.apply(update);
            Ok(())
        }
    }

    impl TextGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn record(turns: Vec<(Role, TurnKind, &str)>) -> ConversationRecord {
        ConversationRecord {
            id: "c1".to_string(),
            category: Category::Privacy,
            context: ConversationContext {
                user_role: "privacy officer".to_string(),
                expertise_level: "expert".to_string(),
                jurisdiction: "EU".to_string(),
                scenario: None,
            },
            turns: turns
                .into_iter()
                .map(|(role, kind, text)| ConversationTurn {
                    role,
                    text: text.to_string(),
                    timestamp: Utc::now(),
                    kind,
                })
                .collect(),
            metadata: ConversationMetadata {
                created_at: Utc::now(),
                chat_duration_minutes: 0,
                complexity: Complexity::Medium,
                topics: vec!["GDPR".to_string(), "Transfers".to_string(), "GDPR".to_string()],
                questions: vec![],
            },
            time_savings: None,
        }
    }

    #[test]
    fn analyze_uses_stored_metadata_and_user_questions() {
        let record = record(vec![
            (Role::User, TurnKind::Question, "a b c d e"),
            (Role::Assistant, TurnKind::Answer, "answer"),
            (Role::User, TurnKind::FollowUp, "more"),
        ]);

        let update = ConversationAnalyzer::new().analyze(&record).unwrap();
        assert_eq!(update.metadata.topics, vec!["GDPR", "Transfers"]);
        assert_eq!(update.metadata.questions, vec!["a b c d e"]);
        // 2.0375 + 0.0075 + 2.0075 = 4.0525
        assert_eq!(update.metadata.chat_duration_minutes, 5);
        // two topics, one question, medium -> 108
        assert_eq!(update.time_savings.traditional_duration_minutes, 108);
        assert_eq!(update.time_savings.time_saved_minutes, 103);
    }

    #[test]
    fn analyze_with_llm_extractor() {
        let generator = FixedGenerator(
            "```json\n{\"topics\": [\"Cookies\"], \"questions\": [\"Do we need consent for analytics cookies?\"], \"complexity\": \"High\"}\n```",
        );
        let extractor = LlmInsightExtractor::new(&generator);
        let analyzer = ConversationAnalyzer::new().with_extractor(&extractor);

        let update = analyzer
            .analyze(&record(vec![(Role::User, TurnKind::Question, "cookies?")]))
            .unwrap();
        assert_eq!(update.metadata.complexity, Complexity::High);
        assert_eq!(update.metadata.topics, vec!["Cookies"]);
        // single topic and question, high -> 75 * 1.5
        assert_eq!(update.time_savings.factors.legal_research, 45);
    }

    #[test]
    fn malformed_extraction_fails_the_record() {
        let generator = FixedGenerator("{\"topics\": [\"x\"]}");
        let extractor = LlmInsightExtractor::new(&generator);
        let analyzer = ConversationAnalyzer::new().with_extractor(&extractor);

        assert!(analyzer
            .analyze(&record(vec![(Role::User, TurnKind::Question, "q")]))
            .is_err());
    }

    #[test]
    fn insight_prompt_truncates_long_transcripts() {
        let long = "é".repeat(MAX_TRANSCRIPT_CHARS);
        let prompt = insight_prompt(&record(vec![(Role::User, TurnKind::Question, long.as_str())]));
        assert!(prompt.contains("...[truncated]"));
        assert!(prompt.contains("privacy officer"));
    }

    #[test]
    fn distinct_trims_and_dedups() {
        let items = vec![" a ".to_string(), "b".to_string(), "a".to_string(), "  ".to_string()];
        assert_eq!(distinct(items), vec!["a", "b"]);
    }

    #[test]
    fn batch_applies_updates_to_store() {
        let store = MemoryStore::default();
        let mut second = record(vec![(Role::User, TurnKind::Question, "a b c d e")]);
        second.id = "c2".to_string();
        store
            .save_record(&record(vec![(Role::User, TurnKind::Question, "q")]))
            .unwrap();
        store.save_record(&second).unwrap();

        let summary = ConversationAnalyzer::new()
            .analyze_batch(&store, Category::Privacy, BatchOptions::default())
            .unwrap();
        assert_eq!(summary.updated, 2);

        let records = store.load_records(Category::Privacy).unwrap();
        let c2 = records.iter().find(|r| r.id == "c2").unwrap();
        assert_eq!(c2.metadata.chat_duration_minutes, 3);
        assert_eq!(c2.metadata.topics, vec!["GDPR", "Transfers"]);
        assert!(records.iter().all(|r| r.time_savings.is_some()));
    }

    #[test]
    fn apply_overwrites_previous_analysis() {
        let mut target = record(vec![(Role::User, TurnKind::Question, "a b c d e")]);
        let analyzer = ConversationAnalyzer::new();

        let first = analyzer.analyze(&target).unwrap();
        target.apply(&first);
        target.metadata.complexity = Complexity::High;
        let second = analyzer.analyze(&target).unwrap();
        target.apply(&second);

        assert_eq!(target.metadata.complexity, Complexity::High);
        assert_eq!(target.time_savings, Some(second.time_savings));
        assert_ne!(first.time_savings, second.time_savings);
    }

    #[test]
    fn dry_run_leaves_memory_store_untouched() {
        let store = MemoryStore::default();
        store
            .save_record(&record(vec![(Role::User, TurnKind::Question, "q")]))
            .unwrap();

        let summary = ConversationAnalyzer::new()
            .analyze_batch(
                &store,
                Category::Privacy,
                BatchOptions {
                    dry_run: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(summary.analyzed, 1);
        assert_eq!(summary.updated, 0);
        assert!(store.load_records(Category::Privacy).unwrap()[0]
            .time_savings
            .is_none());
    }
}

//! Report assembly.
//!
//! Combines the stored per-conversation results of one category into a
//! single [`Report`]. Values are copied from each record's stored time
//! savings, never recomputed. Any failure aborts the whole report; a
//! partial report is never returned.

use crate::charts;
use crate::clustering::TopicFaqAggregator;
use crate::store::ConversationStore;
use crate::types::{
    Category, ConversationRecord, ConversationSavings, Report, TimeSavingsSummary,
};
use crate::{Error, Result};
use chrono::Utc;

/// Builds reports from analyzed conversation records.
pub struct ReportAssembler<'a> {
    aggregator: TopicFaqAggregator<'a>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(aggregator: TopicFaqAggregator<'a>) -> Self {
        Self { aggregator }
    }

    /// Load every record in `category` from `store` and assemble a report.
    pub fn generate(&self, store: &dyn ConversationStore, category: Category) -> Result<Report> {
        let records = store.load_records(category)?;
        tracing::info!(category = %category, records = records.len(), "Generating report");
        self.assemble(category, &records)
    }

    /// Assemble a report from records that have already been analyzed.
    ///
    /// An empty record list yields an empty report without calling the
    /// clustering collaborator. Any record without time savings fails with
    /// [`Error::MissingTimeSavings`] before clustering starts.
    pub fn assemble(&self, category: Category, records: &[ConversationRecord]) -> Result<Report> {
        let mut report = Report {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            generated_at: Utc::now(),
            conversation_count: records.len(),
            topic_clusters: Vec::new(),
            faq_clusters: Vec::new(),
            time_savings_summary: TimeSavingsSummary::default(),
            per_conversation: Vec::new(),
            chart_series: Vec::new(),
        };

        if records.is_empty() {
            tracing::info!(category = %category, "No conversations; returning empty report");
            return Ok(report);
        }

        let per_conversation = per_conversation_savings(records)?;

        let topics: Vec<String> = records
            .iter()
            .flat_map(|r| r.metadata.topics.iter().cloned())
            .collect();
        let questions: Vec<String> = records
            .iter()
            .flat_map(|r| r.user_questions().map(str::to_string))
            .collect();

        report.topic_clusters = self.aggregator.cluster_topics(&topics)?;
        report.faq_clusters = self.aggregator.cluster_faqs(&questions)?;
        report.time_savings_summary = summarize(&per_conversation);
        report.per_conversation = per_conversation;
        report.chart_series = charts::build(&report);

        tracing::info!(
            category = %category,
            conversations = report.conversation_count,
            total_time_saved = report.time_savings_summary.total_time_saved,
            "Report assembled"
        );
        Ok(report)
    }
}

/// Copy each record's stored savings into a report row.
///
/// Fails on the first record that has not been analyzed.
pub fn per_conversation_savings(records: &[ConversationRecord]) -> Result<Vec<ConversationSavings>> {
    records
        .iter()
        .map(|record| {
            let savings = record
                .time_savings
                .as_ref()
                .ok_or_else(|| Error::MissingTimeSavings(record.id.clone()))?;
            Ok(ConversationSavings {
                id: record.id.clone(),
                chat_duration: record.metadata.chat_duration_minutes,
                traditional_duration: savings.traditional_duration_minutes,
                time_saved: savings.time_saved_minutes,
                factors: savings.factors,
            })
        })
        .collect()
}

/// Sum per-conversation rows into fleet-wide totals.
///
/// The average is 0 for an empty slice.
pub fn summarize(rows: &[ConversationSavings]) -> TimeSavingsSummary {
    let total_time_saved: i64 = rows.iter().map(|r| r.time_saved).sum();
    let total_traditional_time: i64 = rows.iter().map(|r| i64::from(r.traditional_duration)).sum();
    let total_ai_time: i64 = rows.iter().map(|r| i64::from(r.chat_duration)).sum();

    let average_time_saved_per_conversation = if rows.is_empty() {
        0.0
    } else {
        total_time_saved as f64 / rows.len() as f64
    };

    TimeSavingsSummary {
        total_time_saved,
        average_time_saved_per_conversation,
        total_traditional_time,
        total_ai_time,
    }
}

//! Core domain types for legalaider
//!
//! These types are the data contract shared by the analysis step, the
//! report pipeline and the external renderer. Field names serialize as
//! camelCase; the renderer depends on them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Conversation** | One stored legal Q&A session between a person and the AI |
//! | **Turn** | A single message in a conversation, authored by the user or the assistant |
//! | **Category** | The legal focus a conversation is filed under |
//! | **Factor** | One named component of the modeled traditional-method time |
//! | **Cluster** | A named group of similar topics or questions |
//!
//! ### Legacy field names
//!
//! Conversation stores written by earlier tooling used `legalFocus`,
//! `messages`, `content`, `messageType` and `metadata`. Those names are
//! accepted on input through serde aliases and never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Category
// ============================================

/// Legal focus a conversation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CommercialContracts,
    Privacy,
}

impl Category {
    /// Every supported category, in display order.
    pub const ALL: [Category; 2] = [Category::CommercialContracts, Category::Privacy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CommercialContracts => "commercial_contracts",
            Category::Privacy => "privacy",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commercial_contracts" => Ok(Category::CommercialContracts),
            "privacy" => Ok(Category::Privacy),
            _ => Err(format!(
                "unknown category: {} (expected commercial_contracts or privacy)",
                s
            )),
        }
    }
}

// ============================================
// Turns
// ============================================

/// Who authored a turn.
///
/// `User` is always the human party; it is the only role charged the
/// response-formulation time by the duration estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Semantic kind of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnKind {
    #[serde(rename = "question")]
    Question,
    #[serde(rename = "answer")]
    Answer,
    #[serde(rename = "follow-up")]
    FollowUp,
}

impl TurnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnKind::Question => "question",
            TurnKind::Answer => "answer",
            TurnKind::FollowUp => "follow-up",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    #[serde(alias = "content")]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "messageType")]
    pub kind: TurnKind,
}

impl ConversationTurn {
    /// Whether this turn is a question posed by the human party.
    pub fn is_user_question(&self) -> bool {
        self.role == Role::User && self.kind == TurnKind::Question
    }
}

// ============================================
// Conversation records
// ============================================

/// Declared complexity of a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl std::str::FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(format!("unknown complexity: {}", other)),
        }
    }
}

/// Who was asking, and under which law.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub user_role: String,
    pub expertise_level: String,
    pub jurisdiction: String,
    /// Free-form scenario description, when the source recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

/// Metadata derived from a conversation by the analysis step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub created_at: DateTime<Utc>,
    /// Estimated time spent in the AI consultation (minutes)
    #[serde(default, alias = "chatDuration")]
    pub chat_duration_minutes: u32,
    #[serde(default)]
    pub complexity: Complexity,
    /// Legal topics discussed
    #[serde(default)]
    pub topics: Vec<String>,
    /// Questions asked, as distinct strings
    #[serde(default, alias = "faqs")]
    pub questions: Vec<String>,
}

/// Modeled traditional-method time, split into named factors (minutes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFactors {
    pub legal_research: u32,
    pub document_review: u32,
    pub preparation: u32,
    pub follow_up: u32,
}

impl TimeFactors {
    /// Sum of all factors.
    pub fn total(&self) -> u32 {
        self.legal_research + self.document_review + self.preparation + self.follow_up
    }
}

/// Time savings for one conversation.
///
/// `factors.total() == traditional_duration_minutes` and
/// `time_saved_minutes == traditional_duration_minutes - chat duration`.
/// Time saved may be negative when the AI session ran long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSavingsBreakdown {
    #[serde(alias = "traditionalDuration")]
    pub traditional_duration_minutes: u32,
    #[serde(alias = "timeSaved")]
    pub time_saved_minutes: i64,
    pub factors: TimeFactors,
}

/// A stored legal Q&A session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    /// Unique, stable identifier
    pub id: String,
    #[serde(alias = "legalFocus")]
    pub category: Category,
    pub context: ConversationContext,
    /// Ordered turns; order is significant for duration estimation
    #[serde(alias = "messages")]
    pub turns: Vec<ConversationTurn>,
    #[serde(rename = "derivedMetadata", alias = "metadata")]
    pub metadata: ConversationMetadata,
    /// Absent until the analysis step has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_savings: Option<TimeSavingsBreakdown>,
}

impl ConversationRecord {
    /// Text of every question the user asked, in turn order.
    pub fn user_questions(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.is_user_question())
            .map(|t| t.text.as_str())
    }

    /// Apply an analysis result in place (last write wins).
    pub fn apply(&mut self, update: &RecordUpdate) {
        self.metadata = update.metadata.clone();
        self.time_savings = Some(update.time_savings);
    }
}

/// Fields the analysis step writes back onto a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    pub metadata: ConversationMetadata,
    pub time_savings: TimeSavingsBreakdown,
}

// ============================================
// Clusters
// ============================================

/// A named group of related legal topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCluster {
    /// Broad legal area
    pub name: String,
    /// High-level concepts, normally 2-3
    pub themes: Vec<String>,
    pub frequency: u32,
    /// Specific instances drawn from the source topics
    #[serde(default, alias = "exampleTopics")]
    pub example_instances: Vec<String>,
}

/// A thematic group of similar user questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqCluster {
    pub theme: String,
    pub representative_question: String,
    pub count: u32,
    /// Normally 2-3 variations
    #[serde(default)]
    pub similar_questions: Vec<String>,
}

// ============================================
// Report
// ============================================

/// Fleet-wide totals (minutes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSavingsSummary {
    pub total_time_saved: i64,
    pub average_time_saved_per_conversation: f64,
    pub total_traditional_time: i64,
    pub total_ai_time: i64,
}

/// Per-conversation row of the report, copied from stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSavings {
    pub id: String,
    pub chat_duration: u32,
    pub traditional_duration: u32,
    pub time_saved: i64,
    pub factors: TimeFactors,
}

/// Chart style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
}

/// A chart-ready series; `labels` and `values` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub title: String,
}

/// Aggregate report for one category, handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub category: Category,
    pub generated_at: DateTime<Utc>,
    pub conversation_count: usize,
    pub topic_clusters: Vec<TopicCluster>,
    pub faq_clusters: Vec<FaqCluster>,
    pub time_savings_summary: TimeSavingsSummary,
    pub per_conversation: Vec<ConversationSavings>,
    pub chart_series: Vec<ChartSeries>,
}

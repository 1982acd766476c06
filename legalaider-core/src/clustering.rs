//! Topic and FAQ clustering.
//!
//! Raw per-conversation topics and questions are grouped into named
//! clusters by the text-generation collaborator. This module owns the
//! prompt, the response contract and the failure modes:
//!
//! - Output that does not parse into the expected shape is a
//!   [`Error::ClusteringFormat`]; there is no fallback to empty clusters.
//! - A call that exceeds the collaborator's time budget is a
//!   [`Error::CollaboratorTimeout`] and its output is discarded.
//! - Counts are heuristic. The sum of frequencies is logged next to the
//!   input size but never checked.
//!
//! The same input always produces the same prompt, so calls can be repeated
//! safely. With a [`ClusterCache`] attached, a repeated prompt reuses the
//! stored response instead of calling the collaborator again.

use crate::llm::{parse_json_response, TextGenerator};
use crate::types::{FaqCluster, TopicCluster};
use crate::{Error, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Instant;

/// Which clustering operation is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    Topics,
    Faqs,
}

impl ClusterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterKind::Topics => "topics",
            ClusterKind::Faqs => "faqs",
        }
    }
}

/// Storage for raw clustering responses keyed by prompt hash.
pub trait ClusterCache: Send + Sync {
    fn get(&self, prompt_hash: &str) -> Result<Option<String>>;
    fn put(&self, prompt_hash: &str, kind: &str, raw_response: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TopicResponse {
    topics: Vec<TopicCluster>,
}

#[derive(Debug, Deserialize)]
struct FaqResponse {
    faqs: Vec<FaqCluster>,
}

/// Groups topics and questions through the text-generation collaborator.
pub struct TopicFaqAggregator<'a> {
    generator: &'a dyn TextGenerator,
    cache: Option<&'a dyn ClusterCache>,
}

impl<'a> TopicFaqAggregator<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator,
            cache: None,
        }
    }

    /// Reuse stored responses for prompts seen before.
    pub fn with_cache(mut self, cache: &'a dyn ClusterCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Group legal topics into 3-5 named categories.
    ///
    /// Empty input yields no clusters without calling the collaborator.
    pub fn cluster_topics(&self, topics: &[String]) -> Result<Vec<TopicCluster>> {
        if topics.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = topic_prompt(topics);
        let clusters = self.run(ClusterKind::Topics, &prompt, |raw| {
            let parsed: TopicResponse =
                parse_json_response(raw).map_err(|e| format_error(ClusterKind::Topics, e))?;
            validate_topics(&parsed.topics)?;
            Ok(parsed.topics)
        })?;

        let frequency_total: u64 = clusters.iter().map(|c| u64::from(c.frequency)).sum();
        tracing::info!(
            input_count = topics.len(),
            cluster_count = clusters.len(),
            frequency_total,
            "Clustered topics"
        );
        Ok(clusters)
    }

    /// Group user questions into thematic FAQ clusters.
    ///
    /// Empty input yields no clusters without calling the collaborator.
    pub fn cluster_faqs(&self, questions: &[String]) -> Result<Vec<FaqCluster>> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = faq_prompt(questions);
        let clusters = self.run(ClusterKind::Faqs, &prompt, |raw| {
            let parsed: FaqResponse =
                parse_json_response(raw).map_err(|e| format_error(ClusterKind::Faqs, e))?;
            validate_faqs(&parsed.faqs)?;
            Ok(parsed.faqs)
        })?;

        let count_total: u64 = clusters.iter().map(|c| u64::from(c.count)).sum();
        tracing::info!(
            input_count = questions.len(),
            cluster_count = clusters.len(),
            count_total,
            "Clustered questions"
        );
        Ok(clusters)
    }

    fn run<T>(
        &self,
        kind: ClusterKind,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T>,
    ) -> Result<T> {
        let prompt_hash = hex::encode(Sha256::digest(prompt.as_bytes()));

        if let Some(cache) = self.cache {
            if let Some(raw) = cache.get(&prompt_hash)? {
                match parse(&raw) {
                    Ok(value) => {
                        tracing::debug!(kind = kind.as_str(), %prompt_hash, "Using cached clusters");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(kind = kind.as_str(), error = %e, "Ignoring unusable cached clusters");
                    }
                }
            }
        }

        let timeout_ms = self.generator.timeout_ms();
        let start = Instant::now();
        let raw = self.generator.generate(prompt)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if duration_ms > timeout_ms {
            tracing::warn!(
                kind = kind.as_str(),
                duration_ms,
                timeout_ms,
                "Clustering exceeded timeout; discarding response"
            );
            return Err(Error::CollaboratorTimeout {
                operation: format!("{} clustering", kind.as_str()),
                timeout_ms,
            });
        }

        let value = parse(&raw).map_err(|e| {
            tracing::error!(kind = kind.as_str(), raw_response = %raw, "Malformed clustering response");
            e
        })?;

        if let Some(cache) = self.cache {
            if let Err(e) = cache.put(&prompt_hash, kind.as_str(), &raw) {
                tracing::warn!(error = %e, "Failed to cache clustering response");
            }
        }

        Ok(value)
    }
}

fn format_error(kind: ClusterKind, message: impl Into<String>) -> Error {
    Error::ClusteringFormat {
        kind: kind.as_str().to_string(),
        message: message.into(),
    }
}

fn validate_topics(clusters: &[TopicCluster]) -> Result<()> {
    if clusters.is_empty() {
        return Err(format_error(ClusterKind::Topics, "no clusters returned"));
    }
    for cluster in clusters {
        if cluster.name.trim().is_empty() {
            return Err(format_error(ClusterKind::Topics, "cluster with empty name"));
        }
        if cluster.frequency == 0 {
            return Err(format_error(
                ClusterKind::Topics,
                format!("cluster '{}' has frequency 0", cluster.name),
            ));
        }
        if !(2..=3).contains(&cluster.themes.len()) {
            tracing::warn!(
                cluster = %cluster.name,
                themes = cluster.themes.len(),
                "Topic cluster theme count outside 2-3"
            );
        }
    }
    Ok(())
}

fn validate_faqs(clusters: &[FaqCluster]) -> Result<()> {
    if clusters.is_empty() {
        return Err(format_error(ClusterKind::Faqs, "no clusters returned"));
    }
    for cluster in clusters {
        if cluster.theme.trim().is_empty() {
            return Err(format_error(ClusterKind::Faqs, "cluster with empty theme"));
        }
        if cluster.count == 0 {
            return Err(format_error(
                ClusterKind::Faqs,
                format!("cluster '{}' has count 0", cluster.theme),
            ));
        }
        if !(2..=3).contains(&cluster.similar_questions.len()) {
            tracing::warn!(
                cluster = %cluster.theme,
                similar = cluster.similar_questions.len(),
                "FAQ cluster similar-question count outside 2-3"
            );
        }
    }
    Ok(())
}

fn topic_prompt(topics: &[String]) -> String {
    format!(
        r#"Group the legal topics below into 3-5 categories.

For each category give:
- name: a broad legal area
- themes: 2-3 high-level legal concepts that define the category
- frequency: how many of the listed topics fall into the category
- exampleTopics: topics copied verbatim from the list that belong to the category

Topics:
{}

Respond with JSON only, in exactly this shape:
{{"topics": [{{"name": "...", "themes": ["..."], "frequency": 1, "exampleTopics": ["..."]}}]}}"#,
        topics.join("\n")
    )
}

fn faq_prompt(questions: &[String]) -> String {
    format!(
        r#"Group the questions below, asked by legal professionals, into thematic groups.

For each group give:
- theme: the core legal concept the questions share
- representativeQuestion: one question that is specific enough to show expertise and general enough to apply to many legal teams
- count: the number of listed questions that are exact or very close matches for the group
- similarQuestions: 2-3 questions from the list showing the range of the group

Questions:
{}

Respond with JSON only, in exactly this shape:
{{"faqs": [{{"theme": "...", "representativeQuestion": "...", "count": 1, "similarQuestions": ["..."]}}]}}"#,
        questions.join("\n")
    )
}

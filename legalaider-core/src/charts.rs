//! Chart series derived from an assembled report.
//!
//! Pure and deterministic: the same report always yields the same three
//! series, in this order:
//! 1. pie of topic cluster names vs frequency
//! 2. bar of traditional vs AI minutes
//! 3. pie of FAQ themes vs count

use crate::types::{ChartKind, ChartSeries, Report};

pub const TOPIC_CHART_TITLE: &str = "Distribution of Legal Topics";
pub const TIME_CHART_TITLE: &str = "Time Comparison: AI vs Traditional";
pub const FAQ_CHART_TITLE: &str = "Distribution of Question Types";

/// Build the chart series for `report`.
pub fn build(report: &Report) -> Vec<ChartSeries> {
    let summary = &report.time_savings_summary;

    vec![
        ChartSeries {
            kind: ChartKind::Pie,
            labels: report.topic_clusters.iter().map(|c| c.name.clone()).collect(),
            values: report
                .topic_clusters
                .iter()
                .map(|c| f64::from(c.frequency))
                .collect(),
            title: TOPIC_CHART_TITLE.to_string(),
        },
        ChartSeries {
            kind: ChartKind::Bar,
            labels: vec!["traditional".to_string(), "ai".to_string()],
            values: vec![
                summary.total_traditional_time as f64,
                summary.total_ai_time as f64,
            ],
            title: TIME_CHART_TITLE.to_string(),
        },
        ChartSeries {
            kind: ChartKind::Pie,
            labels: report.faq_clusters.iter().map(|c| c.theme.clone()).collect(),
            values: report
                .faq_clusters
                .iter()
                .map(|c| f64::from(c.count))
                .collect(),
            title: FAQ_CHART_TITLE.to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use chrono::Utc;

    fn report() -> Report {
        Report {
            id: "r1".to_string(),
            category: Category::Privacy,
            generated_at: Utc::now(),
            conversation_count: 2,
            topic_clusters: vec![
                TopicCluster {
                    name: "Data Protection".to_string(),
                    themes: vec!["Consent".to_string(), "Transfers".to_string()],
                    frequency: 4,
                    example_instances: vec![],
                },
                TopicCluster {
                    name: "Breach Response".to_string(),
                    themes: vec!["Notification".to_string(), "Timelines".to_string()],
                    frequency: 1,
                    example_instances: vec![],
                },
            ],
            faq_clusters: vec![FaqCluster {
                theme: "DSARs".to_string(),
                representative_question: "How fast must we answer a DSAR?".to_string(),
                count: 3,
                similar_questions: vec![],
            }],
            time_savings_summary: TimeSavingsSummary {
                total_time_saved: 150,
                average_time_saved_per_conversation: 75.0,
                total_traditional_time: 170,
                total_ai_time: 20,
            },
            per_conversation: vec![],
            chart_series: vec![],
        }
    }

    #[test]
    fn builds_three_series_in_fixed_order() {
        let series = build(&report());
        assert_eq!(series.len(), 3);

        assert_eq!(series[0].kind, ChartKind::Pie);
        assert_eq!(series[0].labels, vec!["Data Protection", "Breach Response"]);
        assert_eq!(series[0].values, vec![4.0, 1.0]);

        assert_eq!(series[1].kind, ChartKind::Bar);
        assert_eq!(series[1].labels, vec!["traditional", "ai"]);
        assert_eq!(series[1].values, vec![170.0, 20.0]);

        assert_eq!(series[2].kind, ChartKind::Pie);
        assert_eq!(series[2].labels, vec!["DSARs"]);
        assert_eq!(series[2].values, vec![3.0]);
        assert_eq!(series[2].title, FAQ_CHART_TITLE);
    }

    #[test]
    fn labels_and_values_have_equal_length() {
        let mut empty = report();
        empty.topic_clusters.clear();
        empty.faq_clusters.clear();

        for series in build(&report()).iter().chain(build(&empty).iter()) {
            assert_eq!(series.labels.len(), series.values.len());
        }
        assert_eq!(build(&empty).len(), 3);
    }

    #[test]
    fn build_is_deterministic() {
        let report = report();
        assert_eq!(build(&report), build(&report));
    }
}

//! legalaider - time-savings reports for AI-assisted legal consultations
//!
//! Imports conversation records, runs the time-savings analysis over them
//! and prints per-category reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legalaider_core::analysis::{
    BatchOptions, BatchSummary, ConversationAnalyzer, LlmInsightExtractor,
};
use legalaider_core::clustering::TopicFaqAggregator;
use legalaider_core::llm::create_text_generator;
use legalaider_core::report::ReportAssembler;
use legalaider_core::store::import_chat_store;
use legalaider_core::{Category, Config, Database, Report};

#[derive(Parser, Debug)]
#[command(name = "legalaider")]
#[command(about = "Time-savings accounting for AI legal consultations")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a chat store JSON file
    Import {
        /// Path to the chat store file
        file: PathBuf,
    },

    /// Compute chat duration and time savings for every conversation
    Analyze {
        /// commercial_contracts or privacy
        category: Category,

        /// Compute and log results without writing them back
        #[arg(long)]
        dry_run: bool,

        /// Re-analyze conversations that already have time savings
        #[arg(long)]
        force: bool,
    },

    /// Build the aggregate report for a category
    Report {
        /// commercial_contracts or privacy
        category: Category,

        /// Export format (json)
        #[arg(long)]
        export: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        legalaider_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    match args.command {
        Command::Import { file } => run_import(&db, &file),
        Command::Analyze {
            category,
            dry_run,
            force,
        } => run_analyze(&config, &db, category, dry_run, force),
        Command::Report { category, export } => {
            run_report(&config, &db, category, export.as_deref())
        }
    }
}

fn run_import(db: &Database, file: &Path) -> Result<()> {
    let summary = import_chat_store(file, db)
        .with_context(|| format!("failed to import {}", file.display()))?;

    println!("Imported {} conversation(s)", summary.total());
    for category in Category::ALL {
        let count = summary.imported.get(&category).copied().unwrap_or(0);
        println!("   {:<22} {}", category.as_str(), count);
    }
    if summary.recategorized > 0 {
        println!(
            "   {} conversation(s) were filed under a different category than they declared",
            summary.recategorized
        );
    }
    Ok(())
}

fn run_analyze(
    config: &Config,
    db: &Database,
    category: Category,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let options = BatchOptions {
        dry_run,
        force,
        max_parallelism: config.analysis.max_parallelism,
    };

    let result = if config.analysis.extract_insights {
        let generator = create_text_generator(config.require_llm()?)
            .context("failed to create LLM client")?;
        let extractor = LlmInsightExtractor::new(generator.as_ref());
        ConversationAnalyzer::new()
            .with_extractor(&extractor)
            .analyze_batch(db, category, options)
    } else {
        ConversationAnalyzer::new().analyze_batch(db, category, options)
    };
    let summary = result.with_context(|| format!("failed to analyze {}", category))?;

    print_batch_summary(category, &summary);

    let counts = db.count_conversations(category)?;
    println!(
        "   {} of {} conversation(s) in {} have time savings",
        counts.analyzed, counts.total, category
    );
    Ok(())
}

fn print_batch_summary(category: Category, summary: &BatchSummary) {
    if summary.dry_run {
        println!("Dry run for {} (nothing written)", category);
    } else {
        println!("Analysis for {}", category);
    }
    println!(
        "   Loaded: {:<6} Skipped: {:<6} Analyzed: {:<6} Updated: {:<6} Failed: {}",
        summary.total, summary.skipped, summary.analyzed, summary.updated, summary.failed
    );
    for (id, error) in &summary.failures {
        println!("   ! {}: {}", id, error);
    }
    if summary.failed > 0 {
        println!(
            "   See the logs in {} for details",
            legalaider_core::logging::log_dir().display()
        );
    }
}

fn run_report(
    config: &Config,
    db: &Database,
    category: Category,
    export: Option<&str>,
) -> Result<()> {
    let generator =
        create_text_generator(config.require_llm()?).context("failed to create LLM client")?;

    let aggregator = TopicFaqAggregator::new(generator.as_ref());
    let aggregator = if config.report.reuse_cached_clusters {
        aggregator.with_cache(db)
    } else {
        aggregator
    };

    let report = ReportAssembler::new(aggregator)
        .generate(db, category)
        .with_context(|| format!("failed to generate report for {}", category))?;

    match export {
        Some("json") => print_json(&report)?,
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
        None => print_terminal(&report),
    }
    Ok(())
}

fn print_json(report: &Report) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let abs = minutes.unsigned_abs();
    if abs >= 60 {
        format!("{}{}h {}m", sign, abs / 60, abs % 60)
    } else {
        format!("{}{}m", sign, abs)
    }
}

fn print_terminal(report: &Report) {
    let title = format!("Time Savings Report: {}", report.category);

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!(
        "   Generated {}",
        report
            .generated_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    println!();

    if report.conversation_count == 0 {
        println!("  No conversations found for this category.");
        println!();
        return;
    }

    let summary = &report.time_savings_summary;
    println!("SUMMARY");
    println!(
        "   Conversations: {:<8} Time saved: {}",
        report.conversation_count,
        format_minutes(summary.total_time_saved)
    );
    println!(
        "   Traditional: {:<10} With AI: {:<10} Average saved: {:.1}m",
        format_minutes(summary.total_traditional_time),
        format_minutes(summary.total_ai_time),
        summary.average_time_saved_per_conversation
    );
    println!();

    if !report.topic_clusters.is_empty() {
        println!("TOPICS");
        for cluster in &report.topic_clusters {
            println!("   {:<40} {:>4}", cluster.name, cluster.frequency);
            if !cluster.themes.is_empty() {
                println!("      {}", cluster.themes.join(", "));
            }
        }
        println!();
    }

    if !report.faq_clusters.is_empty() {
        println!("FREQUENT QUESTIONS");
        for cluster in &report.faq_clusters {
            println!("   {:<40} {:>4}", cluster.theme, cluster.count);
            println!("      \"{}\"", cluster.representative_question);
        }
        println!();
    }

    println!("CONVERSATIONS");
    println!(
        "   {:<38} {:>8} {:>12} {:>10}",
        "id", "chat", "traditional", "saved"
    );
    for row in &report.per_conversation {
        println!(
            "   {:<38} {:>8} {:>12} {:>10}",
            row.id,
            format_minutes(i64::from(row.chat_duration)),
            format_minutes(i64::from(row.traditional_duration)),
            format_minutes(row.time_saved)
        );
    }
    println!();
}

//! Command line front-end for criteria extraction and validation.
//!
//! Works on one local text or markdown file at a time, with in-memory
//! storage. Criteria live only for the duration of a command.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rfp_criteria::ai::{AssistantsResearch, OpenAI};
use rfp_criteria::{
    CriteriaService, CriteriaStatistics, Criterion, DocumentClassification, DocumentMetadata,
    MemoryDocuments, MemoryStore, Priority, ResearchMode, AI,
};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::Config;

type Service = CriteriaService<MemoryStore, MemoryDocuments>;

#[derive(Parser)]
#[command(name = "criteria")]
#[command(about = "Extract, review and validate criteria from procurement documents")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a document by procurement type
    Classify { file: PathBuf },

    /// Extract criteria from a document
    Extract {
        file: PathBuf,
        /// Maximum number of criteria to keep
        #[arg(long)]
        max: Option<usize>,
        /// Skip classification and treat the document as requirements-bearing
        #[arg(long)]
        force: bool,
        /// Recategorize extracted criteria with the AI categorizer
        #[arg(long)]
        categorize: bool,
    },

    /// Summarize a document
    Summarize { file: PathBuf },

    /// Validate a document's criteria against a product
    Validate {
        file: PathBuf,
        /// Product or service to validate against
        #[arg(long)]
        product: String,
        /// Use the deep research agent
        #[arg(long)]
        deep: bool,
        /// Number of criteria to validate, in extraction order
        #[arg(long, default_value_t = 1)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Classify { file } => cmd_classify(&config, &file, cli.json).await,
        Commands::Extract {
            file,
            max,
            force,
            categorize,
        } => cmd_extract(&config, &file, max, force, categorize, cli.json).await,
        Commands::Summarize { file } => cmd_summarize(&config, &file, cli.json).await,
        Commands::Validate {
            file,
            product,
            deep,
            limit,
        } => {
            let mode = if deep {
                ResearchMode::DeepResearch
            } else {
                ResearchMode::Standard
            };
            cmd_validate(&config, &file, &product, mode, limit, cli.json).await
        }
    }
}

// ============================================================================
// Setup
// ============================================================================

fn build_service(config: &Config) -> Service {
    let ai: Option<Arc<dyn AI>> = match config.openai_client() {
        Some(client) => Some(Arc::new(OpenAI::new(client).with_model(&config.model))),
        None => {
            warn!("OPENAI_API_KEY not set, AI operations are unavailable");
            None
        }
    };

    let service = CriteriaService::new(
        MemoryStore::new(),
        MemoryDocuments::new(),
        ai,
        config.pipeline_config(),
    );

    match (config.agent_config(), config.openai_client()) {
        (Some(agent_config), Some(client)) => {
            service.with_research(Arc::new(AssistantsResearch::new(client)), agent_config)
        }
        _ => service,
    }
}

async fn read_document(file: &Path) -> Result<String> {
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))
}

/// Register a file with the service, classifying it unless `force` is set.
async fn register_document(service: &Service, file: &Path, force: bool) -> Result<Uuid> {
    let text = read_document(file).await?;
    let document_id = Uuid::now_v7();
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let mut metadata = DocumentMetadata::new(document_id, filename);
    if force {
        metadata.contains_criteria = true;
    } else {
        let classification = service.classify_document(&text).await?;
        metadata = metadata.with_classification(&classification);
    }

    service.documents().insert(metadata, Some(text))?;
    Ok(document_id)
}

/// Extract and convert criteria for a registered document.
async fn extract_criteria(
    service: &Service,
    document_id: Uuid,
    max: Option<usize>,
) -> Result<Vec<Criterion>> {
    let extractions = service.extract_document(document_id, max).await?;
    let ids: Vec<Uuid> = extractions.iter().map(|e| e.id).collect();
    Ok(service.process_extractions(&ids).await?)
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_classify(config: &Config, file: &Path, json: bool) -> Result<()> {
    let service = build_service(config);
    let text = read_document(file).await?;
    let classification = service.classify_document(&text).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        print_classification(&classification);
    }
    Ok(())
}

async fn cmd_extract(
    config: &Config,
    file: &Path,
    max: Option<usize>,
    force: bool,
    categorize: bool,
    json: bool,
) -> Result<()> {
    let service = build_service(config);
    let document_id = register_document(&service, file, force).await?;

    let mut criteria = extract_criteria(&service, document_id, max).await?;
    if criteria.is_empty() {
        println!(
            "{}",
            "No criteria extracted. Use --force to skip the document type check.".yellow()
        );
        return Ok(());
    }

    if categorize {
        let ids: Vec<Uuid> = criteria.iter().map(|c| c.id).collect();
        let categories = service.auto_categorize(&ids).await?;
        for criterion in &mut criteria {
            if let Some(category) = categories.get(&criterion.id) {
                criterion.category = *category;
            }
        }
    }

    let statistics = service.manager().statistics(Some(document_id)).await?;
    if json {
        let output = serde_json::json!({
            "criteria": criteria,
            "statistics": statistics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (index, criterion) in criteria.iter().enumerate() {
            print_criterion(index + 1, criterion);
        }
        println!();
        print_statistics(&statistics);
    }
    Ok(())
}

async fn cmd_summarize(config: &Config, file: &Path, json: bool) -> Result<()> {
    let service = build_service(config);
    let text = read_document(file).await?;
    let summary = service.summarize(&text).await?;

    if json {
        println!("{}", serde_json::json!({ "summary": summary }));
    } else {
        println!("{}", summary);
    }
    Ok(())
}

async fn cmd_validate(
    config: &Config,
    file: &Path,
    product: &str,
    mode: ResearchMode,
    limit: usize,
    json: bool,
) -> Result<()> {
    let mut service = build_service(config);
    let document_id = register_document(&service, file, true).await?;
    let criteria = extract_criteria(&service, document_id, None).await?;

    let mut validated = Vec::new();
    for criterion in criteria.iter().take(limit) {
        if !json {
            println!("{} {}", "Validating".bright_cyan().bold(), criterion.text);
        }
        match service
            .validate_criterion(criterion.id, product, mode)
            .await
        {
            Ok(criterion) => {
                if !json {
                    print_verdict(&criterion);
                }
                validated.push(criterion);
            }
            Err(e) if e.is_unavailable() => {
                service.cleanup().await;
                return Err(e).context("Validation is not configured");
            }
            Err(e) => {
                eprintln!("{} {}", "Validation failed:".red().bold(), e);
            }
        }
    }

    service.cleanup().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&validated)?);
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_classification(classification: &DocumentClassification) {
    println!(
        "{} {} ({:.0}% confidence)",
        "Type:".bold(),
        classification.document_type.to_string().bright_green(),
        classification.confidence * 100.0
    );
    let gate = if classification.is_extraction_eligible() {
        "yes".green()
    } else {
        "no".yellow()
    };
    println!("{} {}", "Contains criteria:".bold(), gate);
    println!("{} {}", "Reasoning:".bold(), classification.reasoning);
}

fn print_criterion(number: usize, criterion: &Criterion) {
    let priority = match criterion.priority {
        Priority::Critical => criterion.priority.as_str().red().bold(),
        Priority::High => criterion.priority.as_str().yellow(),
        Priority::Medium => criterion.priority.as_str().normal(),
        Priority::Low => criterion.priority.as_str().dimmed(),
    };
    println!(
        "{:>3}. [{}] {} {}",
        number,
        priority,
        criterion.category.as_str().bright_blue(),
        criterion.text
    );
    if !criterion.requirements.is_empty() {
        println!("       {}", criterion.requirements.join(", ").dimmed());
    }
}

fn print_statistics(statistics: &CriteriaStatistics) {
    println!("{} {}", "Total:".bold(), statistics.total_count);
    for (priority, count) in &statistics.by_priority {
        if *count > 0 {
            println!("  {:<10} {}", priority.as_str(), count);
        }
    }
    for (category, count) in &statistics.by_category {
        if *count > 0 {
            println!("  {:<12} {}", category.as_str(), count);
        }
    }
}

fn print_verdict(criterion: &Criterion) {
    let Some(verdict) = &criterion.validation else {
        return;
    };
    let answer = if verdict.is_met {
        "MET".bright_green().bold()
    } else {
        "NOT MET".red().bold()
    };
    println!("  {} {}", answer, verdict.summary);
    for reference in &verdict.references {
        println!("    - {} <{}>", reference.title, reference.url.dimmed());
    }
}

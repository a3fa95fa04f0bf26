use clap::{Args, Parser, Subcommand};
use fair_eva::config::{AppConfig, RuleConfigLoader};
use fair_eva::error::AppError;
use fair_eva::evaluation::{
    DiagnosticLevel, EvaluationContext, EvaluationEngine, IndicatorId, IndicatorRegistry,
    Principle, Weight,
};
use fair_eva::metadata::MetadataCollection;
use fair_eva::telemetry;
use fair_eva::vocabulary::{HttpReferenceFetcher, VocabularyMatcher};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "fair-eva",
    about = "Score harvested repository metadata against the RDA FAIR indicators",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a normalized metadata collection and print the report as JSON
    Evaluate(EvaluateArgs),
    /// List the indicator catalog
    Indicators(IndicatorsArgs),
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// JSON file produced by a harvesting adapter
    #[arg(long)]
    metadata: PathBuf,
    /// Repository profile, e.g. oai-pmh, digital_csic, ai4os
    #[arg(long)]
    profile: String,
    /// Directory holding global.json and profiles/ (overrides FAIR_CONFIG_DIR)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Locale recorded on the report
    #[arg(long, default_value = "en")]
    lang: String,
    /// Refresh reference lists from their remote authorities before evaluating
    #[arg(long)]
    refresh_vocabularies: bool,
    /// Overall evaluation timeout (overrides FAIR_EVALUATION_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Args, Debug)]
struct IndicatorsArgs {
    /// Show which indicators this profile overrides
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    id: String,
    principle: Principle,
    weight: Weight,
    summary: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    overridden: Option<bool>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Indicators(args) => run_indicators(args),
    }
}

async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(dir) = args.config_dir {
        config.rules.config_dir = dir;
    }
    if args.refresh_vocabularies {
        config.vocabulary.remote_refresh = true;
    }
    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(config.evaluation.timeout);

    let raw = fs::read_to_string(&args.metadata)?;
    let collection: MetadataCollection = serde_json::from_str(&raw)?;

    let rules = Arc::new(RuleConfigLoader::new(&config.rules.config_dir).load(&args.profile)?);
    let matcher = Arc::new(VocabularyMatcher::from_config(&rules));

    if config.vocabulary.remote_refresh {
        let fetcher = HttpReferenceFetcher::new(&config.vocabulary)?;
        for status in matcher.refresh(&fetcher, &rules).await {
            info!(
                vocabulary = status.vocabulary.as_str(),
                items = status.items,
                degraded = status.degraded,
                "reference list ready"
            );
        }
    }

    let engine = EvaluationEngine::new(IndicatorRegistry::standard(), matcher);
    let ctx = EvaluationContext::new(args.lang);
    let report = engine
        .evaluate_within(timeout, &collection, &rules, &ctx)
        .await?;

    for diagnostic in ctx.sink().entries() {
        let indicator = diagnostic.indicator.as_deref().unwrap_or("-");
        match diagnostic.level {
            DiagnosticLevel::Info => info!(indicator, "{}", diagnostic.message),
            DiagnosticLevel::Warning | DiagnosticLevel::Error => {
                warn!(indicator, "{}", diagnostic.message)
            }
        }
    }

    let view = report.view();
    let rendered = if args.compact {
        serde_json::to_string(&view)?
    } else {
        serde_json::to_string_pretty(&view)?
    };
    println!("{rendered}");
    Ok(())
}

fn run_indicators(args: IndicatorsArgs) -> Result<(), AppError> {
    let registry = IndicatorRegistry::standard();

    let catalog: Vec<CatalogEntry> = IndicatorId::ALL
        .iter()
        .map(|id| CatalogEntry {
            id: id.to_string(),
            principle: id.principle(),
            weight: id.weight(),
            summary: id.summary(),
            overridden: args
                .profile
                .as_deref()
                .map(|profile| registry.is_overridden(profile, *id)),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

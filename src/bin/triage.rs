//! Triage CLI: gather, analyze and improve classification of support issues.
//!
//! Usage:
//!   triage gather [--config sources.yaml]
//!   triage analyze [--input data/gathered.json] [--output data/analyzed.json] [--rules path] [--keyword k]...
//!   triage improve report [--input data/analyzed.json] [--threshold 0.5] [--json]
//!   triage improve correct <issue-id> <category> [--gathered data/gathered.json] [--rules classify_rules.yaml] [--context name]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use triage::analyze::{read_analyzed, read_gathered, write_analyzed};
use triage::classify::{apply_corrections, quality_report, Correction, CATEGORIES, DEFAULT_CONFIDENCE_THRESHOLD};
use triage::gather::write_gathered;
use triage::{analyze, gather, Classifier, ClassifierRules, ConnectorRegistry, GatherConfig};

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Cross-source support issue consolidation and analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch records from every configured source and consolidate them
    Gather {
        /// Path to the sources YAML file
        #[arg(long, default_value = "sources.yaml")]
        config: PathBuf,
    },
    /// Classify gathered issues and build the people and keyword graphs
    Analyze {
        /// Path to gathered JSON
        #[arg(long, default_value = "data/gathered.json")]
        input: PathBuf,
        /// Output JSON file path
        #[arg(long, default_value = "data/analyzed.json")]
        output: PathBuf,
        /// Classifier rules YAML (a sibling <stem>.custom.yaml is applied too)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Known keyword names to look for (repeatable)
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },
    /// Review classifications or teach the classifier from a correction
    Improve {
        #[command(subcommand)]
        action: ImproveAction,
    },
}

#[derive(Subcommand)]
enum ImproveAction {
    /// Issues per category, low-confidence issues and keyword suggestions
    Report {
        /// Path to analyzed JSON
        #[arg(long, default_value = "data/analyzed.json")]
        input: PathBuf,
        /// Flag classifications below this confidence
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
        threshold: f64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record the right category for an issue and learn keywords from it
    Correct {
        /// Consolidated issue id
        issue: String,
        /// Correct category
        category: String,
        /// Path to gathered JSON holding the issue
        #[arg(long, default_value = "data/gathered.json")]
        gathered: PathBuf,
        /// Base rules file; corrections go to its <stem>.custom.yaml
        #[arg(long, default_value = "classify_rules.yaml")]
        rules: PathBuf,
        /// Store learned keywords under this context instead of globally
        #[arg(long)]
        context: Option<String>,
    },
}

fn cmd_gather(config_path: &Path) -> i32 {
    let config = match GatherConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    let registry = ConnectorRegistry::with_builtin();
    let data = match rt.block_on(gather(&config, &registry)) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let output = config.output_path();
    if let Err(e) = write_gathered(&output, &data) {
        eprintln!("Error: {}", e);
        return 1;
    }

    println!(
        "Gathered {} issues from {} sources into {}",
        data.issues.len(),
        data.metadata.sources.len(),
        output.display()
    );
    0
}

fn cmd_analyze(input: &Path, output: &Path, rules: Option<&Path>, keywords: &[String]) -> i32 {
    let rules = match rules {
        Some(path) => ClassifierRules::load(path),
        None => ClassifierRules::builtin(),
    };
    let rules = match rules {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let gathered = match read_gathered(input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let classifier = Classifier::new(rules).with_known_keywords(keywords.iter().cloned());
    let analyzed = analyze(&gathered, &classifier);

    if let Err(e) = write_analyzed(output, &analyzed) {
        eprintln!("Error: {}", e);
        return 1;
    }

    println!(
        "Analyzed {} issues: {} people, {} keywords. Written to {}",
        analyzed.issues.len(),
        analyzed.people_graph.nodes.len(),
        analyzed.keyword_graph.nodes.len(),
        output.display()
    );
    0
}

fn cmd_improve_report(input: &Path, threshold: f64, json: bool) -> i32 {
    let analyzed = match read_analyzed(input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let report = quality_report(&analyzed.issues, threshold);

    if json {
        return match serde_json::to_string_pretty(&report) {
            Ok(s) => {
                println!("{}", s);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    println!("{} issues", report.issue_count);
    for (category, ids) in &report.by_type {
        println!("  {:<14} {}", category, ids.len());
    }
    println!("{} below confidence {:.2}", report.low_confidence.len(), threshold);
    for low in &report.low_confidence {
        println!("  {} {} {:.2} {}", low.id, low.category, low.confidence, low.summary);
    }
    for (category, keywords) in &report.suggestions {
        println!("Suggested keywords for {}: {}", category, keywords.join(", "));
    }
    0
}

fn cmd_improve_correct(issue_id: &str, category: &str, gathered: &Path, rules: &Path, context: Option<&str>) -> i32 {
    if !CATEGORIES.contains(&category) {
        eprintln!("Error: unknown category '{}' (expected one of {})", category, CATEGORIES.join(", "));
        return 1;
    }

    let gathered = match read_gathered(gathered) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let Some(issue) = gathered.issues.iter().find(|i| i.id.as_str() == issue_id) else {
        eprintln!("Error: issue '{}' not found", issue_id);
        return 1;
    };

    let correction = Correction::learn(issue, category);
    let overlay = ClassifierRules::overlay_path(rules);
    if let Err(e) = apply_corrections(std::slice::from_ref(&correction), &overlay, context) {
        eprintln!("Error: {}", e);
        return 1;
    }

    println!(
        "Corrected {} to {}; learned [{}]. Written to {}",
        issue_id,
        category,
        correction.learned_keywords.join(", "),
        overlay.display()
    );
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Gather { config } => cmd_gather(&config),
        Commands::Analyze {
            input,
            output,
            rules,
            keywords,
        } => cmd_analyze(&input, &output, rules.as_deref(), &keywords),
        Commands::Improve { action } => match action {
            ImproveAction::Report { input, threshold, json } => cmd_improve_report(&input, threshold, json),
            ImproveAction::Correct {
                issue,
                category,
                gathered,
                rules,
                context,
            } => cmd_improve_correct(&issue, &category, &gathered, &rules, context.as_deref()),
        },
    };
    std::process::exit(code);
}

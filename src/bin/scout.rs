//! CLI binary for scout.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scout::{
    CompletionOptions, Message, Plan, PopularitySignal, ResearchRequest, ScoutConfig, ScoutRuntime,
};

/// Scout: research a product across many developer sources.
#[derive(Parser)]
#[command(name = "scout", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Research a product and print the ranked results.
    Research {
        /// Product name to research.
        product: String,
        /// Documentation site to crawl.
        #[arg(long)]
        base_url: Option<String>,
        /// Subscription plan whose ceilings apply.
        #[arg(long, default_value = "free")]
        plan: Plan,
        /// Documentation page count, if known.
        #[arg(long)]
        pages: Option<u32>,
        /// GitHub stars of the main repository.
        #[arg(long)]
        stars: Option<u64>,
        /// Check links and relevance of the ranked items.
        #[arg(long)]
        validate: bool,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Send one prompt through the LLM provider chain.
    Complete {
        prompt: String,
        /// Ask for a JSON document.
        #[arg(long)]
        json_mode: bool,
    },

    /// Show the limits a plan allows for a product size.
    Limits {
        #[arg(long, default_value = "free")]
        plan: Plan,
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Print the active configuration as TOML.
    Config {
        /// Print built-in defaults instead of the loaded file.
        #[arg(long)]
        print_default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scout=info,scout_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Research {
            product,
            base_url,
            plan,
            pages,
            stars,
            validate,
            json,
        } => {
            let popularity = stars.map(|stars| PopularitySignal {
                github_stars: Some(stars),
                ..Default::default()
            });
            let args = ResearchArgs {
                product,
                base_url,
                plan,
                pages,
                popularity,
                validate,
                json,
            };
            run_research(config, args).await
        }
        Command::Complete { prompt, json_mode } => run_complete(config, prompt, json_mode).await,
        Command::Limits { plan, pages } => {
            let runtime = ScoutRuntime::new(config)?;
            let resolved = runtime.resolve_limits(plan, pages, None);
            println!("plan: {plan}  complexity: {}", resolved.complexity);
            for (name, value) in resolved.enforced().fields() {
                println!("  {name:<18} {value}");
            }
            if let Some(message) = &resolved.resolution.upgrade_message {
                println!("\n{message}");
            }
            Ok(())
        }
        Command::Config { print_default } => {
            let shown = if print_default {
                ScoutConfig::default()
            } else {
                config
            };
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScoutConfig> {
    let path = path.cloned().unwrap_or_else(ScoutConfig::default_config_path);
    let mut config = if path.exists() {
        info!("loading config from {}", path.display());
        ScoutConfig::from_file(&path).with_context(|| format!("reading {}", path.display()))?
    } else {
        ScoutConfig::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

struct ResearchArgs {
    product: String,
    base_url: Option<String>,
    plan: Plan,
    pages: Option<u32>,
    popularity: Option<PopularitySignal>,
    validate: bool,
    json: bool,
}

async fn run_research(config: ScoutConfig, args: ResearchArgs) -> anyhow::Result<()> {
    let runtime = ScoutRuntime::new(config)?;
    let sweeper = runtime.spawn_cache_sweeper();

    let resolved = runtime.resolve_limits(args.plan, args.pages, args.popularity.as_ref());
    let mut request = ResearchRequest::from_resolved(args.product, &resolved);
    if let Some(base_url) = args.base_url {
        request = request.with_base_url(base_url);
    }

    let report = runtime.research(request).await;
    let validation = match &report {
        Ok(report) if args.validate => Some(runtime.validate(&report.product, report.items.clone()).await),
        _ => None,
    };
    runtime.shutdown();
    let _ = sweeper.await;
    let report = report?;

    if args.json {
        let output = serde_json::json!({ "report": report, "validation": validation });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{}: {} items from {} sources (quality {:.2}, mix {:.2})",
        report.product,
        report.items.len(),
        report.total_sources,
        report.quality_score,
        report.source_mix_score
    );
    for item in &report.items {
        println!(
            "  [{:.2}] {:<13} {}\n         {}",
            item.quality_score.unwrap_or_default(),
            item.source_type.name(),
            item.title,
            item.url
        );
    }
    for failed in &report.failed_sources {
        println!("  ! {} failed ({}): {}", failed.source, failed.code, failed.error);
    }
    if let Some(validation) = &validation {
        let label = if validation.used_fallback { " (heuristic ranking)" } else { "" };
        println!("\nvalidated: {} items, {} dead links{label}", validation.items.len(), validation.dead_links);
        for checked in &validation.items {
            let duplicate = checked
                .near_duplicate_of
                .as_deref()
                .map(|url| format!("  ~ {url}"))
                .unwrap_or_default();
            println!("  [{:.2}] {}{duplicate}", checked.composite, checked.item.url);
        }
    }
    if let Some(message) = &report.upgrade_message {
        println!("\n{message}");
    }
    Ok(())
}

async fn run_complete(config: ScoutConfig, prompt: String, json_mode: bool) -> anyhow::Result<()> {
    let options = CompletionOptions {
        json_mode,
        ..config.retry.completion_options()
    };
    let runtime = ScoutRuntime::new(config)?;
    let completion = runtime.complete(&[Message::user(prompt)], &options).await?;
    info!(provider = completion.provider_label.as_str(), model = completion.model_id.as_str(), "completion");
    println!("{}", completion.content);
    Ok(())
}

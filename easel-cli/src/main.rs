//! Easel CLI - run workflow evaluations from the command line

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use easel_core::prelude::*;

#[derive(Parser)]
#[command(name = "easel")]
#[command(about = "Evaluation harness for agent workflows", long_about = None)]
#[command(version)]
struct Cli {
    /// Read only this configuration file; without it, easel.toml,
    /// EASEL_CONFIG_PATH and EASEL_* variables are layered
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Routing,
    Generation,
}

impl From<ModeArg> for EvalMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Routing => EvalMode::Routing,
            ModeArg::Generation => EvalMode::Generation,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case of a dataset against the workflow engine
    Eval {
        /// Dataset file (.json, .yaml or .yml)
        #[arg(short, long)]
        dataset: PathBuf,

        /// Evaluation mode
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Node to invoke instead of the configured one
        #[arg(long)]
        node: Option<String>,

        /// Model name forwarded to the workflow
        #[arg(long)]
        model: Option<String>,

        /// Workflow engine base URL
        #[arg(long, env = "EASEL_ENGINE_URL")]
        engine_url: Option<String>,
    },
    /// Score a single output with the quality judge
    Judge {
        /// User query the output answers
        #[arg(short, long)]
        query: String,

        /// Generated output, or @path to read it from a file
        #[arg(short, long)]
        output: String,
    },
    /// Share a run and print the handler response
    Share {
        /// Run identifier
        run_id: String,
    },
    /// Feedback API commands
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommands,
    },
    /// Version information
    Version,
}

#[derive(Subcommand)]
enum FeedbackCommands {
    /// Submit a score
    Send {
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        score: f64,

        #[arg(short, long)]
        comment: Option<String>,
    },
    /// List feedback stored under a key
    Get {
        #[arg(short, long)]
        key: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EaselConfig> {
    let config = match path {
        Some(path) => EaselConfig::from_file(path)?,
        None => EaselConfig::load()?,
    };
    Ok(config)
}

fn read_output_arg(output: &str) -> Result<String> {
    match output.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read generated output from {}", path)),
        None => Ok(output.to_string()),
    }
}

fn judge_from(config: &JudgeConfig) -> Result<QualityJudge> {
    let provider = LLMProviderFactory::create(config)?;
    Ok(QualityJudge::new(provider).with_temperature(config.temperature))
}

async fn run_eval(
    config: EaselConfig,
    dataset: PathBuf,
    mode: EvalMode,
    node: Option<String>,
    model: Option<String>,
    engine_url: Option<String>,
) -> Result<bool> {
    let engine_url = engine_url
        .or_else(|| config.eval.engine_url.clone())
        .context("No workflow engine URL; pass --engine-url or set eval.engine_url")?;

    let dataset = Dataset::load(&dataset)?;
    tracing::info!(dataset = %dataset.name, cases = dataset.len(), %mode, "running evaluation");

    let engine = HttpNodeEngine::new(engine_url, config.eval.request_timeout)?;
    let mut runner = EvalCaseRunner::new(Arc::new(engine), &config.eval);
    if mode == EvalMode::Generation {
        runner = runner.with_judge(judge_from(&config.judge)?);
    }
    if let Some(node) = node {
        runner = runner.with_node(mode, node);
    }
    if let Some(model) = model {
        let run_config = RunConfig {
            model_name: model,
            ..runner.run_config().clone()
        };
        runner = runner.with_run_config(run_config);
    }

    let records = runner.run_all(&dataset.cases, mode).await?;
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    let report = EvalReport::from_records(&records);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.is_success())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("easel {}", env!("CARGO_PKG_VERSION"));
            println!("easel-core {}", easel_core::VERSION);
        }
        Commands::Eval {
            dataset,
            mode,
            node,
            model,
            engine_url,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let success = run_eval(config, dataset, mode.into(), node, model, engine_url).await?;
            if !success {
                bail!("evaluation failed");
            }
        }
        Commands::Judge { query, output } => {
            let config = load_config(cli.config.as_ref())?;
            let generated = read_output_arg(&output)?;
            let verdict = judge_from(&config.judge)?.judge(&query, &generated).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::Share { run_id } => {
            let config = load_config(cli.config.as_ref())?;
            let service = ShareService::from_config(&config.share);
            let body = serde_json::to_vec(&serde_json::json!({ "runId": run_id }))?;
            let response = service.handle(&body).await;
            println!("{}", response.status);
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.is_success() {
                bail!("share failed with status {}", response.status);
            }
        }
        Commands::Feedback { command } => {
            let config = load_config(cli.config.as_ref())?;
            let client = FeedbackClient::from_config(&config.feedback);
            match command {
                FeedbackCommands::Send {
                    key,
                    score,
                    comment,
                } => match client.send_feedback(&key, score, comment.as_deref()).await {
                    Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                    None => bail!(
                        "feedback was not recorded{}",
                        client.error().map(|e| format!(": {}", e)).unwrap_or_default()
                    ),
                },
                FeedbackCommands::Get { key } => match client.get_feedback(&key).await {
                    Some(entries) => println!("{}", serde_json::to_string_pretty(&entries)?),
                    None => bail!(
                        "feedback could not be fetched{}",
                        client.error().map(|e| format!(": {}", e)).unwrap_or_default()
                    ),
                },
            }
        }
    }

    Ok(())
}

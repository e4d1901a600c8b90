// repo-insights: analyze a GitHub repository from the command line.
//
// Credentials come from flags or GITHUB_TOKEN / OPENAI_API_KEY. Logging goes
// to stderr (RUST_LOG, default info); the report goes to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use repo_insights::analysis::progress::ProgressSink;
use repo_insights::{
    AnalysisConfig, CodeAnalyzer, GitHubClient, JsonFileStore, MemoryStore, OpenAiBackend,
    PersistenceGateway, Pipeline, QualityScorer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "repo-insights", version, about = "Contributor quality metrics for GitHub repositories")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one repository and print the report
    Analyze {
        /// Repository URL or owner/name
        url: String,

        /// TOML file overriding the default settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for JSON results (kept in memory when omitted)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Do not clone and analyze the source tree
        #[arg(long)]
        skip_code_quality: bool,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: String,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        openai_api_key: String,
    },
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, current: u64, total: u64, message: &str) {
        info!("[{current}/{total}] {message}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Command::Analyze {
        url,
        config,
        store,
        json,
        skip_code_quality,
        github_token,
        openai_api_key,
    } = cli.command;

    let config = match config {
        Some(path) => AnalysisConfig::load(&path)?,
        None => AnalysisConfig::default(),
    };

    let provider = GitHubClient::builder()
        .personal_token(github_token)
        .rate_limit_policy(config.rate_limit_policy())
        .timeout(config.api_timeout())
        .per_page(config.api_page_size)
        .commit_stats(config.commit_stats)
        .build()?;

    let backend = OpenAiBackend::new(openai_api_key)?
        .with_model(config.llm_model.clone())
        .with_base_url(config.llm_base_url.clone())
        .with_timeout(config.llm_timeout());
    let scorer = QualityScorer::new(Arc::new(backend));

    let store: Arc<dyn PersistenceGateway> = match store {
        Some(dir) => Arc::new(
            JsonFileStore::open(&dir)
                .with_context(|| format!("cannot open store at {}", dir.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    let code_analysis = config.code_analysis();
    let mut pipeline = Pipeline::new(Arc::new(provider), scorer, store, config)
        .with_progress_sink(Arc::new(LogProgress));
    if !skip_code_quality {
        pipeline = pipeline.with_code_source(Arc::new(CodeAnalyzer::new(code_analysis)));
    }

    let summary = pipeline.analyze_url(&url).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

//! pgqa - PostgreSQL query analyzer
//!
//! `pgqa serve` runs the HTTP API. `pgqa plan <file>` prints an EXPLAIN
//! (FORMAT JSON) document as a tree without touching a database.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pgqa_analyzer::{DisplayNode, PlanTreeState, parse_json_explain, render_tree};
use pgqa_core::DatabaseUrlPolicy;
use pgqa_llm::{LlmAnalyzer, LlmProvider, NoOpProvider, OpenAiProvider, ProviderConfig};
use pgqa_server::logging::{self, LoggingConfig};
use pgqa_server::{
    AnalysisService, AppState, ExplainerFactory, PostgresExplainerFactory, ServiceConfig,
    create_router,
};
use pgqa_settings::Settings;

#[derive(Parser)]
#[command(name = "pgqa", version)]
#[command(about = "Analyze PostgreSQL queries with EXPLAIN and an LLM")]
struct Cli {
    /// Settings file (defaults to <config dir>/pgqa/settings.toml)
    #[arg(long, global = true, env = "PGQA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print an EXPLAIN (FORMAT JSON) document as a tree
    Plan {
        /// JSON file, or `-` for stdin
        file: PathBuf,

        /// Expand every node instead of only the root
        #[arg(long)]
        expand_all: bool,

        /// Show secondary fields of every visible node
        #[arg(long)]
        details: bool,

        /// Print the display tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(cli.config.as_deref(), host, port).await,
        Command::Plan {
            file,
            expand_all,
            details,
            json,
        } => {
            logging::init(LoggingConfig::cli())?;
            print_plan(&file, expand_all, details, json)
        }
    }
}

async fn serve(config: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = Settings::load(config)?;
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    logging::init(LoggingConfig::for_server(settings.debug))?;

    let llm = settings.llm.effective();
    let provider: Arc<dyn LlmProvider> = if llm.api_key.is_empty() {
        tracing::warn!("no LLM API key configured, analyses will fail");
        Arc::new(NoOpProvider)
    } else {
        Arc::new(OpenAiProvider::new(ProviderConfig {
            api_key: llm.api_key,
            model: llm.model,
            base_url: llm.base_url,
            timeout: llm.timeout,
        })?)
    };
    let metadata = provider.metadata();
    tracing::info!(provider = %metadata.name, model = %metadata.model, "LLM provider ready");

    let factory = Arc::new(PostgresExplainerFactory {
        connect_timeout: Duration::from_secs(settings.database.connect_timeout_secs),
    });
    let explainer = factory
        .create(&settings.database.url)
        .context("Invalid DATABASE_URL")?;

    let service = AnalysisService::new(
        ServiceConfig::from_settings(&settings),
        explainer,
        factory,
        Arc::new(LlmAnalyzer::new(provider)),
    )
    .with_url_policy(
        DatabaseUrlPolicy::default().with_hosts(settings.database.allowed_hosts.iter().cloned()),
    );

    let state = AppState::new(Arc::new(service), settings.app_name.clone())
        .with_examples_file(settings.analysis.examples_file.clone());
    let app = create_router(state, &settings.server.cors_origins);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, app = %settings.app_name, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

fn print_plan(file: &Path, expand_all: bool, details: bool, json: bool) -> Result<()> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?
    };

    let plan = parse_json_explain(&content).context("Invalid EXPLAIN document")?;
    let root = DisplayNode::from_plan(&plan);

    if json {
        println!("{}", serde_json::to_string_pretty(&root)?);
        return Ok(());
    }

    let mut state = PlanTreeState::new();
    if expand_all {
        state.expand_all(&root);
    } else {
        state.toggle(&root.node_id);
    }
    if details {
        state.show_all_details(&root);
    }
    print!("{}", render_tree(&root, &state));
    Ok(())
}

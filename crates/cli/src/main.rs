//! hottake CLI - the main entry point.
//!
//! Commands:
//! - `serve`     - Start the HTTP gateway
//! - `generate`  - Generate one hot take (optionally streamed)
//! - `agents`    - List generation agents
//! - `styles`    - List styles
//! - `doctor`    - Diagnose configuration and backends

use clap::{Args, Parser, Subcommand};
use hottake_agent::HotTakeRequest;

mod commands;

#[derive(Parser)]
#[command(
    name = "hottake",
    about = "hottake - search-grounded hot take generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a hot take about a topic
    Generate(GenerateArgs),

    /// List generation agents and whether they are configured
    Agents,

    /// List available styles
    Styles,

    /// Diagnose configuration and backends
    Doctor,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Topic to take a position on
    topic: String,

    /// Style (see `hottake styles`)
    #[arg(short, long)]
    style: Option<String>,

    /// Agent id ("openai" or "anthropic"); random when omitted
    #[arg(short, long)]
    agent: Option<String>,

    /// Ground the take in web search results
    #[arg(long)]
    web: bool,

    /// Ground the take in recent news
    #[arg(long)]
    news: bool,

    /// Web search provider ("brave" or "serper")
    #[arg(long)]
    provider: Option<String>,

    /// Sources to keep after ranking (1-10)
    #[arg(long)]
    max_results: Option<usize>,

    /// Penalise results with little topical overlap
    #[arg(long)]
    strict: bool,

    /// Print tokens as they arrive
    #[arg(long)]
    stream: bool,
}

impl GenerateArgs {
    fn request(&self) -> HotTakeRequest {
        HotTakeRequest {
            topic: self.topic.clone(),
            style: self.style.clone(),
            agent_type: self.agent.clone(),
            use_web_search: self.web,
            use_news_search: self.news,
            web_search_provider: self.provider.clone(),
            max_articles: self.max_results,
            strict_quality_mode: self.strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Generate(args) => commands::generate::run(args.request(), args.stream).await?,
        Commands::Agents => commands::agents::run().await?,
        Commands::Styles => commands::styles::run(),
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_map_onto_the_request() {
        let cli = Cli::try_parse_from([
            "hottake",
            "generate",
            "pineapple on pizza",
            "--style",
            "witty",
            "--web",
            "--provider",
            "serper",
            "--max-results",
            "3",
            "--strict",
            "--stream",
        ])
        .unwrap();

        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.stream);

        let request = args.request();
        assert_eq!(request.topic, "pineapple on pizza");
        assert_eq!(request.style.as_deref(), Some("witty"));
        assert!(request.use_web_search && !request.use_news_search);
        assert_eq!(request.web_search_provider.as_deref(), Some("serper"));
        assert_eq!(request.max_articles, Some(3));
        assert!(request.strict_quality_mode);
        assert!(request.agent_type.is_none());
    }

    #[test]
    fn serve_accepts_port_override() {
        let cli = Cli::try_parse_from(["hottake", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
    }
}

mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "appscout-cli")]
#[command(about = "App opportunity discovery from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a discovery collection synchronously.
    Collect {
        /// Search keyword; repeat for several. Omit to sample the curated pool.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// Country code; repeat for several. Omit for the configured default.
        #[arg(long = "country")]
        countries: Vec<String>,
    },
    /// Collect the deep analysis for one candidate.
    Enrich {
        /// Internal candidate id.
        candidate_id: i64,
        /// Country to enrich; defaults to the configured country.
        #[arg(long)]
        country: Option<String>,
        /// Re-collect even if an analysis already exists.
        #[arg(long)]
        refresh: bool,
    },
    /// List recent discovery runs.
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect {
            keywords,
            countries,
        } => commands::run_collect(keywords, countries).await,
        Commands::Enrich {
            candidate_id,
            country,
            refresh,
        } => commands::run_enrich(candidate_id, country, refresh).await,
        Commands::Runs { limit } => commands::list_runs(limit).await,
    }
}

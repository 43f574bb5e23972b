//! upskill CLI: generate, parse and score multiple-choice quizzes.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "upskill",
    version,
    about = "Generate and score multiple-choice quizzes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and example learner profile
    Init,

    /// Parse raw model output into questions
    Parse {
        /// File with raw text, or "-" for stdin
        #[arg(long)]
        input: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Generate and store questions for a learner
    Generate {
        /// Learner profile (.toml or .json)
        #[arg(long)]
        profile: PathBuf,

        /// Number of questions to request
        #[arg(long)]
        count: Option<usize>,

        /// Model to use (e.g. "gemini/gemini-1.5-pro")
        #[arg(long)]
        model: Option<String>,

        /// Quiz store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a learner's answers against their stored questions
    Quiz {
        /// Learner name
        #[arg(long)]
        learner: String,

        /// JSON file of submitted answers
        #[arg(long)]
        answers: PathBuf,

        /// Quiz store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path (for `store_path`)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show a learner's recorded answers
    History {
        /// Learner name
        #[arg(long)]
        learner: String,

        /// Quiz store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Config file path (for `store_path`)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "upskill=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Parse { input, format } => commands::parse::execute(input, format),
        Commands::Generate {
            profile,
            count,
            model,
            store,
            config,
        } => commands::generate::execute(profile, count, model, store, config).await,
        Commands::Quiz {
            learner,
            answers,
            store,
            format,
            output,
            config,
        } => commands::quiz::execute(learner, answers, store, format, output, config).await,
        Commands::History {
            learner,
            store,
            config,
        } => commands::history::execute(learner, store, config).await,
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

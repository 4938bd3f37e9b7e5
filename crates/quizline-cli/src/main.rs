//! quizline CLI: take localized multiple-choice quizzes from the terminal.

use std::process;

use clap::{Parser, Subcommand};
use quizline_core::model::Locale;

mod commands;

#[derive(Parser)]
#[command(name = "quizline", version, about = "Terminal quiz-taking client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz interactively
    Take {
        /// Quiz language: english or hindi (default from config)
        #[arg(long)]
        locale: Option<Locale>,

        /// Your name (prompted on submit if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Your email address (prompted on submit if omitted)
        #[arg(long)]
        email: Option<String>,

        /// Your phone number (prompted on submit if omitted)
        #[arg(long)]
        phone: Option<String>,

        #[command(flatten)]
        backend: commands::BackendArgs,
    },

    /// Print the question bank for a language
    Questions {
        /// Quiz language: english or hindi (default from config)
        #[arg(long)]
        locale: Option<Locale>,

        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        backend: commands::BackendArgs,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "quizline=warn".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            locale,
            name,
            email,
            phone,
            backend,
        } => {
            let contact = commands::take::ContactArgs { name, email, phone };
            commands::take::execute(locale, contact, backend).await
        }
        Commands::Questions {
            locale,
            json,
            backend,
        } => commands::questions::execute(locale, json, backend).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

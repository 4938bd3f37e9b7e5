//! Subcommand implementations and the backend wiring they share.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use quizline_client::{create_backend, load_config_from, MockBackend, QuizlineConfig};
use quizline_core::traits::{QuestionProvider, ScoringService};

pub mod init;
pub mod questions;
pub mod take;

/// Options selecting which quiz service to talk to.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Quiz service base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use the built-in sample quiz instead of a quiz service
    #[arg(long)]
    pub demo: bool,
}

/// The collaborators a command runs against, with the effective config.
pub struct Backend {
    pub provider: Arc<dyn QuestionProvider>,
    pub scoring: Arc<dyn ScoringService>,
    pub config: QuizlineConfig,
}

/// Load config, apply command-line overrides, and build the backend.
pub fn connect(args: &BackendArgs) -> Result<Backend> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
        config.validate()?;
    }

    if args.demo {
        tracing::info!("using the built-in sample quiz");
        let mock = Arc::new(MockBackend::sample());
        return Ok(Backend {
            provider: mock.clone(),
            scoring: mock,
            config,
        });
    }

    tracing::info!(base_url = %config.base_url, "using quiz service");
    let http = create_backend(&config)?;
    Ok(Backend {
        provider: http.clone(),
        scoring: http,
        config,
    })
}

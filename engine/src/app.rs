//! Core application

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::ENV_LOG;
use crate::core::summary;
use crate::data::files::{batch_output_paths, load_capture, write_spec};
use crate::domain::correlation::{AnalysisReport, AnalysisStatus, CorrelationEngine};

pub struct CoreApp {
    pub config: AppConfig,
    pub engine: Arc<CorrelationEngine>,
}

/// Outcome of one capture, tagged with its position on the command line
struct CaptureOutcome {
    position: usize,
    capture: PathBuf,
    spec_path: PathBuf,
    result: Result<AnalysisReport>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(AppConfig::load(&cli_config)?);

        match command {
            Commands::Classify { values } => {
                app.classify(&values);
                Ok(())
            }
            Commands::Analyze {
                captures, output, ..
            } => app.analyze_all(captures, output).await,
        }
    }

    fn init(config: AppConfig) -> Self {
        let engine = Arc::new(CorrelationEngine::new(config.analysis.clone()));
        Self { config, engine }
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", env!("CARGO_CRATE_NAME"));

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn classify(&self, values: &[String]) {
        println!();
        for value in values {
            summary::print_classification(value, self.config.analysis.min_numeric_id_digits);
        }
        println!();
    }

    /// Analyze every capture concurrently, one engine run per capture
    async fn analyze_all(&self, captures: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
        if output.is_some() && captures.len() > 1 {
            anyhow::bail!("--output can only be used with a single capture");
        }

        let total = captures.len();
        let mut tasks = JoinSet::new();

        let spec_paths = match output {
            Some(path) => vec![path],
            None => batch_output_paths(&captures, self.config.output.directory.as_deref()),
        };

        for (position, (capture, spec_path)) in captures.into_iter().zip(spec_paths).enumerate() {
            let engine = Arc::clone(&self.engine);
            let pretty = self.config.output.pretty;

            tasks.spawn(async move {
                let result = analyze_capture(engine, &capture, &spec_path, pretty).await;
                CaptureOutcome {
                    position,
                    capture,
                    spec_path,
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.context("Analysis task failed")?);
        }
        outcomes.sort_by_key(|o| o.position);

        summary::print_header();
        let mut failed = 0;
        for outcome in outcomes {
            match outcome.result {
                Ok(report) => summary::print_report(&outcome.capture, &report, &outcome.spec_path),
                Err(e) => {
                    tracing::error!(capture = %outcome.capture.display(), error = %e, "Analysis failed");
                    summary::print_failure(&outcome.capture, &e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{} of {} captures could not be analyzed", failed, total);
        }
        Ok(())
    }
}

async fn analyze_capture(
    engine: Arc<CorrelationEngine>,
    capture_path: &Path,
    spec_path: &Path,
    pretty: bool,
) -> Result<AnalysisReport> {
    let capture = load_capture(capture_path).await?;

    let report = tokio::task::spawn_blocking(move || engine.analyze(&capture))
        .await
        .context("Analysis task failed")?;

    for diagnostic in &report.diagnostics {
        tracing::debug!(
            kind = diagnostic.kind.as_str(),
            entry_index = ?diagnostic.entry_index,
            step = ?diagnostic.step_label,
            detail = %diagnostic.detail,
            "Skipped fragment"
        );
    }
    if report.status() == AnalysisStatus::Degraded {
        tracing::warn!(
            capture = %capture_path.display(),
            skipped = report.diagnostics.len(),
            "Some fragments could not be analyzed"
        );
    }

    write_spec(spec_path, &report.spec, pretty).await?;
    Ok(report)
}

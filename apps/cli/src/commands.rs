//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use indicoharvest_core::{HarvestResult, ProgressReporter, run_harvest};
use indicoharvest_shared::{AppConfig, HarvestConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// indicoharvest — extract an Indico event into a local directory tree.
#[derive(Parser)]
#[command(
    name = "indicoharvest",
    version,
    about = "Extract contributions, sessions, and attachments from an Indico event.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the extraction against the configured event.
    Run,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run => cmd_run().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_run() -> Result<()> {
    let config = load_config()?;
    let harvest = HarvestConfig::from(&config);

    info!(
        event_id = %harvest.event_id,
        base_url = %harvest.base_url,
        output = %harvest.output_dir.display(),
        "starting extraction"
    );

    let reporter = CliProgress::new();
    let result = run_harvest(&harvest, &reporter).await?;
    let stats = &result.stats;

    println!();
    println!("  Extraction complete!");
    println!("  Event:         {}", result.event.title);
    println!("  Output:        {}", result.output_dir.display());
    println!(
        "  Contributions: {} ({} oral / {} poster / {} other)",
        stats.total_contributions, stats.oral_presentations, stats.posters, stats.others
    );
    println!(
        "  Downloads:     {} new, {} skipped, {} failed",
        stats.downloaded_files, stats.skipped_existing, stats.download_failures
    );
    println!(
        "  Artifacts:     {} written, {} failed",
        stats.artifacts_written, stats.artifact_failures
    );
    println!("  Errors:        {}", stats.errors());
    println!("  Time:          {:.1}s", result.elapsed.as_secs_f64());
    println!();

    if !result.reports.failed.is_empty() {
        println!("  Failed artifacts:");
        for (name, error) in &result.reports.failed {
            println!("    {name}: {error}");
        }
        println!();
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn contribution(&self, current: usize, total: usize, label: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {label}"));
    }

    fn done(&self, _result: &HarvestResult) {
        self.spinner.finish_and_clear();
    }
}

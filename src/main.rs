// LogNorm - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (before logging, since it may set the level)
// 3. Logging initialisation
// 4. Batch run and exit status

use clap::Parser;
use lognorm::app::batch::{self, BatchConfig, SummaryFormat};
use lognorm::core::discovery::DiscoveryConfig;
use lognorm::core::model::{OnInvalidRecord, RequiredFields};
use lognorm::platform::config::{self, AppConfig, PlatformPaths};
use lognorm::util;
use lognorm::util::error::Result;
use std::path::PathBuf;
use std::process::ExitCode;

/// LogNorm - third-party log tag normaliser.
///
/// Reads every matching CSV log file in DATA_DIR, resolves subscription and
/// purchase tags into status columns, and writes one consolidated CSV.
#[derive(Parser, Debug)]
#[command(name = "lognorm", version, about)]
struct Cli {
    /// Directory containing the input log files [default: data].
    data_dir: Option<PathBuf>,

    /// Output CSV path; `-` writes to stdout [default: output.csv].
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// App code mapping file (key = value) [default: appCodes.ini].
    #[arg(short = 'a', long = "app-codes")]
    app_codes: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Input file name glob; repeat to add more [default: *.log].
    #[arg(long = "include")]
    include: Vec<String>,

    /// Require only `app`; records without `deviceToken` get an empty device id.
    #[arg(long = "lenient")]
    lenient: bool,

    /// Skip records missing required fields instead of aborting the run.
    #[arg(long = "skip-invalid")]
    skip_invalid: bool,

    /// Fold third-party single-issue tags onto the standard vocabulary.
    #[arg(long = "consolidate-aliases")]
    consolidate_aliases: bool,

    /// How the final summary is printed.
    #[arg(long = "summary", value_enum, default_value_t = SummaryFormat::Text)]
    summary: SummaryFormat,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    /// CLI values override config.toml, which overrides built-in defaults.
    fn into_batch_config(self, config: AppConfig) -> BatchConfig {
        let include_patterns = if self.include.is_empty() {
            config.include_patterns
        } else {
            self.include
        };

        BatchConfig {
            data_dir: self.data_dir.unwrap_or(config.data_dir),
            discovery: DiscoveryConfig {
                max_depth: config.max_depth,
                include_patterns,
                exclude_patterns: config.exclude_patterns,
            },
            app_codes: self.app_codes.unwrap_or(config.app_codes),
            output: self.output.unwrap_or(config.output),
            required_fields: if self.lenient {
                RequiredFields::AppOnly
            } else {
                config.required_fields
            },
            on_invalid_record: if self.skip_invalid {
                OnInvalidRecord::Skip
            } else {
                config.on_invalid_record
            },
            consolidate_aliases: self.consolidate_aliases || config.consolidate_aliases,
        }
    }
}

/// Load config.toml: the `--config` file if given, else the platform one.
///
/// Returns the config, its warnings and the path it was looked up at.
fn load_app_config(cli: &Cli) -> Result<(AppConfig, Vec<String>, PathBuf)> {
    let (config_path, explicit) = match cli.config.clone() {
        Some(path) => (path, true),
        None => (PlatformPaths::resolve().config_file(), false),
    };
    let (app_config, warnings) = config::load_config(&config_path, explicit)?;
    Ok((app_config, warnings, config_path))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet; report straight to stderr.
    let (app_config, config_warnings, config_path) = match load_app_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        config = %config_path.display(),
        "LogNorm starting"
    );

    let summary_format = cli.summary;
    let batch_config = cli.into_batch_config(app_config);
    let csv_on_stdout = batch_config.output.as_os_str() == util::constants::STDOUT_PATH;

    let result = batch::run_batch(&batch_config).and_then(|summary| {
        batch::render_summary(&summary, summary_format).map_err(Into::into)
    });

    match result {
        // Keep stdout pure CSV when the output itself goes there.
        Ok(rendered) if csv_on_stdout => {
            eprintln!("{rendered}");
            ExitCode::SUCCESS
        }
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

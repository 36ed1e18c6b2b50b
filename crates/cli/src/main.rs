//! solprep command-line tool.
//!
//! Provides subcommands for generating and validating the build
//! configuration, remapping import lines (as a stdin filter or one-off),
//! running the preprocessing pass over the source tree, and inspecting
//! networks and compiler settings.

mod doctor;
mod style;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use solprep_core::config::{BuildConfig, ReloadMode};
use solprep_core::preprocess::{split_terminator, Preprocessor};
use solprep_core::remap::ImportRemapper;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// solprep command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "solprep",
    version,
    about = "Solidity build configuration and import remapping preprocessor"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "solprep.toml")]
    config: String,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./solprep.toml")]
        output: PathBuf,
    },

    /// Validate the configuration file.
    Validate,

    /// Remap import lines. Reads stdin line by line when no lines are given.
    Remap {
        /// Source lines to transform.
        lines: Vec<String>,
    },

    /// Run the preprocessing pass over the sources directory.
    Preprocess {
        /// Report rewrites without writing any output.
        #[arg(long)]
        dry_run: bool,

        /// Override the output directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List configured networks.
    Networks {
        /// Print as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the solc standard-JSON settings fragment.
    SolcSettings,

    /// Run health checks on the project setup.
    Doctor,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);

    init_tracing(cli.log_level.as_deref(), &config_path);

    match run(cli.command, &config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log level precedence: `--log-level`, then `RUST_LOG`, then the config
/// file's `log_level`, then `warn`.
fn init_tracing(cli_level: Option<&str>, config_path: &Path) {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = BuildConfig::load_from_file(config_path)
                .map(|c| c.log_level)
                .unwrap_or_else(|_| "warn".to_string());
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
        }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(command: Commands, config_path: &Path) -> Result<()> {
    debug!(?command, config = %config_path.display(), "dispatching command");

    match command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(config_path),
        Commands::Doctor => doctor::run_doctor(config_path),
        command => {
            let config = load_config(config_path)?;
            match command {
                Commands::Remap { lines } => cmd_remap(&config, &lines),
                Commands::Preprocess { dry_run, out } => cmd_preprocess(&config, dry_run, out),
                Commands::Networks { json } => cmd_networks(&config, json),
                Commands::SolcSettings => cmd_solc_settings(&config),
                _ => unreachable!(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<BuildConfig> {
    BuildConfig::load_and_resolve(path).context("failed to load configuration file")
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// A relative `--out` is taken relative to the project root, like every
/// path in the config file.
fn resolve_out_dir(config: &BuildConfig, out: &Path) -> PathBuf {
    config.resolve_path(&expand_tilde(&out.to_string_lossy()))
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, BuildConfig::default_template())
        .context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Add your import remappings to remappings.txt (one '<prefix>=<replacement>' per line)");
    println!("  2. Define your networks and set any referenced private key env vars");
    println!(
        "  3. Validate with: solprep validate --config {}",
        output.display()
    );
    println!(
        "  4. Preprocess sources: solprep preprocess --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        BuildConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    let _ = config.resolve_env_vars();
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let reload = match config.preprocess.reload {
        ReloadMode::PerLine => "per line (live)",
        ReloadMode::PerPass => "per pass",
    };

    println!();
    println!("Configuration summary:");
    println!("  Solc version  : {}", config.solidity.version);
    println!(
        "  Optimizer     : {} ({} runs)",
        if config.solidity.optimizer.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.solidity.optimizer.runs
    );
    println!("  Sources       : {}", config.sources_dir().display());
    println!("  Cache         : {}", config.cache_dir().display());
    println!("  Preprocessed  : {}", config.preprocessed_dir().display());
    println!("  Remappings    : {}", config.remappings_path().display());
    println!("  Reload        : {}", reload);
    println!("  Test timeout  : {}ms", config.test.timeout_ms);
    println!("  Docs output   : {}", config.docs_dir().display());
    println!(
        "  Networks      : {}",
        if config.networks.is_empty() {
            "none".to_string()
        } else {
            config.network_names().join(", ")
        }
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_remap(config: &BuildConfig, lines: &[String]) -> Result<()> {
    let remapper = ImportRemapper::from_config(&config.preprocess, &config.root)
        .context("failed to load remappings")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if lines.is_empty() {
        remap_stream(&remapper, std::io::stdin().lock(), &mut out)?;
    } else {
        for line in lines {
            let transformed = remapper
                .transform_line(line)
                .context("failed to remap line")?;
            writeln!(out, "{}", transformed)?;
        }
    }

    Ok(())
}

/// Filter `reader` into `writer`, remapping import lines and keeping every
/// line terminator (including a missing final newline) as it was.
fn remap_stream(
    remapper: &ImportRemapper,
    mut reader: impl BufRead,
    mut writer: impl Write,
) -> Result<()> {
    let mut raw = String::new();
    let mut line_no = 0usize;
    loop {
        raw.clear();
        if reader
            .read_line(&mut raw)
            .context("failed to read from stdin")?
            == 0
        {
            break;
        }
        line_no += 1;

        let (body, terminator) = split_terminator(&raw);
        let transformed = remapper
            .transform_line(body)
            .with_context(|| format!("failed to remap line {}", line_no))?;
        writer.write_all(transformed.as_bytes())?;
        writer.write_all(terminator.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_preprocess(config: &BuildConfig, dry_run: bool, out: Option<PathBuf>) -> Result<()> {
    let mut preprocessor =
        Preprocessor::from_config(config).context("failed to prepare preprocessing pass")?;
    if let Some(out) = out {
        preprocessor = preprocessor.with_output(resolve_out_dir(config, &out));
    }

    let report = if dry_run {
        preprocessor.dry_run()
    } else {
        preprocessor.run()
    }
    .context("preprocessing failed")?;

    for rewrite in &report.rewrites {
        println!(
            "{}",
            style::dim(&format!("{}:{}", rewrite.file.display(), rewrite.line))
        );
        println!("{}", style::rewrite(&rewrite.before, &rewrite.after));
    }
    if !report.rewrites.is_empty() {
        println!();
    }

    println!(
        "{}",
        style::success(&format!(
            "{} source file(s) processed, {} import(s) remapped, {} file(s) skipped",
            report.sources_processed,
            report.rewrites.len(),
            report.files_skipped
        ))
    );
    if dry_run {
        println!("{}", style::warn("Dry run: no files written"));
    } else {
        println!(
            "  {} file(s) written to {}",
            report.files_written,
            report.output_dir.display()
        );
    }

    Ok(())
}

fn cmd_networks(config: &BuildConfig, json: bool) -> Result<()> {
    if json {
        let list: Vec<_> = config
            .networks
            .iter()
            .map(|(name, net)| {
                serde_json::json!({
                    "name": name,
                    "url": net.url,
                    "chain_id": net.chain_id,
                    "accounts": net.accounts_summary(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if config.networks.is_empty() {
        println!("No networks configured.");
        return Ok(());
    }

    println!();
    println!("{}", style::header("Networks"));
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Chain ID", "URL", "Accounts"]);

    for (name, net) in &config.networks {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(net.chain_id),
            Cell::new(&net.url),
            Cell::new(net.accounts_summary()),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

fn cmd_solc_settings(config: &BuildConfig) -> Result<()> {
    let settings = config.solidity.solc_settings();
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

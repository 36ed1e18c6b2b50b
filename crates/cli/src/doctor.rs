//! Health check for a solprep project.

use std::path::Path;

use anyhow::Result;

use solprep_core::config::{BuildConfig, ReloadMode};
use solprep_core::network::AccountsConfig;
use solprep_core::remap::RemappingTable;

use crate::style;

/// Run health checks on the project described by `config_path`.
pub fn run_doctor(config_path: &Path) -> Result<()> {
    println!();
    println!("{}", style::header("solprep Doctor"));
    println!();

    let mut issues = Vec::new();

    // 1. Configuration
    let config = match BuildConfig::load_from_file(config_path) {
        Ok(mut config) => {
            let _ = config.resolve_env_vars();
            match config.validate() {
                Ok(()) => println!("  {}", style::success("Configuration     Valid")),
                Err(e) => {
                    println!("  {}", style::error(&format!("Configuration     {}", e)));
                    issues.push("Fix configuration errors".to_string());
                }
            }
            config
        }
        Err(e) => {
            println!("  {}", style::error(&format!("Configuration     {}", e)));
            issues.push(format!(
                "Create a config with: solprep init -o {}",
                config_path.display()
            ));
            print_summary(&issues);
            return Ok(());
        }
    };

    // 2. Sources directory
    let sources = config.sources_dir();
    if sources.is_dir() {
        println!(
            "  {}",
            style::success(&format!("Sources           {}", sources.display()))
        );
    } else {
        println!(
            "  {}",
            style::error(&format!("Sources           {} (missing)", sources.display()))
        );
        issues.push(format!("Create sources directory: mkdir -p {}", sources.display()));
    }

    // 3. Remappings file
    let remappings = config.remappings_path();
    match std::fs::read_to_string(&remappings) {
        Ok(text) => {
            let (table, malformed) = RemappingTable::parse_with_diagnostics(&text);
            let mode = match config.preprocess.reload {
                ReloadMode::PerLine => "live",
                ReloadMode::PerPass => "per pass",
            };
            println!(
                "  {}",
                style::success(&format!(
                    "Remappings        {} rule(s), {} reload",
                    table.len(),
                    mode
                ))
            );
            for bad in &malformed {
                println!(
                    "  {}",
                    style::warn(&format!(
                        "Remappings        line {}: '{}' ({})",
                        bad.line, bad.content, bad.reason
                    ))
                );
            }
            for rule in table.catch_all_rules() {
                println!(
                    "  {}",
                    style::warn(&format!(
                        "Remappings        '={}' has an empty prefix and matches every import",
                        rule.replacement
                    ))
                );
            }
            if !malformed.is_empty() {
                issues.push(format!(
                    "{} malformed line(s) in {} are ignored",
                    malformed.len(),
                    remappings.display()
                ));
            }
        }
        Err(e) => {
            println!(
                "  {}",
                style::error(&format!(
                    "Remappings        {} ({})",
                    remappings.display(),
                    e
                ))
            );
            issues.push(format!(
                "Create {} (one '<prefix>=<replacement>' per line)",
                remappings.display()
            ));
        }
    }

    // 4. Networks
    if config.networks.is_empty() {
        println!(
            "  {}",
            style::dim("  ○ Networks          None defined")
        );
    }
    for (name, network) in &config.networks {
        let missing_key = matches!(network.accounts, Some(AccountsConfig::PrivateKeyEnv { .. }))
            && network.private_keys.is_empty();
        let line = format!(
            "Network           {} (chain {}, {})",
            name,
            network.chain_id,
            network.accounts_summary()
        );
        if missing_key {
            println!("  {}", style::warn(&line));
            issues.push(format!("Set the private key env var for network '{}'", name));
        } else {
            println!("  {}", style::success(&line));
        }
    }

    print_summary(&issues);
    Ok(())
}

fn print_summary(issues: &[String]) {
    println!();
    if issues.is_empty() {
        println!(
            "  {} All checks passed!",
            console::style("✓").green().bold()
        );
    } else {
        println!(
            "  {} {} issue(s) found:",
            console::style("!").yellow().bold(),
            issues.len()
        );
        for (i, issue) in issues.iter().enumerate() {
            println!("    {}. {}", i + 1, issue);
        }
    }
    println!();
}

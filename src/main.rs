//! Brief CLI - A terminal client for the Legal Document AI Assistant.

use std::io::{self, BufRead, IsTerminal, Write};
use std::process;

use brief::api::HttpApi;
use brief::cli::{Cli, Commands, ConfigCommands};
use brief::commands::{self, Output};
use brief::config::{self, ConfigOverrides, ResolvedConfig, resolve_config};
use brief::logging;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            }
            process::exit(1);
        }
    }
}

/// Run the parsed command line and return the process exit code.
fn run(cli: Cli) -> Result<i32, brief::Error> {
    let human = cli.human_readable;

    // Writing the config must work even when the current file does not resolve
    if let Some(Commands::Config {
        command: ConfigCommands::Set { key, value },
    }) = &cli.command
    {
        output(&commands::config_set(key, value)?, human);
        return Ok(0);
    }

    let mut overrides = ConfigOverrides::new();
    if let Some(url) = &cli.backend_url {
        overrides = overrides.with_backend_url(url);
    }
    let resolved = resolve_config(&overrides)?;

    // The TUI owns the terminal, so its logs go to a file instead of stderr
    let _log_guard = if cli.is_tui() {
        Some(logging::init_file(
            &config::data_dir()?,
            resolved.log_level(),
            cli.verbose,
        )?)
    } else {
        logging::init_stderr(resolved.log_level(), cli.verbose);
        None
    };
    tracing::debug!(backend_url = %resolved.backend_url(), "configuration resolved");

    if let Some(Commands::Config {
        command: ConfigCommands::Show,
    }) = &cli.command
    {
        output(&commands::config_show(resolved)?, human);
        return Ok(0);
    }

    let api = HttpApi::new(resolved.backend_url(), resolved.request_timeout())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| brief::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(run_command(cli.command, api, &resolved, human))
}

async fn run_command(
    command: Option<Commands>,
    api: HttpApi,
    resolved: &ResolvedConfig,
    human: bool,
) -> Result<i32, brief::Error> {
    match command {
        None | Some(Commands::Tui) => {
            #[cfg(feature = "tui")]
            {
                brief::tui::run_tui(api, resolved.settle_delay()).await?;
            }
            #[cfg(not(feature = "tui"))]
            {
                let _ = (api, resolved);
                return Err(brief::Error::Other(
                    "This build has no terminal UI. Rebuild with --features tui".to_string(),
                ));
            }
        }
        Some(Commands::List { search }) => {
            output(&commands::list(&api, search.as_deref()).await?, human);
        }
        Some(Commands::Show { id }) => {
            output(&commands::show(&api, &id).await?, human);
        }
        Some(Commands::Upload { path }) => {
            let show_progress = human && io::stderr().is_terminal();
            output(&commands::upload(&api, &path, show_progress).await?, human);
        }
        Some(Commands::Analyze { id, force }) => {
            output(&commands::analyze(&api, &id, force).await?, human);
        }
        Some(Commands::Ask { id, question }) => {
            output(&commands::ask(&api, &id, &question).await?, human);
        }
        Some(Commands::Chat { id }) => {
            output(&commands::chat(&api, &id).await?, human);
        }
        Some(Commands::Delete { ids, yes }) => {
            if !yes && !confirm_delete(ids.len())? {
                eprintln!("Delete cancelled");
                return Ok(0);
            }
            let summary = commands::delete(&api, &ids).await?;
            output(&summary, human);
            if summary.0.has_failures() {
                return Ok(1);
            }
        }
        // Handled before the runtime starts
        Some(Commands::Config { .. }) => {}
    }
    Ok(0)
}

/// Ask on stderr before deleting; anything but y/yes declines.
fn confirm_delete(count: usize) -> Result<bool, brief::Error> {
    let noun = if count == 1 { "document" } else { "documents" };
    eprint!("Delete {count} {noun}? [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

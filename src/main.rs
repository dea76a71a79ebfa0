//! Entry point for the `tt` CLI.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use trimtab::action_log::log_action;
use trimtab::cli::{Cli, Commands, HistoryCommands};
use trimtab::commands::{self, Output, Workbench};
use trimtab::scope::find_workspace_root;
use trimtab::Result;

fn main() {
    let cli = Cli::parse();
    let start = Instant::now();

    let workspace = resolve_workspace(&cli);
    let command_name = command_name(&cli.command);
    let args = command_args(&cli.command);

    let result = run(&cli, &workspace);
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(rendered) => {
            log_action(&workspace, command_name, args, true, None, duration_ms);
            println!("{}", rendered);
        }
        Err(e) => {
            log_action(
                &workspace,
                command_name,
                args,
                false,
                Some(e.to_string()),
                duration_ms,
            );
            if cli.human_readable {
                eprintln!("Error: {}", e);
            } else {
                eprintln!(
                    "{}",
                    serde_json::json!({ "error": e.to_string() })
                );
            }
            std::process::exit(1);
        }
    }
}

fn resolve_workspace(cli: &Cli) -> PathBuf {
    match &cli.workspace {
        Some(path) => path.clone(),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_workspace_root(&cwd)
        }
    }
}

fn run(cli: &Cli, workspace: &PathBuf) -> Result<String> {
    let workbench = Workbench::open(
        workspace,
        cli.doc.as_deref(),
        cli.language.as_deref(),
        &cli.folders,
    )?;
    let rendered = match &cli.command {
        Commands::Edit => render(&commands::edit(&workbench)?, cli.human_readable),
        Commands::Undo => render(&commands::undo(&workbench)?, cli.human_readable),
        Commands::Redo => render(&commands::redo(&workbench)?, cli.human_readable),
        Commands::History { command } => match command {
            HistoryCommands::Show => {
                render(&commands::history_show(&workbench)?, cli.human_readable)
            }
            HistoryCommands::Clear => {
                render(&commands::history_clear(&workbench)?, cli.human_readable)
            }
        },
        Commands::Get { id, detail } => {
            render(&commands::get(&workbench, id, detail)?, cli.human_readable)
        }
        Commands::Set {
            id,
            value,
            target,
            in_language,
            detail,
        } => render(
            &commands::set(
                &workbench,
                id,
                Some(commands::parse_value(value)),
                target,
                *in_language,
                detail,
            )?,
            cli.human_readable,
        ),
        Commands::Unset {
            id,
            target,
            in_language,
            detail,
        } => render(
            &commands::set(&workbench, id, None, target, *in_language, detail)?,
            cli.human_readable,
        ),
        Commands::List => render(&commands::list(&workbench)?, cli.human_readable),
    };
    Ok(rendered)
}

fn render(output: &dyn Output, human: bool) -> String {
    if human {
        output.to_human()
    } else {
        output.to_json()
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Edit => "edit",
        Commands::Undo => "undo",
        Commands::Redo => "redo",
        Commands::History {
            command: HistoryCommands::Show,
        } => "history show",
        Commands::History {
            command: HistoryCommands::Clear,
        } => "history clear",
        Commands::Get { .. } => "get",
        Commands::Set { .. } => "set",
        Commands::Unset { .. } => "unset",
        Commands::List => "list",
    }
}

fn command_args(command: &Commands) -> serde_json::Value {
    match command {
        Commands::Get { id, detail } => serde_json::json!({ "id": id, "detail": detail }),
        Commands::Set {
            id,
            value,
            target,
            in_language,
            detail,
        } => serde_json::json!({
            "id": id,
            "value": value,
            "target": target,
            "in_language": in_language,
            "detail": detail,
        }),
        Commands::Unset {
            id,
            target,
            in_language,
            detail,
        } => serde_json::json!({
            "id": id,
            "target": target,
            "in_language": in_language,
            "detail": detail,
        }),
        _ => serde_json::Value::Null,
    }
}

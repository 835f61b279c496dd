//! enderpearl CLI entry point
//!
//! Usage:
//!   enderpearl                   Run the default operation (build)
//!   enderpearl run <operation>   Run an operation between pre and post
//!   enderpearl list              List operations in the script
//!   enderpearl config            Show resolved config entries
//!   enderpearl settings          Show resolved settings

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use enderpearl::cli::{Cli, Commands, ListArgs, OutputFormat, RunArgs};
use enderpearl::executor::CommandOutput;
use enderpearl::script::{
    execute, is_reserved, ConfigEntries, ConfigEntry, ExecutionReport, FailFast, Script,
};
use enderpearl::settings::{expand_path, find_settings_files, load_settings, Settings};
use enderpearl::ErrorInfo;
use enderpearl::ScriptError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Everything resolved before a subcommand runs
struct Project {
    settings: Settings,
    root: PathBuf,
    config: ConfigEntries,
    script: Option<Script>,
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings.as_deref())?;
    let overrides = cli.overrides();
    let root = cli.root.clone();

    match cli.command {
        Some(Commands::Settings) => show_settings(&settings, cli.verbose),
        Some(Commands::Run(args)) => {
            run_operation(args, &load_project(settings, root.as_deref(), overrides)?)
        }
        Some(Commands::List(args)) => {
            list_operations(args, &load_project(settings, root.as_deref(), overrides)?)
        }
        Some(Commands::Config(args)) => {
            show_config(args, &load_project(settings, root.as_deref(), overrides)?)
        }
        None => run_operation(
            RunArgs::default(),
            &load_project(settings, root.as_deref(), overrides)?,
        ),
    }
}

/// Read the config and script files of the project at `root`
fn load_project(
    settings: Settings,
    root: Option<&str>,
    overrides: Vec<ConfigEntry>,
) -> Result<Project> {
    let root = resolve_root(root)?;
    let source = settings.script_source(&root)?;
    let config = source
        .load_config()
        .with_context(|| format!("Failed to read {}", source.config_path().display()))?
        .with_overrides(overrides);
    let script = source
        .load_script(&config)
        .with_context(|| format!("Failed to read {}", source.script_path().display()))?;

    if script.is_none() {
        tracing::info!(
            "No {} in {}, nothing to do",
            settings.script.file,
            root.display()
        );
    }

    Ok(Project {
        settings,
        root,
        config,
        script,
    })
}

/// Resolve the project root, defaulting to the current directory
fn resolve_root(root: Option<&str>) -> Result<PathBuf> {
    match root {
        Some(raw) => {
            let path = expand_path(raw)?;
            if !path.is_dir() {
                anyhow::bail!("Project root '{}' not found", path.display());
            }
            Ok(path)
        }
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Run an operation with its pre and post operations
fn run_operation(args: RunArgs, project: &Project) -> Result<()> {
    let name = args.operation_name(&project.settings.script.default_operation);
    if is_reserved(&name) {
        return Err(ScriptError::ReservedOperation { name }.into());
    }

    let Some(script) = project.script.as_ref() else {
        return Ok(());
    };

    let mut settings = project.settings.clone();
    if let Some(timeout) = args.timeout {
        settings.shell.timeout = timeout;
    }
    settings.shell.capture_output |= args.capture;
    let fail_fast = args.fail_fast || settings.shell.fail_fast;

    let mut shell = settings.host_shell()?;

    let result = if fail_fast {
        execute(script, &name, &project.root, &mut FailFast::new(&mut shell))
    } else {
        execute(script, &name, &project.root, &mut shell)
    };

    let outputs = shell.take_outputs();

    match args.format {
        OutputFormat::Json => print_run_json(&result, &outputs)?,
        OutputFormat::Table | OutputFormat::Plain => {
            print_outputs(&outputs);
            if let Ok(report) = &result {
                print_summary(&name, report);
            }
        }
    }

    result?;
    Ok(())
}

fn print_outputs(outputs: &[CommandOutput]) {
    for output in outputs {
        println!("{} {}", "$".cyan(), output.command);
        if !output.stdout.is_empty() {
            print!("{}", output.stdout);
        }
        if !output.stderr.is_empty() {
            eprint!("{}", output.stderr);
        }
    }
}

fn print_summary(name: &str, report: &ExecutionReport) {
    if report.operations.is_empty() {
        tracing::info!("No operation named '{}'", name);
        return;
    }

    if report.success() {
        tracing::info!(
            "Finished '{}' ({} command(s))",
            name,
            report.commands_run
        );
    } else {
        eprintln!(
            "{}: {} of {} command(s) exited non-zero",
            "warning".yellow().bold(),
            report.failures.len(),
            report.commands_run
        );
        for (command, status) in &report.failures {
            let code = status
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            eprintln!("  - [{}] {}", code, command);
        }
    }
}

fn print_run_json(
    result: &Result<ExecutionReport, ScriptError>,
    outputs: &[CommandOutput],
) -> Result<()> {
    let json = match result {
        Ok(report) => serde_json::json!({
            "success": report.success(),
            "report": report,
            "outputs": outputs,
        }),
        Err(e) => serde_json::json!({
            "success": false,
            "error": ErrorInfo::from(e),
            "outputs": outputs,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// List operations defined in the script
fn list_operations(args: ListArgs, project: &Project) -> Result<()> {
    let script = project.script.clone().unwrap_or_default();

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&script)?);
        }
        OutputFormat::Plain => {
            for name in script.names() {
                println!("{}", name);
            }
        }
        OutputFormat::Table => {
            if script.is_empty() {
                println!("No operations found.");
                return Ok(());
            }
            for operation in script.operations() {
                println!("{}:", operation.name().green());
                for command in operation.commands() {
                    println!("    {}", command.text().trim_start());
                }
            }
        }
    }

    Ok(())
}

/// Show resolved config entries
fn show_config(args: ListArgs, project: &Project) -> Result<()> {
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project.config)?);
        }
        OutputFormat::Plain => {
            for entry in &project.config {
                println!("{}={}", entry.key, entry.value);
            }
        }
        OutputFormat::Table => {
            if project.config.is_empty() {
                println!("No config entries.");
                return Ok(());
            }
            let width = project.config.iter().map(|e| e.key.len()).max().unwrap_or(10);
            for entry in &project.config {
                println!("  {:width$}  {}", entry.key.cyan(), entry.value, width = width);
            }
        }
    }

    Ok(())
}

/// Show resolved settings as TOML
fn show_settings(settings: &Settings, verbose: bool) -> Result<()> {
    if verbose {
        for path in find_settings_files() {
            eprintln!("{}: {}", "loaded".cyan(), path.display());
        }
    }
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

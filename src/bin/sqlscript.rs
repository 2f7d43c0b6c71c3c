//! sqlscript: run sqlcmd-style SQL scripts
//!
//! # Usage
//!
//! ```bash
//! # Run a script file
//! sqlscript -f deploy.sql --database-url sqlite://app.db
//!
//! # Inline script with variables
//! sqlscript -q 'SELECT * FROM $(table)' -v table=users
//!
//! # Show the batches without executing
//! sqlscript -f deploy.sql --dry-run
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use sqlscript::args::parse_variable_args;
use sqlscript::config::Config;
use sqlscript::engine::{read_script, BatchEnd, BatchStart, Message, MessageKind, ResultSet};
use sqlscript::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlscript")]
#[command(version)]
#[command(about = "Run sqlcmd-style SQL scripts: GO batches, :SETVAR, :ON ERROR, $(var)", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlscript -f deploy.sql --database-url postgres://localhost/app
    sqlscript -q 'SELECT $(n)' -v n=42 --database-url sqlite::memory:
    sqlscript -f deploy.sql -m sqlcmdex -v env prod --dry-run
    sqlscript explain -f deploy.sql")]
struct Cli {
    #[command(flatten)]
    source: ScriptSource,

    /// Script dialect: normal, sqlcmd or sqlcmdex
    #[arg(short, long, global = true)]
    mode: Option<ExecutionMode>,

    /// Scripting variable as `name=value` or `name value` (repeatable)
    #[arg(short = 'v', long = "var", num_args = 1..=2, global = true)]
    vars: Vec<String>,

    /// Database connection URL
    #[arg(long, env = "SQLSCRIPT_DATABASE_URL")]
    database_url: Option<String>,

    /// Configuration file (default: ./sqlscript.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't execute, just show the batches
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Console output level
    #[arg(long, value_enum, default_value = "normal")]
    verbosity: Verbosity,

    /// Log filter, e.g. `debug` or `sqlscript=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ScriptSource {
    /// Inline script to run
    #[arg(conflicts_with_all = ["inline", "file"])]
    query: Option<String>,

    /// Inline script to run
    #[arg(short = 'q', long = "query", conflicts_with = "file")]
    inline: Option<String>,

    /// Script file to run
    #[arg(short, long)]
    file: Option<PathBuf>,
}

enum Script {
    File(PathBuf),
    Inline(String),
}

impl ScriptSource {
    fn script(&self) -> Option<Script> {
        if let Some(path) = &self.file {
            return Some(Script::File(path.clone()));
        }
        self.inline
            .as_ref()
            .or(self.query.as_ref())
            .map(|text| Script::Inline(text.clone()))
    }
}

impl Script {
    async fn text(&self) -> ScriptResult<String> {
        match self {
            Script::File(path) => read_script(path).await,
            Script::Inline(text) => Ok(text.clone()),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Verbosity {
    /// No console output at all
    Silent,
    /// Errors only
    Quiet,
    /// Result sets, warnings and a summary
    Normal,
    /// Adds batch start/end and durations
    Verbose,
    /// Adds the text of each batch
    VeryVerbose,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and explain its batches
    Explain {
        #[command(flatten)]
        source: ScriptSource,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(
        cli.log_level.as_deref(),
        config.log_level.as_deref(),
        cli.log_file.as_deref(),
    )?;

    let variables = parse_variable_args(&cli.vars)?;
    let options = config.parse_options(cli.mode, variables);

    if let Some(Commands::Explain { source }) = &cli.command {
        let Some(script) = source.script() else {
            anyhow::bail!("explain needs a script: pass QUERY, --query or --file");
        };
        return Ok(explain_script(&script.text().await?, &options));
    }

    let Some(script) = cli.source.script() else {
        println!("{}", "sqlscript: sqlcmd-style SQL scripts".cyan().bold());
        println!();
        println!("Usage: sqlscript [OPTIONS] [QUERY]");
        println!();
        println!("Try: sqlscript --help");
        return Ok(ExecutionResultCode::Success.exit_code());
    };

    let database_url = cli.database_url.as_ref().or(config.database_url.as_ref());
    let Some(database_url) = database_url.filter(|_| !cli.dry_run) else {
        let code = show_batches(&script.text().await?, &options, cli.format);
        if !cli.dry_run && cli.verbosity >= Verbosity::Normal {
            println!();
            println!(
                "{}",
                "⚠ No database URL. Use --database-url or set SQLSCRIPT_DATABASE_URL".yellow()
            );
        }
        return Ok(code);
    };

    if cli.verbosity >= Verbosity::Verbose {
        println!("{} {}", "Connecting to:".dimmed(), database_url);
    }
    let engine = match ScriptEngine::connect(database_url, options).await {
        Ok(engine) => engine,
        Err(e) => {
            if cli.verbosity >= Verbosity::Quiet {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            return Ok(ExecutionResultCode::ConnectionFailed.exit_code());
        }
    };

    let cancel = CancelToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut listener = ConsoleListener {
        verbosity: cli.verbosity,
        format: cli.format,
    };
    let result = match &script {
        Script::File(path) => engine.run_file(path, &mut listener, &cancel).await?,
        Script::Inline(text) => engine.run_script(text, &mut listener, &cancel).await,
    };
    listener.summary(&result);

    Ok(result.code.exit_code())
}

/// Install the tracing subscriber: `--log-level`, else RUST_LOG, else the
/// config file level, else `warn`.
fn init_tracing(
    cli_level: Option<&str>,
    config_level: Option<&str>,
    log_file: Option<&Path>,
) -> anyhow::Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(config_level.unwrap_or("warn"))?,
        },
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Prints engine events to the console according to the verbosity.
struct ConsoleListener {
    verbosity: Verbosity,
    format: OutputFormat,
}

impl ConsoleListener {
    fn summary(&self, result: &ExecutionResult) {
        if self.verbosity < Verbosity::Normal {
            return;
        }
        println!();
        let status = match result.code {
            ExecutionResultCode::Success if result.failed == 0 => "✓".green(),
            ExecutionResultCode::Success => "⚠".yellow(),
            _ => "✗".red(),
        };
        println!(
            "{} {} execution(s) succeeded, {} failed in {:.2?}",
            status,
            result.executed.to_string().cyan(),
            result.failed.to_string().cyan(),
            result.duration
        );
        if result.code != ExecutionResultCode::Success {
            println!("{} {:?}", "Result:".dimmed(), result.code);
        }
    }
}

impl ExecutionListener for ConsoleListener {
    fn on_batch_start(&mut self, start: &BatchStart) {
        if self.verbosity >= Verbosity::Verbose {
            println!(
                "{} {} ({}/{})",
                "▶ Batch".cyan().bold(),
                start.batch_number,
                start.execution_index,
                start.execution_count
            );
        }
        if self.verbosity >= Verbosity::VeryVerbose {
            println!("{}", start.sql.trim_end().dimmed());
        }
    }

    fn on_batch_end(&mut self, end: &BatchEnd) {
        if self.verbosity < Verbosity::Verbose {
            return;
        }
        if end.success {
            println!(
                "{} Batch {} completed in {:.2?}",
                "✓".green(),
                end.batch_number,
                end.duration
            );
        } else {
            println!(
                "{} Batch {} failed in {:.2?}",
                "✗".red(),
                end.batch_number,
                end.duration
            );
        }
    }

    fn on_result_set(&mut self, result: &ResultSet) {
        if self.verbosity >= Verbosity::Normal {
            format_output(result, self.format);
        }
    }

    fn on_message(&mut self, message: &Message) {
        match message.kind {
            MessageKind::Error if self.verbosity >= Verbosity::Quiet => {
                eprintln!("{} {}", "Error:".red().bold(), message.text);
            }
            MessageKind::Warning if self.verbosity >= Verbosity::Normal => {
                eprintln!("{} {}", "Warning:".yellow().bold(), message.text);
            }
            MessageKind::Info if self.verbosity >= Verbosity::Normal => {
                println!("{}", message.text);
            }
            _ => {}
        }
    }
}

fn format_output(result: &ResultSet, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Map<String, serde_json::Value>> = result
                .rows
                .iter()
                .map(|row| result.columns.iter().cloned().zip(row.iter().cloned()).collect())
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Column widths
            let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
            for row in &result.rows {
                for (width, val) in widths.iter_mut().zip(row) {
                    *width = (*width).max(val_to_string(val).len());
                }
            }

            let header: Vec<String> = result
                .columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in &result.rows {
                let cells: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(val, w)| format!("{:width$}", val_to_string(val), width = *w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", result.rows.len().to_string().cyan());
        }
    }
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

/// Parse without executing and print the batches. Returns the exit code.
fn show_batches(script: &str, options: &ParseOptions, format: OutputFormat) -> i32 {
    let mut context = ScriptContext::new(options);
    let mut batches = Vec::new();
    let mut code = ExecutionResultCode::Success;

    for next in BatchParser::for_script(script, &mut context) {
        match next {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                eprintln!("{} {}", "Parse Error:".red().bold(), e);
                code = ExecutionResultCode::ParseError;
            }
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&batches).unwrap_or_default());
        }
        OutputFormat::Table => {
            for (i, batch) in batches.iter().enumerate() {
                print_batch(i + 1, batch);
            }
            println!("{} batch(es)", batches.len().to_string().cyan());
        }
    }
    code.exit_code()
}

fn print_batch(number: usize, batch: &SqlBatch) {
    println!(
        "{} {} {}",
        format!("Batch {}", number).green().bold(),
        format!("(line {}, column {})", batch.start_line, batch.start_column).dimmed(),
        format!("× {}", batch.exec_count).yellow()
    );
    for line in batch.text.lines() {
        println!("  {}", line.white());
    }
    if !batch.is_executable() {
        println!("  {}", "(skipped: exec count is not positive)".yellow());
    }
    println!();
}

fn explain_script(script: &str, options: &ParseOptions) -> i32 {
    println!("{}", "SQL Script Explanation".cyan().bold());
    println!();
    println!("{} {}", "Mode:".dimmed(), options.mode.to_string().cyan());
    println!();

    let mut context = ScriptContext::new(options);
    let mut parser = BatchParser::for_script(script, &mut context);
    let mut code = ExecutionResultCode::Success;
    let mut count = 0;

    for next in parser.by_ref() {
        match next {
            Ok(batch) => {
                count += 1;
                print_batch(count, &batch);
            }
            Err(e) => {
                eprintln!("{} {}", "Parse Error:".red().bold(), e);
                code = ExecutionResultCode::ParseError;
            }
        }
    }

    let context = parser.context();
    let mut variables: Vec<_> = context.variables().iter().collect();
    variables.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    println!("{}", "Variables:".green().bold());
    if variables.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for var in variables {
        let lock = if var.can_be_overridden { "" } else { " (locked)" };
        println!("  {} = {}{}", var.name.white(), var.value.yellow(), lock.dimmed());
    }
    println!();
    println!(
        "{} {}",
        "Continue on error:".dimmed(),
        context.continue_on_error().to_string().cyan()
    );

    code.exit_code()
}

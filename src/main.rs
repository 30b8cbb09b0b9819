//! @ai:module:intent CLI entry point for emits
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on config, grammar, run, assembler, output

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use emits::{
    assemble, detect_language, output, parse_file, run_task, ConfigFile, GrammarCache,
    OutputFormat, RunOptions, Task, CONFIG_FILE_NAME,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "emits")]
#[command(author, version, about = "Extract structured metadata from annotated source comments")]
struct Cli {
    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task or a group of tasks and write documents
    Run {
        /// Task to run
        #[arg(long, short, conflicts_with = "group", required_unless_present = "group")]
        task: Option<String>,

        /// Group of tasks to run
        #[arg(long, short)]
        group: Option<String>,

        /// Path to the configuration file
        #[arg(long, short, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Directory searched for grammar files (defaults to the configuration's directory)
        #[arg(long)]
        grammar_dir: Option<PathBuf>,

        /// Base output directory; each task writes into <output>/<task>
        #[arg(long, short, default_value = "emits")]
        output: PathBuf,

        /// Keep previous output instead of removing it first
        #[arg(long, default_value = "false")]
        no_clean: bool,

        /// Output format for the run summary
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Parse one file and print its document without writing it
    Parse {
        /// Path to file
        path: PathBuf,

        /// Task supplying comment tokens, filters and grammars
        #[arg(long, short)]
        task: Option<String>,

        /// Path to the configuration file
        #[arg(long, short, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,

        /// Directory searched for grammar files (defaults to the configuration's directory)
        #[arg(long)]
        grammar_dir: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "json-pretty")]
        format: Format,
    },

    /// List configured tasks and groups
    List {
        /// Path to the configuration file
        #[arg(long, short, default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "emits=debug" } else { "emits=info" };
    if let Ok(directive) = directive.parse::<tracing_subscriber::filter::Directive>() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
            .init();
    }

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn execute(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Run {
            task,
            group,
            config,
            grammar_dir,
            output,
            no_clean,
            format,
        } => {
            let file = load_config(&config)?;
            let tasks: Vec<&Task> = match (task, group) {
                (Some(name), _) => vec![file.task(&name)?],
                (None, Some(name)) => file.group_tasks(&name)?,
                (None, None) => bail!("either --task or --group is required"),
            };
            let grammar_dir = grammar_dir.unwrap_or_else(|| config_dir(&config));

            let mut passed = true;
            for task in tasks {
                let grammars = load_grammars(&grammar_dir, task);
                let options = RunOptions {
                    output: output.join(&task.name),
                    clean: !no_clean,
                };
                let report = run_task(task, &grammars, &options)
                    .with_context(|| format!("task `{}` failed", task.name))?;
                println!("{}", output::format_report(&report, format.into()));
                passed &= report.passed();
            }

            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }

        Commands::Parse {
            path,
            task,
            config,
            grammar_dir,
            format,
        } => {
            let (task, grammars) = match task {
                Some(name) => {
                    let file = load_config(&config)?;
                    let task = file.task(&name)?.clone();
                    let grammar_dir = grammar_dir.unwrap_or_else(|| config_dir(&config));
                    let grammars = load_grammars(&grammar_dir, &task);
                    (task, grammars)
                }
                None => {
                    let Some(language) = detect_language(&path) else {
                        bail!(
                            "no comment tokens known for {}; pass --task",
                            path.display()
                        );
                    };
                    tracing::debug!("Using {} comment tokens", language.name());
                    (Task::with_tokens(language.comment_tokens()), GrammarCache::default())
                }
            };

            let parsed = parse_file(&path, &task, &grammars)?;
            let document = assemble(parsed, &task)?;
            println!("{}", output::format_document(&document, format.into()));
            Ok(ExitCode::SUCCESS)
        }

        Commands::List { config } => {
            let file = load_config(&config)?;

            println!("{}", "Tasks".bold());
            for task in &file.tasks {
                println!("  {} {}", task.name.cyan(), task.description.dimmed());
            }
            if !file.groups.is_empty() {
                println!("{}", "Groups".bold());
                for group in &file.groups {
                    println!("  {} {}", group.name.cyan(), group.tasks.join(", ").dimmed());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<ConfigFile> {
    ConfigFile::load(path).with_context(|| format!("cannot load {}", path.display()))
}

fn config_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// @ai:intent Load a task's grammars; failures are reported but never fatal
/// @ai:effects fs:read, io
fn load_grammars(dir: &Path, task: &Task) -> GrammarCache {
    let loaded = GrammarCache::load(dir, &task.grammar);
    for failure in &loaded.failures {
        eprintln!("{} {}", "Warning:".yellow().bold(), failure);
    }
    loaded.cache
}

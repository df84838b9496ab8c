use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tasktrack_core::config::{
    config_path, resolve_settings, write_config, Overrides, Settings, TrackerConfig,
};
use tasktrack_core::render::{render_task_table, tasks_to_json, ListView};
use tasktrack_core::storage::FileStorage;
use tasktrack_core::task::{DisplayStyle, LabelError, Priority, Status};
use tasktrack_core::task_ops::{
    add_task, delete_task, filter_by_status, now_timestamp, set_priority, set_status,
    sort_tasks, update_description, SortKey, TaskError,
};
use tasktrack_core::tracker::Tracker;

#[derive(Parser)]
#[command(name = "tasktrack", version, about = "Track tasks in a local JSON file")]
struct Cli {
    /// Task file to read and write (default: tasks.json in the working directory)
    #[arg(long, global = true, env = "TASKTRACK_FILE")]
    file: Option<PathBuf>,
    /// Print priority labels without colour
    #[arg(long, global = true)]
    plain: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Add a new task
    Add {
        description: String,
        #[arg(long, short, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
    },
    /// Replace a task's description
    Update { id: u32, description: String },
    /// Delete a task
    Delete { id: u32 },
    /// Mark a task as in progress
    MarkInProgress { id: u32 },
    /// Mark a task as done
    MarkDone { id: u32 },
    /// Change a task's priority (high, medium, low)
    #[command(name = "priority")]
    SetPriority {
        id: u32,
        #[arg(value_parser = parse_priority)]
        level: Priority,
    },
    /// List tasks, optionally filtered by status (all, todo, in-progress, done)
    List {
        status: Option<String>,
        #[arg(long, value_parser = parse_sort_key)]
        sort: Option<SortKey>,
        #[arg(long)]
        json: bool,
    },
    /// Write a starter .tasktrack.toml in the working directory
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print version information
    Version,
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    value.parse().map_err(|err: LabelError| err.to_string())
}

fn parse_sort_key(value: &str) -> Result<SortKey, String> {
    value.parse().map_err(|err: TaskError| err.to_string())
}

fn parse_status_filter(value: Option<&str>) -> Result<Option<Status>> {
    match value {
        None => Ok(None),
        Some(value) if value.trim().eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => Ok(Some(value.parse::<Status>()?)),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn tasktrack_home() -> Option<PathBuf> {
    let non_empty = |key: &str| {
        std::env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    };
    non_empty("TASKTRACK_HOME").or_else(|| {
        non_empty("HOME")
            .or_else(|| non_empty("USERPROFILE"))
            .map(|home| home.join(".tasktrack"))
    })
}

fn init_config(cwd: &Path, force: bool) -> Result<()> {
    let path = config_path(cwd);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let written = write_config(cwd, &TrackerConfig::starter())
        .with_context(|| format!("write {}", path.display()))?;
    println!("Wrote {}", written.display());
    Ok(())
}

fn resolve(cwd: &Path, overrides: &Overrides) -> Result<Settings> {
    let settings = resolve_settings(cwd, tasktrack_home().as_deref(), overrides)?;
    debug!(file = %settings.file.display(), style = ?settings.style, "resolved settings");
    Ok(settings)
}

fn open_tracker(settings: &Settings) -> Tracker<FileStorage> {
    Tracker::new(FileStorage::new(&settings.file))
}

fn run(command: Command, cwd: &Path, overrides: &Overrides) -> Result<()> {
    match command {
        Command::Add {
            description,
            priority,
        } => {
            let tracker = open_tracker(&resolve(cwd, overrides)?);
            let now = now_timestamp();
            let id = tracker.mutate(|tasks| add_task(tasks, &description, priority, &now))?;
            println!("Task added successfully (ID: {})", id);
        }
        Command::Update { id, description } => {
            let tracker = open_tracker(&resolve(cwd, overrides)?);
            let now = now_timestamp();
            tracker.mutate(|tasks| update_description(tasks, id, &description, &now))?;
            println!("Task updated successfully");
        }
        Command::Delete { id } => {
            let tracker = open_tracker(&resolve(cwd, overrides)?);
            tracker.mutate(|tasks| delete_task(tasks, id))?;
            println!("Task deleted successfully");
        }
        Command::MarkInProgress { id } => mark(&resolve(cwd, overrides)?, id, Status::InProgress)?,
        Command::MarkDone { id } => mark(&resolve(cwd, overrides)?, id, Status::Done)?,
        Command::SetPriority { id, level } => {
            let tracker = open_tracker(&resolve(cwd, overrides)?);
            let now = now_timestamp();
            tracker.mutate(|tasks| set_priority(tasks, id, level, &now))?;
            println!("Task priority set to {}", level);
        }
        Command::List { status, sort, json } => {
            let filter = parse_status_filter(status.as_deref())?;
            let settings = resolve(cwd, overrides)?;
            let tasks = open_tracker(&settings)
                .tasks()
                .with_context(|| format!("load tasks from {}", settings.file.display()))?;
            let mut selected = filter_by_status(&tasks, filter);
            if let Some(key) = sort {
                selected = sort_tasks(selected, key);
            }
            if json {
                println!("{}", tasks_to_json(&selected)?);
            } else {
                let view = ListView {
                    filter,
                    style: settings.style,
                    description_width: settings.description_width,
                };
                print!("{}", render_task_table(&selected, &view));
            }
        }
        Command::Init { force } => init_config(cwd, force)?,
        Command::Version => println!("tasktrack {}", tasktrack_core::version()),
    }
    Ok(())
}

fn mark(settings: &Settings, id: u32, status: Status) -> Result<()> {
    let now = now_timestamp();
    open_tracker(settings).mutate(|tasks| set_status(tasks, id, status, &now))?;
    println!("Task marked as {}", status);
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let cwd = std::env::current_dir().context("resolve working directory")?;
    let overrides = Overrides {
        file: cli.file,
        style: cli.plain.then_some(DisplayStyle::Plain),
    };
    run(command, &cwd, &overrides)
}

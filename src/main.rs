use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::*;
use eyre::{Context, Result};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use taskboard::{
    Board, Category, CategoryDraft, Config, DueState, Priority, StatusFilter, Task, TaskDraft, TaskPatch,
    TaskQuery, Urgency, due_state, jsonl, open_task_total, parse_due_date,
};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "Taskboard CLI - In-memory categorized task board")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the simulated per-operation latency
    #[arg(long)]
    no_latency: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks in display order
    List(ListArgs),

    /// Show one task
    Show { id: String },

    /// List categories with open task counts
    Categories,

    /// List completed tasks, most recent first
    Completed,

    /// Write tasks.jsonl and categories.jsonl into a directory, or print
    /// both collections to stdout with each line tagged by collection
    Export {
        /// Directory usable later as `seed_dir`
        dir: Option<PathBuf>,
    },

    /// Read commands from stdin and apply them to one board
    Shell,
}

#[derive(Args)]
struct ListArgs {
    /// Case-insensitive text to look for in title or description
    #[arg(short, long, default_value = "")]
    search: String,

    /// Only tasks of this category id
    #[arg(short, long)]
    category: Option<u64>,

    /// Only tasks of this priority (low, medium, high)
    #[arg(short, long, value_parser = parse_priority)]
    priority: Option<Priority>,

    /// all, active or completed
    #[arg(long, default_value = "all", value_parser = parse_status)]
    status: StatusFilter,
}

impl ListArgs {
    fn query(&self) -> TaskQuery {
        TaskQuery {
            search: self.search.clone(),
            category_id: self.category,
            priority: self.priority,
            status: self.status,
        }
    }
}

/// One line typed into `taskboard shell`
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Add a task: add [options] <category> <title...>
    Add {
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(short, long, value_parser = parse_urgency)]
        urgency: Option<Urgency>,
        /// YYYY-MM-DD or RFC 3339
        #[arg(short, long)]
        due: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        category: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        title: Vec<String>,
    },
    /// Change fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(short, long, value_parser = parse_urgency)]
        urgency: Option<Urgency>,
        /// YYYY-MM-DD, RFC 3339, or "none" to clear
        #[arg(short, long)]
        due: Option<String>,
    },
    /// Mark a task completed
    Done { id: String },
    /// Mark a task open again
    Undo { id: String },
    /// Delete a task
    Rm { id: String },
    /// Move a task to a 1-based position
    Move { id: String, position: i64 },
    /// List tasks
    List(ListArgs),
    /// Search title and description
    Search {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Show one task
    Show { id: String },
    /// List categories
    Cats,
    /// Add a category: addcat [options] <name...>
    Addcat {
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        name: Vec<String>,
    },
    /// Delete a category no task refers to
    Rmcat { id: String },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    s.parse().map_err(|e: eyre::Report| e.to_string())
}

fn parse_urgency(s: &str) -> Result<Urgency, String> {
    s.parse().map_err(|e: eyre::Report| e.to_string())
}

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    s.parse().map_err(|e: eyre::Report| e.to_string())
}

fn format_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".green(),
    }
}

fn format_urgency(urgency: Urgency) -> ColoredString {
    match urgency {
        Urgency::Critical => "critical".red().bold(),
        Urgency::High => "high".red(),
        Urgency::Medium => "medium".yellow(),
        Urgency::Low => "low".normal(),
    }
}

fn format_due(task: &Task) -> String {
    let Some(due) = task.due_date else {
        return String::new();
    };
    let label = due.format("%b %-d").to_string();
    match due_state(task, Utc::now()) {
        DueState::Overdue => format!("  overdue {}", label).red().to_string(),
        DueState::DueToday => "  due today".yellow().to_string(),
        _ => format!("  due {}", label).dimmed().to_string(),
    }
}

fn print_task(task: &Task, names: &HashMap<String, String>) {
    let check = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let title = if task.completed {
        task.title.dimmed().strikethrough()
    } else {
        task.title.normal()
    };
    let category = names.get(&task.category_id).map(String::as_str).unwrap_or("?");
    println!(
        "{} {:>3}  {}  {} / {}  {}{}",
        check,
        task.id,
        title,
        format_priority(task.priority),
        format_urgency(task.urgency),
        category.cyan(),
        format_due(task)
    );
}

fn print_task_detail(task: &Task, names: &HashMap<String, String>) {
    print_task(task, names);
    if !task.description.is_empty() {
        println!("      {}", task.description);
    }
    println!("      created {}", task.created_at.to_rfc3339());
    if let Some(completed_at) = task.completed_at {
        println!("      completed {}", completed_at.to_rfc3339());
    }
}

fn category_names(categories: &[Category]) -> HashMap<String, String> {
    categories.iter().map(|c| (c.id.to_string(), c.name.clone())).collect()
}

async fn print_tasks(board: &Board, tasks: &[Task]) {
    let names = category_names(&board.categories().await);
    if tasks.is_empty() {
        println!("{}", "No tasks found".dimmed());
    }
    for task in tasks {
        print_task(task, &names);
    }
}

async fn print_categories(board: &Board) {
    let categories = board.categories().await;
    println!("{:>3}  {} {}", "", "All tasks".bold(), open_task_total(&categories));
    for category in &categories {
        println!(
            "{:>3}  {} {}  {}",
            category.id,
            category.name.bold(),
            category.task_count,
            category.color.dimmed()
        );
    }
}

async fn show(board: &Board, id: &str) {
    match board.task(id).await {
        Some(task) => {
            let names = category_names(&board.categories().await);
            print_task_detail(&task, &names);
        }
        None => println!("Task {} not found", id),
    }
}

fn parse_due_arg(due: Option<String>) -> Result<Option<Option<chrono::DateTime<Utc>>>> {
    match due.as_deref() {
        None => Ok(None),
        Some("none") => Ok(Some(None)),
        Some(input) => Ok(Some(Some(parse_due_date(input)?))),
    }
}

/// Apply one shell command. Returns false when the shell should stop.
async fn run_shell_command(board: &Board, command: ShellCommand) -> Result<bool> {
    match command {
        ShellCommand::Add {
            priority,
            urgency,
            due,
            desc,
            category,
            title,
        } => {
            let draft = TaskDraft {
                title: title.join(" "),
                description: desc,
                category_id: category,
                priority,
                urgency,
                due_date: parse_due_arg(due)?.flatten(),
            };
            match board.create_task(draft).await {
                Ok(task) => println!("Created task {} at position {}", task.id, task.order),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        ShellCommand::Edit {
            id,
            title,
            desc,
            category,
            priority,
            urgency,
            due,
        } => {
            let patch = TaskPatch {
                title,
                description: desc,
                category_id: category,
                priority,
                urgency,
                due_date: parse_due_arg(due)?,
                completed: None,
            };
            if patch.is_empty() {
                println!("Nothing to change");
                return Ok(true);
            }
            match board.update_task(id.as_str(), patch).await {
                Ok(Some(task)) => println!("Updated task {}", task.id),
                Ok(None) => println!("Task {} not found", id),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        ShellCommand::Done { id } => match board.update_task(id.as_str(), TaskPatch::completed(true)).await {
            Ok(Some(task)) => println!("Completed task {}: {}", task.id, task.title),
            Ok(None) => println!("Task {} not found", id),
            Err(e) => println!("{}", e.to_string().red()),
        },
        ShellCommand::Undo { id } => match board.update_task(id.as_str(), TaskPatch::completed(false)).await {
            Ok(Some(task)) => println!("Reopened task {}: {}", task.id, task.title),
            Ok(None) => println!("Task {} not found", id),
            Err(e) => println!("{}", e.to_string().red()),
        },
        ShellCommand::Rm { id } => {
            if board.delete_task(id.as_str()).await {
                println!("Deleted task {}", id);
            } else {
                println!("Task {} not found", id);
            }
        }
        ShellCommand::Move { id, position } => {
            if board.reorder_task(id.as_str(), position).await {
                print_tasks(board, &board.tasks().await).await;
            } else {
                println!("Task {} not found", id);
            }
        }
        ShellCommand::List(args) => {
            let tasks = board.query(&args.query()).await;
            print_tasks(board, &tasks).await;
        }
        ShellCommand::Search { query } => {
            let tasks = board.search_tasks(&query.join(" ")).await;
            print_tasks(board, &tasks).await;
        }
        ShellCommand::Show { id } => show(board, &id).await,
        ShellCommand::Cats => print_categories(board).await,
        ShellCommand::Addcat { color, icon, name } => {
            let draft = CategoryDraft {
                name: name.join(" "),
                color,
                icon,
                description: None,
            };
            match board.create_category(draft).await {
                Ok(category) => println!("Created category {}: {}", category.id, category.name),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        ShellCommand::Rmcat { id } => match board.delete_category(id.as_str()).await {
            Ok(true) => println!("Deleted category {}", id),
            Ok(false) => println!("Category {} not found", id),
            Err(e) => println!("{}", e.to_string().red()),
        },
        ShellCommand::Quit => return Ok(false),
    }
    Ok(true)
}

async fn run_shell(board: &Board) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "taskboard>".bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read from stdin")? == 0 {
            break;
        }

        let words = match shell_words::split(&line) {
            Ok(words) => words,
            Err(e) => {
                println!("{}", format!("Error: {}", e).red());
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                // Help and usage errors both render through clap
                let _ = e.print();
                continue;
            }
        };

        match run_shell_command(board, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}", format!("Error: {:#}", e).red()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing; stdout is reserved for command output
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.no_latency {
        config.latency.enabled = false;
    }
    let board = Board::from_config(&config)?;

    match cli.command {
        Commands::List(args) => {
            let tasks = board.query(&args.query()).await;
            print_tasks(&board, &tasks).await;
        }
        Commands::Show { id } => show(&board, &id).await,
        Commands::Categories => print_categories(&board).await,
        Commands::Completed => {
            let tasks = board.completed_tasks().await;
            print_tasks(&board, &tasks).await;
        }
        Commands::Export { dir } => {
            let snapshot = board.snapshot().await;
            match dir {
                Some(dir) => {
                    snapshot.write_dir(&dir)?;
                    println!("Exported {} tasks to {}", snapshot.tasks.len(), dir.display());
                }
                None => {
                    let stdout = io::stdout();
                    jsonl::write_tagged_jsonl(stdout.lock(), &snapshot.categories)?;
                    jsonl::write_tagged_jsonl(stdout.lock(), &snapshot.tasks)?;
                }
            }
        }
        Commands::Shell => run_shell(&board).await?,
    }

    Ok(())
}

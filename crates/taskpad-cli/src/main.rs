/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Task API calls and worker runs with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use taskpad_cli::commands::{self, format_task, format_task_detail};
use taskpad_cli::{CliConfig, spawn_notice_printer};
use taskpad_client::{SessionManager, TaskStatus, TaskpadClient, UpdateTaskRequest};

const NOTICE_FLUSH: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "taskpad", version, about = "Client for the taskpad text-processing API")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    /// Override the backend base URL
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
    #[arg(long, value_name = "EMAIL", global = true)]
    email: Option<String>,
    /// End the backend session once the command finishes
    #[arg(long, global = true)]
    logout: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Create an account
    Register,
    /// Query backend health
    Health {
        /// Check the database connection instead
        #[arg(long)]
        db: bool,
    },
    /// Manage tasks (requires login)
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Run the text worker locally and print each message as JSON
    Worker { text: String },
}

#[derive(Subcommand, Debug)]
enum TaskAction {
    List,
    Create {
        text: String,
    },
    Show {
        id: String,
    },
    Update {
        id: String,
        #[arg(long)]
        status: TaskStatus,
        #[arg(long, default_value = "")]
        result: String,
    },
    Delete {
        id: String,
    },
    /// Process a task with the worker and save the result
    Process {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    if let Command::Init { output } = &args.command {
        let output = output
            .clone()
            .or_else(|| args.config_path.clone())
            .or_else(CliConfig::default_path)
            .context("no configuration directory available; pass --output")?;
        return cli::init::run_init(output);
    }

    let mut config = CliConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(url) = args.api_url.clone() {
        config.api_url = Some(url);
    }

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let client = TaskpadClient::with_config(config.client_config()).context("build HTTP client")?;
    info!(base_url = %client.base_url(), "starting taskpad");

    let printer_stop = CancellationToken::new();
    let printer = spawn_notice_printer(client.events().subscribe(), printer_stop.clone());
    let session = SessionManager::new(client.clone());

    let outcome = run(args.command, args.email.as_deref(), &config, &session, &shutdown).await;

    if args.logout && session.is_authenticated() {
        session.logout().await;
        session.client().events().info_notice("Logged out");
        info!("session ended");
    }

    // Dropping the last client handle closes the event bus, which lets the
    // printer drain and exit.
    session.shutdown();
    drop(session);
    drop(client);
    if tokio::time::timeout(NOTICE_FLUSH, printer).await.is_err() {
        printer_stop.cancel();
    }

    outcome
}

async fn run(
    command: Command,
    email: Option<&str>,
    config: &CliConfig,
    session: &SessionManager,
    shutdown: &CancellationToken,
) -> Result<()> {
    let client = session.client();

    match command {
        Command::Init { .. } => Ok(()),
        Command::Register => commands::register(session, config, email).await,
        Command::Health { db } => {
            let body = if db {
                client.health_db().await
            } else {
                client.health().await
            }
            .context("health check")?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Command::Worker { text } => {
            commands::worker_probe(&text, shutdown, |line| println!("{line}")).await
        }
        Command::Tasks { action } => {
            commands::sign_in(session, config, email).await?;
            run_task_action(action, client, shutdown).await
        }
    }
}

async fn run_task_action(
    action: TaskAction,
    client: &TaskpadClient,
    shutdown: &CancellationToken,
) -> Result<()> {
    match action {
        TaskAction::List => {
            let tasks = client.list_tasks().await.context("list tasks")?;
            if tasks.is_empty() {
                println!("No tasks yet.");
            }
            for task in &tasks {
                println!("{}", format_task(task));
            }
        }
        TaskAction::Create { text } => {
            let task = client.create_task(&text).await.context("create task")?;
            println!("{}", format_task(&task));
        }
        TaskAction::Show { id } => {
            let task = client.get_task(&id).await.context("fetch task")?;
            println!("{}", format_task_detail(&task));
        }
        TaskAction::Update { id, status, result } => {
            let update = UpdateTaskRequest { status, result };
            let task = client.update_task(&id, &update).await.context("update task")?;
            println!("{}", format_task(&task));
        }
        TaskAction::Delete { id } => {
            client.delete_task(&id).await.context("delete task")?;
            println!("Deleted {id}");
        }
        TaskAction::Process { id } => {
            let task = commands::process_task(client, &id, shutdown, |value, step| {
                eprintln!("[{value:>3}%] {step}");
            })
            .await?;
            println!("{}", format_task_detail(&task));
        }
    }
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}

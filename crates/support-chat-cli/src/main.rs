//! Terminal shell for the support chat widget and admin console.

mod config;
mod demo;
mod shell;

use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::shell::{AdminCommand, WidgetCommand};
use support_chat::client::{AdminBackend, TranslateBackend, WidgetBackend};
use support_chat::prelude::*;
use support_chat::{AdminConsole, SupportWidget};

/// Terminal shell for the support chat widget.
#[derive(Parser, Debug)]
#[command(name = "support-chat", version, about, long_about = None)]
struct Cli {
    /// Run against an in-memory backend instead of a server
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with support as a logged-in user (default).
    Widget,
    /// Answer tickets as support staff.
    Admin {
        /// Ticket to open on start
        #[arg(long)]
        ticket: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(base_url = %config.client.base_url, demo = cli.demo, "Starting support chat shell");

    match cli.command.unwrap_or(Commands::Widget) {
        Commands::Widget if cli.demo => {
            let backend = demo::widget_backend();
            let replies = demo::spawn_admin_replies(backend.clone(), Duration::from_secs(20));
            let (widget, events) = SupportWidget::new(backend, config.sync.clone());
            run_widget(widget, events).await?;
            replies.abort();
        }
        Commands::Widget => {
            let (widget, events) = WidgetBuilder::new()
                .client_config(config.client_config())
                .sync_config(config.sync.clone())
                .build()?;
            run_widget(widget, events).await?;
        }
        Commands::Admin { ticket } if cli.demo => {
            let (console, events) = AdminConsole::new(demo::admin_backend(), config.sync.clone());
            run_admin(console, events, ticket.or(Some(1)).map(TicketId)).await?;
        }
        Commands::Admin { ticket } => {
            let (console, events) = AdminConsoleBuilder::new()
                .client_config(config.client_config())
                .sync_config(config.sync.clone())
                .build()?;
            run_admin(console, events, ticket.map(TicketId)).await?;
        }
    }

    tracing::info!("Support chat shell stopped");
    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so they never interleave with the chat on stdout
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn spawn_printer(mut events: mpsc::Receiver<WidgetEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            for line in shell::format_event(&event) {
                println!("{}", line);
            }
        }
    })
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

async fn run_widget<B>(widget: SupportWidget<B>, events: mpsc::Receiver<WidgetEvent>) -> Result<()>
where
    B: WidgetBackend + TranslateBackend + ?Sized + 'static,
{
    let printer = spawn_printer(events);
    println!("{}", shell::WIDGET_HELP);
    widget.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        let command = match shell::parse_widget(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("! {}", e);
                continue;
            }
        };

        match command {
            WidgetCommand::Open => widget.open().await,
            WidgetCommand::Close => widget.close().await,
            WidgetCommand::Translate(id) => widget.toggle_translation(id).await,
            WidgetCommand::Show => print_lines(shell::format_view(&widget.view())),
            WidgetCommand::Help => println!("{}", shell::WIDGET_HELP),
            WidgetCommand::Quit => break,
            WidgetCommand::Send(text) => {
                if !widget.is_open() {
                    widget.open().await;
                }
                if let Err(e) = widget.send(&text).await {
                    tracing::debug!(error = %e, "Send failed");
                }
            }
        }
    }

    widget.shutdown().await;
    printer.abort();
    Ok(())
}

async fn run_admin<B>(
    console: AdminConsole<B>,
    events: mpsc::Receiver<WidgetEvent>,
    initial: Option<TicketId>,
) -> Result<()>
where
    B: AdminBackend + TranslateBackend + ?Sized + 'static,
{
    let printer = spawn_printer(events);
    println!("{}", shell::ADMIN_HELP);

    if let Some(ticket_id) = initial {
        // Failures are already reported through the status line
        let _ = console.open_ticket(ticket_id).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };

        let command = match shell::parse_admin(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("! {}", e);
                continue;
            }
        };

        let result = match command {
            AdminCommand::Ticket(id) => console.open_ticket(id).await,
            AdminCommand::Reload => console.reload().await,
            AdminCommand::Reply(text) => console.reply(&text).await,
            AdminCommand::Close => console.close_ticket().await,
            AdminCommand::Delete => console.delete_ticket().await,
            AdminCommand::Status(status) => console.set_status(status).await,
            AdminCommand::Broadcast(target, message) => console.broadcast(&message, target).await,
            AdminCommand::Translate(id) => {
                console.toggle_translation(id).await;
                Ok(())
            }
            AdminCommand::Show => {
                print_lines(shell::format_view(&console.view()));
                Ok(())
            }
            AdminCommand::Help => {
                println!("{}", shell::ADMIN_HELP);
                Ok(())
            }
            AdminCommand::Quit => break,
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "Admin action failed");
        }
    }

    console.shutdown();
    printer.abort();
    Ok(())
}

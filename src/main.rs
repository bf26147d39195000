use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::sync::mpsc;

use botkit::config::BotkitConfig;
use botkit::error::{ClientError, ErrorCode};
use botkit::job::{Job, JobKind};
use botkit::poll::PollPolicy;
use botkit::services::chat::{self, ChatRequest, ChatSubmit};
use botkit::services::export::{self, ExportComplete, ExportOptions, ExportSubmit, PaperSize};
use botkit::services::migration::{self, MigrationOptions, MigrationReport, MigrationSubmit};
use botkit::surface::{JobEvent, JobSurface};
use botkit::transport::HttpAjax;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("could not save the download: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            CliError::Client(e) => e.error_code(),
            CliError::Io(_) => "E_IO",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "botkit", about = "AI BotKit chat, export, and migration CLI")]
struct Cli {
    /// WordPress site root, e.g. https://example.com
    #[arg(long, env = "BOTKIT_BASE_URL")]
    base_url: String,

    #[arg(long, env = "BOTKIT_NONCE")]
    nonce: String,

    #[arg(long, env = "BOTKIT_BOT_ID")]
    bot_id: Option<String>,

    /// Delay between status polls, in milliseconds.
    #[arg(long, env = "BOTKIT_POLL_INTERVAL_MS", default_value_t = botkit::config::DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    ajax: Arc<HttpAjax>,
    policy: PollPolicy,
    bot_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Chat(ChatCommand),
    Export(ExportCommand),
    Migrate(MigrateCommand),
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    /// Send a message and print the reply, streaming chunks as they arrive.
    Send {
        #[arg(long)]
        message: String,

        /// Continue an existing conversation.
        #[arg(long)]
        conversation: Option<i64>,

        /// Override the default bot for this message.
        #[arg(long)]
        bot: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ExportCommand {
    #[command(subcommand)]
    command: ExportSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExportSubcommand {
    /// Start a batch export and watch it to the download URL.
    Start {
        /// Conversation ids, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        conversations: Vec<i64>,

        /// Include timestamps and titles in the PDF.
        #[arg(long)]
        metadata: bool,

        /// Include site branding in the PDF.
        #[arg(long)]
        branding: bool,

        #[arg(long, default_value = "a4")]
        paper_size: PaperSize,

        /// Save the finished PDF to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Read the status of an accepted batch once.
    Status {
        #[arg(long)]
        batch_id: String,
    },
}

#[derive(Args, Debug)]
struct MigrateCommand {
    #[command(subcommand)]
    command: MigrateSubcommand,
}

#[derive(Subcommand, Debug)]
enum MigrateSubcommand {
    /// Start the knowledge-base migration and watch it to completion.
    Start {
        /// Entries per server-side batch.
        #[arg(long)]
        batch_size: Option<u32>,

        /// Walk the data without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Start the job and return without polling.
        #[arg(long)]
        no_watch: bool,
    },
    /// Read the migration status once.
    Status,
}

#[tokio::main]
async fn main() {
    // stdout carries replies and download URLs; logs stay on stderr
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{}: {e}", e.code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = BotkitConfig::new(cli.base_url, cli.nonce);
    config.bot_id = cli.bot_id;
    config.poll_interval_ms = cli.poll_interval_ms;

    let ctx = CliContext {
        ajax: Arc::new(HttpAjax::new(&config)?),
        policy: PollPolicy::with_interval(Duration::from_millis(config.poll_interval_ms)),
        bot_id: config.bot_id.clone(),
    };

    match cli.command {
        Command::Chat(chat) => match chat.command {
            ChatSubcommand::Send { message, conversation, bot } => {
                run_chat_send(&ctx, message, conversation, bot).await
            }
        },
        Command::Export(export) => match export.command {
            ExportSubcommand::Start { conversations, metadata, branding, paper_size, out } => {
                run_export_start(&ctx, conversations, metadata, branding, paper_size, out).await
            }
            ExportSubcommand::Status { batch_id } => run_export_status(&ctx, &batch_id).await,
        },
        Command::Migrate(migrate) => match migrate.command {
            MigrateSubcommand::Start { batch_size, dry_run, no_watch } => {
                run_migrate_start(&ctx, batch_size, dry_run, no_watch).await
            }
            MigrateSubcommand::Status => run_migrate_status(&ctx).await,
        },
    }
}

// =============================================================================
// CHAT
// =============================================================================

async fn run_chat_send(
    ctx: &CliContext,
    message: String,
    conversation: Option<i64>,
    bot: Option<String>,
) -> Result<(), CliError> {
    let mut request = ChatRequest::new(message);
    if let Some(id) = conversation {
        request = request.with_conversation(id);
    }
    if let Some(bot_id) = bot.or_else(|| ctx.bot_id.clone()) {
        request = request.with_bot(bot_id);
    }

    match chat::send_message(ctx.ajax.as_ref(), &request).await? {
        ChatSubmit::Complete(reply) => {
            println!("{}", reply.content);
            print_sources(reply.sources.as_ref());
            Ok(())
        }
        ChatSubmit::Streaming { response_id } => {
            let probe = chat::StreamProbe::new(ctx.ajax.clone(), response_id.clone());
            let job = Job::accepted(response_id, JobKind::ChatResponse);
            let mut surface = JobSurface::new();
            let mut rx = surface.submit(probe, job, ctx.policy);

            // Updates carry the whole text so far; print only what is new.
            let mut printed = 0usize;
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(JobEvent::Progress(_, assembled)) => {
                            print!("{}", assembled.get(printed..).unwrap_or_default());
                            let _ = io::stdout().flush();
                            printed = assembled.len();
                        }
                        Some(JobEvent::Completed(reply)) => {
                            println!("{}", reply.content.get(printed..).unwrap_or_default());
                            print_sources(reply.sources.as_ref());
                            return Ok(());
                        }
                        Some(JobEvent::Failed(e)) => return Err(e.into()),
                        None => exit_cancelled(),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        surface.cancel();
                        exit_cancelled();
                    }
                }
            }
        }
    }
}

fn print_sources(sources: Option<&Value>) {
    if let Some(sources) = sources {
        eprintln!("sources: {sources}");
    }
}

// =============================================================================
// EXPORT
// =============================================================================

async fn run_export_start(
    ctx: &CliContext,
    conversations: Vec<i64>,
    metadata: bool,
    branding: bool,
    paper_size: PaperSize,
    out: Option<PathBuf>,
) -> Result<(), CliError> {
    let options = ExportOptions {
        conversation_ids: conversations,
        include_metadata: metadata,
        include_branding: branding,
        paper_size,
    };

    let complete = match export::start_batch_export(ctx.ajax.as_ref(), &options).await? {
        ExportSubmit::Complete(complete) => complete,
        ExportSubmit::Processing { batch_id } => {
            eprintln!("batch {batch_id} accepted");
            let probe = export::ExportProbe::new(ctx.ajax.clone(), batch_id.clone());
            let job = Job::accepted(batch_id, JobKind::PdfExportBatch);
            let mut surface = JobSurface::new();
            let mut rx = surface.submit(probe, job, ctx.policy);
            watch_export(&mut surface, &mut rx).await?
        }
    };

    if complete.failed > 0 {
        eprintln!("{} conversations failed to export", complete.failed);
    }
    println!("{}", complete.download_url);

    if let Some(path) = out {
        let bytes = ctx.ajax.download(&complete.download_url).await?;
        tokio::fs::write(&path, &bytes).await?;
        eprintln!("saved {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}

async fn watch_export(
    surface: &mut JobSurface,
    rx: &mut mpsc::Receiver<JobEvent<(), ExportComplete>>,
) -> Result<ExportComplete, CliError> {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(JobEvent::Progress(job, ())) => print_progress(&job),
                Some(JobEvent::Completed(complete)) => return Ok(complete),
                Some(JobEvent::Failed(e)) => return Err(e.into()),
                None => exit_cancelled(),
            },
            _ = tokio::signal::ctrl_c() => {
                surface.cancel();
                exit_cancelled();
            }
        }
    }
}

async fn run_export_status(ctx: &CliContext, batch_id: &str) -> Result<(), CliError> {
    let status = export::fetch_export_status(ctx.ajax.as_ref(), batch_id).await?;
    println!("{} {}", status.status, status.progress.label());
    if let Some(message) = status.message {
        eprintln!("{message}");
    }
    if let Some(url) = status.download_url {
        println!("{url}");
    }
    Ok(())
}

// =============================================================================
// MIGRATION
// =============================================================================

async fn run_migrate_start(
    ctx: &CliContext,
    batch_size: Option<u32>,
    dry_run: bool,
    no_watch: bool,
) -> Result<(), CliError> {
    let options = MigrationOptions { batch_size, dry_run };

    match migration::start_migration(ctx.ajax.as_ref(), &options).await? {
        MigrationSubmit::Complete(report) => {
            print_report(&report);
            Ok(())
        }
        MigrationSubmit::Processing => {
            if no_watch {
                println!("migration started");
                return Ok(());
            }
            let probe = migration::MigrationProbe::new(ctx.ajax.clone());
            let job = Job::accepted(migration::MIGRATION_JOB_ID, JobKind::Migration);
            let mut surface = JobSurface::new();
            let mut rx = surface.submit(probe, job, ctx.policy);
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(JobEvent::Progress(job, phase)) => {
                            print_progress_with_phase(&job, phase.as_deref());
                        }
                        Some(JobEvent::Completed(report)) => {
                            print_report(&report);
                            return Ok(());
                        }
                        Some(JobEvent::Failed(e)) => return Err(e.into()),
                        None => exit_cancelled(),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        surface.cancel();
                        exit_cancelled();
                    }
                }
            }
        }
    }
}

async fn run_migrate_status(ctx: &CliContext) -> Result<(), CliError> {
    let status = migration::fetch_migration_status(ctx.ajax.as_ref()).await?;
    println!("{} {}", status.status, status.progress.label());
    if let Some(message) = status.message {
        eprintln!("{message}");
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!("migrated {} entries, {} failed", report.migrated, report.failed);
    if let Some(message) = &report.message {
        eprintln!("{message}");
    }
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_progress(job: &Job) {
    if let Some(progress) = job.progress {
        eprintln!("{:>5.1}% {}", progress.percent(), progress.label());
    }
}

fn print_progress_with_phase(job: &Job, phase: Option<&str>) {
    if let Some(progress) = job.progress {
        eprint!("{:>5.1}% {}", progress.percent(), progress.label());
    }
    if let Some(phase) = phase {
        eprint!("  {phase}");
    }
    eprintln!();
}

fn exit_cancelled() -> ! {
    eprintln!("cancelled");
    // 128 + SIGINT
    std::process::exit(130);
}

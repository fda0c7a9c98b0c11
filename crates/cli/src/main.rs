//! GSP CLI - production timeline of garment referencias.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use gsp_client::{HttpReferenceService, MockReferenceService, ReferenceServiceClient};
use gsp_core::{catalog, calculate_duration, ActionRequest, PhaseStatus, ReferenceId};
use gsp_timeline::{CompletionEstimator, KanbanViewModel, TimelineAssembler, TimelineConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gsp")]
#[command(about = "Production timeline of garment referencias", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend address; without it an in-memory demo service is used
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Phase the demo referencia is seeded at
    #[arg(long, global = true, default_value = "corte")]
    demo_phase: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List production stages and phases
    Catalog,
    /// Show the timeline of a referencia
    Timeline {
        /// Referencia ID
        reference: String,
    },
    /// Show the kanban board of a referencia
    Kanban {
        /// Referencia ID
        reference: String,
    },
    /// Deliver the current phase
    Deliver {
        /// Referencia ID
        reference: String,
        /// Phase slug
        phase: String,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Return a completed phase for rework
    Return {
        /// Referencia ID
        reference: String,
        /// Phase slug
        phase: String,
        /// Reason for the return
        #[arg(long)]
        notes: String,
    },
    /// Hours between two RFC 3339 timestamps
    Duration {
        /// Start timestamp
        start: String,
        /// End timestamp
        end: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => TimelineConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TimelineConfig::default(),
    };

    match &cli.command {
        Commands::Catalog => print_catalog(&config),
        Commands::Duration { start, end } => {
            let hours = calculate_duration(start, end)?;
            println!("{hours}");
        }
        Commands::Timeline { reference } => {
            let assembler = load(&cli, &config, reference).await?;
            print_timeline(&assembler, cli.json)?;
        }
        Commands::Kanban { reference } => {
            let id = ReferenceId::new(reference.as_str());
            let client = build_client(&cli, &config, &id).await;
            let fases = client.available_phases(&id).await?;
            let detail = client.fetch_reference(&id).await?;
            let cards =
                KanbanViewModel::derive(&fases, &detail.current_phase, detail.start_date, &config);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else {
                println!("Kanban {} ({})", detail.referencia_id, detail.collection_name);
                for card in cards {
                    println!(
                        "  {:<14} | {:<10} | {:<16} | desde {} {}{}",
                        card.slug,
                        card.status.label(),
                        card.responsible,
                        card.estimated_start.format("%Y-%m-%d %H:%M"),
                        if card.can_deliver { "[entregar]" } else { "" },
                        if card.can_return { "[devolver]" } else { "" },
                    );
                }
            }
        }
        Commands::Deliver { reference, phase, notes } => {
            let mut request = ActionRequest::deliver(phase.as_str());
            if let Some(notes) = notes {
                request = request.with_notes(notes.as_str());
            }
            act(&cli, &config, reference, request).await?;
        }
        Commands::Return { reference, phase, notes } => {
            let request = ActionRequest::return_phase(phase.as_str(), notes.as_str());
            act(&cli, &config, reference, request).await?;
        }
    }

    Ok(())
}

async fn build_client(
    cli: &Cli,
    config: &TimelineConfig,
    id: &ReferenceId,
) -> Arc<dyn ReferenceServiceClient> {
    match &cli.base_url {
        Some(url) => {
            debug!("Using reference service at {}", url);
            Arc::new(HttpReferenceService::new(url.as_str()))
        }
        None => {
            info!("No --base-url given, using demo data");
            let service = MockReferenceService::new(config.mock.clone());
            service.seed_demo(id.clone(), &cli.demo_phase, Utc::now()).await;
            Arc::new(service)
        }
    }
}

async fn load(
    cli: &Cli,
    config: &TimelineConfig,
    reference: &str,
) -> Result<TimelineAssembler<Arc<dyn ReferenceServiceClient>>> {
    let id = ReferenceId::new(reference);
    let client = build_client(cli, config, &id).await;
    let mut assembler = TimelineAssembler::new(client, config.clone(), id);
    assembler.refresh_timeline().await?;
    Ok(assembler)
}

async fn act(
    cli: &Cli,
    config: &TimelineConfig,
    reference: &str,
    request: ActionRequest,
) -> Result<()> {
    let mut assembler = load(cli, config, reference).await?;
    let action = request.action;
    let phase = request.phase_slug.clone();

    if !assembler.perform_action(request).await {
        let message = assembler.error_message().unwrap_or_default();
        anyhow::bail!("{action} {phase} failed: {message}");
    }

    println!("{action} {phase}: ok");
    print_timeline(&assembler, cli.json)
}

fn print_catalog(config: &TimelineConfig) {
    for stage in catalog::production_stages() {
        println!("{} ({})", stage.name, stage.slug);
        for phase in stage.phases {
            let metrics = config.metrics_for(phase.slug);
            println!(
                "  {:<14} | {:<14} | {:<22} | est. {:>5.1}h avg {:>5.1}h",
                phase.slug,
                phase.name,
                phase.area_name,
                metrics.estimated_duration,
                metrics.average_duration,
            );
        }
    }
}

fn print_timeline<C: ReferenceServiceClient>(
    assembler: &TimelineAssembler<C>,
    json: bool,
) -> Result<()> {
    let timeline = assembler
        .timeline()
        .context("timeline was not loaded")?;

    if json {
        println!("{}", serde_json::to_string_pretty(timeline)?);
        return Ok(());
    }

    let now = Utc::now();
    println!("Referencia {} - {}", timeline.referencia_id, timeline.collection_name);
    println!("  Current phase: {}", timeline.current_phase);
    println!("  Completion: {}%", timeline.completion_percentage(now));
    println!(
        "  Estimated: {:.1}h  Actual: {:.1}h  Target: {}",
        timeline.total_estimated_duration(),
        timeline.total_actual_duration(),
        timeline.target_completion_date.format("%Y-%m-%d"),
    );
    if !timeline.is_completed(now) {
        println!(
            "  Projected completion: {}",
            CompletionEstimator.estimate_completion(timeline, now).format("%Y-%m-%d"),
        );
    }

    let snapshots = timeline.snapshots(now);
    for stage in &timeline.stages {
        let done = if timeline.stage_is_completed(&stage.slug, now) { " ✓" } else { "" };
        println!("  {}{}", stage.name, done);
        for snap in snapshots
            .iter()
            .filter(|s| stage.phases.iter().any(|p| p.slug == s.phase.slug))
        {
            let marker = match snap.status {
                PhaseStatus::Completed => "x",
                PhaseStatus::Current => ">",
                PhaseStatus::Overdue => "!",
                PhaseStatus::Returned => "<",
                PhaseStatus::Pending => " ",
            };
            println!(
                "    [{}] {:<14} {:<10} {}",
                marker,
                snap.phase.slug,
                snap.status.label(),
                snap.phase.responsible_user.as_deref().unwrap_or("-"),
            );
        }
    }
    Ok(())
}

use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

use crate::calendar::{MonthGrid, YearMonth, WEEKDAY_LABELS};
use crate::config::{Config, StorageKind};
use crate::form::EventInput;
use crate::models::event::DEFAULT_COLOR;
use crate::models::{Event, EventId};
use crate::planner::Planner;
use crate::store::{EventStore, Storage};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "yotei")]
#[command(about = "Schedule classes on a month calendar, over the web or from the terminal")]
pub struct Cli {
    /// Work against the local events file only, never the server
    #[arg(long, global = true)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web calendar and the /api/events endpoint (default)
    Serve,
    /// Print a month grid with its events
    Month {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Create an event
    Add(EventArgs),
    /// Change fields of an existing event
    Edit {
        id: EventId,

        #[command(flatten)]
        changes: EditArgs,
    },
    /// Print one event
    Show { id: EventId },
    /// Delete an event after confirmation
    Delete {
        id: EventId,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Append every event from a JSON array file
    Import { file: PathBuf },
    /// Print the whole collection as JSON
    Export,
}

#[derive(Args)]
pub struct EventArgs {
    #[arg(long)]
    name: String,

    /// Day of the event (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Start time (HH:MM)
    #[arg(long)]
    start: String,

    /// End time (HH:MM)
    #[arg(long)]
    end: String,

    #[arg(long, default_value = "")]
    location: String,

    #[arg(long, default_value = "")]
    instructor: String,

    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,
}

impl From<EventArgs> for EventInput {
    fn from(args: EventArgs) -> Self {
        EventInput {
            location: args.location,
            name: args.name,
            date: args.date,
            start_time: args.start,
            end_time: args.end,
            instructor: args.instructor,
            color: args.color,
        }
    }
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    instructor: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

impl EditArgs {
    fn apply(self, input: &mut EventInput) {
        let fields = [
            (self.name, &mut input.name),
            (self.date, &mut input.date),
            (self.start, &mut input.start_time),
            (self.end, &mut input.end_time),
            (self.location, &mut input.location),
            (self.instructor, &mut input.instructor),
            (self.color, &mut input.color),
        ];
        for (change, field) in fields {
            if let Some(value) = change {
                *field = value;
            }
        }
    }
}

pub async fn run(cli: Cli, mut config: Config) -> CliResult {
    if cli.local {
        config.storage = StorageKind::Local;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await,
        Commands::Month { month } => print_month(&config.storage()?, month.as_deref()).await,
        Commands::Add(args) => add_event(&config.storage()?, args.into()).await,
        Commands::Edit { id, changes } => edit_event(&config.storage()?, id, changes).await,
        Commands::Show { id } => show_event(&config.storage()?, id).await,
        Commands::Delete { id, yes } => delete_event(&config.storage()?, id, yes).await,
        Commands::Import { file } => import_events(&config.storage()?, &file).await,
        Commands::Export => export_events(&config.storage()?).await,
    }
}

async fn serve(config: &Config) -> CliResult {
    let pool = crate::db::init_pool(&config.database_url).await?;
    let app = crate::build_app(pool, config.secure_cookies).await?;

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!("listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open(store: &Storage) -> Planner {
    let mut planner = Planner::new(crate::today());
    if let Some(notice) = planner.load(store).await {
        eprintln!("{}", notice.message);
    }
    planner
}

async fn print_month(store: &Storage, month: Option<&str>) -> CliResult {
    let mut planner = open(store).await;
    if let Some(raw) = month {
        let month: YearMonth = raw
            .parse()
            .map_err(|_| format!("Invalid month '{raw}', expected YYYY-MM"))?;
        planner.show_month(month).map_err(|notice| notice.message)?;
    }
    print!("{}", render_month(&planner.grid()));
    Ok(())
}

/// Plain-text month: a 6x7 day grid (`*` marks days with events, `.` days
/// outside the month) followed by the month's events.
pub fn render_month(grid: &MonthGrid) -> String {
    let mut out = format!("{}\n", grid.month.label());
    for label in WEEKDAY_LABELS {
        out.push_str(&format!(" {label} "));
    }
    out.push('\n');

    for week in grid.weeks() {
        for cell in week {
            if cell.in_month {
                let marker = if cell.events.is_empty() { ' ' } else { '*' };
                out.push_str(&format!("{:>3}{marker}", cell.day));
            } else {
                out.push_str("  . ");
            }
        }
        out.push('\n');
    }

    for cell in grid.cells.iter().filter(|c| c.in_month) {
        for event in &cell.events {
            out.push_str(&format!("{}  {}\n", cell.iso, summary(event)));
        }
    }
    out
}

fn summary(event: &Event) -> String {
    format!(
        "{}  {} @ {} ({})  [{}]",
        event.time_range(),
        event.name,
        event.location,
        event.instructor,
        event.id
    )
}

async fn add_event(store: &Storage, input: EventInput) -> CliResult {
    let mut planner = open(store).await;
    planner.open_create(None);
    let notice = planner.submit(store, input).await.map_err(|n| n.message)?;
    println!("{}", notice.message);
    Ok(())
}

async fn edit_event(store: &Storage, id: EventId, changes: EditArgs) -> CliResult {
    let mut planner = open(store).await;
    if planner.show_detail(id).is_none() {
        return Err(format!("No event with id {id}").into());
    }
    planner.open_edit();

    let mut input = planner.form().input().cloned().unwrap_or_default();
    changes.apply(&mut input);

    let notice = planner.submit(store, input).await.map_err(|n| n.message)?;
    println!("{}", notice.message);
    Ok(())
}

async fn show_event(store: &Storage, id: EventId) -> CliResult {
    let mut planner = open(store).await;
    let event = planner
        .show_detail(id)
        .ok_or_else(|| format!("No event with id {id}"))?;

    println!("{}", event.name);
    println!("  場所: {}", event.location);
    println!("  日付: {}", event.date_long());
    println!("  時間: {}", event.time_range());
    println!("  インストラクター: {}", event.instructor);
    println!("  色: {}", event.color);
    Ok(())
}

async fn delete_event(store: &Storage, id: EventId, yes: bool) -> CliResult {
    let mut planner = open(store).await;
    let name = planner
        .show_detail(id)
        .map(|e| e.name.clone())
        .ok_or_else(|| format!("No event with id {id}"))?;

    let confirmed = yes
        || inquire::Confirm::new(&format!("Delete \"{name}\"?"))
            .with_default(false)
            .prompt()?;

    match planner.delete_active(store, confirmed).await {
        Ok(Some(notice)) => println!("{}", notice.message),
        Ok(None) => println!("Nothing deleted."),
        Err(notice) => return Err(notice.message.into()),
    }
    Ok(())
}

async fn import_events(store: &Storage, file: &Path) -> CliResult {
    let content = fs::read_to_string(file)?;
    let events: Vec<Event> = serde_json::from_str(&content)?;

    let (imported, skipped) = import_into(store, &events).await?;
    println!("Imported {imported} events, skipped {skipped} already present");
    Ok(())
}

/// Create every event whose id the store does not hold yet, in file order.
/// Returns `(imported, skipped)`; a failed write names the entry and how far
/// the import got.
async fn import_into(store: &Storage, events: &[Event]) -> Result<(usize, usize), String> {
    let loaded = store.load().await;
    if loaded.offline {
        return Err("Cannot import while the current events are unavailable".to_string());
    }
    let mut known: HashSet<EventId> = loaded.events.iter().map(|e| e.id).collect();

    let (mut imported, mut skipped) = (0, 0);
    for (index, event) in events.iter().enumerate() {
        if !known.insert(event.id) {
            skipped += 1;
            continue;
        }
        store.create(event).await.map_err(|e| {
            format!(
                "Entry #{} (id {}) failed: {e}. {imported} events were imported before it",
                index + 1,
                event.id
            )
        })?;
        imported += 1;
    }
    Ok((imported, skipped))
}

async fn export_events(store: &Storage) -> CliResult {
    let planner = open(store).await;
    println!("{}", serde_json::to_string_pretty(planner.events())?);
    Ok(())
}

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate, SecondsFormat, Weekday};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CalendarConfig;
use crate::controller::CalendarController;
use crate::event::{parse_instant, Event, EventColor, EventDraft, EventPatch};
use crate::grid::{start_of_week, ViewMode};
use crate::navigation::NavCommand;
use crate::render;
use crate::session::StaticSession;
use crate::store::JsonFileStore;

/// Datebook - personal calendar for the terminal
#[derive(Parser)]
#[command(name = "datebook")]
#[command(about = "A personal calendar: month, week, and day views with event management")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Event data file (JSON); defaults to the config directory
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Owner identity for this session
    #[arg(long, global = true, default_value = "local")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the calendar grid
    Show {
        /// View mode (month, week, day)
        #[arg(long, default_value = "month")]
        view: String,

        /// Focus date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List every stored event
    List,

    /// Add an event
    Add {
        /// Event title
        title: String,

        /// Start instant (RFC 3339 or YYYY-MM-DDTHH:MM)
        #[arg(long)]
        start: String,

        /// End instant; defaults to one hour after the start
        #[arg(long)]
        end: Option<String>,

        /// Mark as an all-day event
        #[arg(long)]
        all_day: bool,

        /// Color name or hex value
        #[arg(long)]
        color: Option<String>,

        /// Location
        #[arg(long)]
        location: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Edit fields of a stored event
    Edit {
        /// Event id (see `datebook list`)
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an event by id
    Delete {
        /// Event id (see `datebook list`)
        id: String,
    },

    /// Show or change configuration
    Config {
        /// Show configuration and data file locations
        #[arg(long)]
        paths: bool,

        /// Set the first day of the week (e.g. "Sun", "Mon")
        #[arg(long)]
        week_start: Option<String>,

        /// Set how many events a day cell shows before "+N more"
        #[arg(long)]
        visible_limit: Option<usize>,
    },
}

/// Command-line interface handler
pub struct CliHandler {
    controller: CalendarController,
    store: Arc<JsonFileStore>,
    today: NaiveDate,
}

impl CliHandler {
    /// Create a handler backed by the JSON file store and load the event
    /// collection.
    pub async fn new(user: &str, data_file: Option<PathBuf>, today: NaiveDate) -> Result<Self> {
        let config = CalendarConfig::load()?;
        let path = match data_file {
            Some(path) => path,
            None => default_data_file().ok_or_else(|| anyhow!("cannot find a config directory"))?,
        };

        let store = Arc::new(JsonFileStore::open(&path).await?);
        let session = Arc::new(StaticSession::signed_in(user));
        let controller = CalendarController::new(store.clone(), session, config, today);
        controller.initialize().await?;

        Ok(CliHandler {
            controller,
            store,
            today,
        })
    }

    /// Handle a parsed command.
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Show { view, date } => self.handle_show(&view, date).await,
            Commands::List => self.handle_list().await,
            Commands::Add {
                title,
                start,
                end,
                all_day,
                color,
                location,
                description,
            } => {
                self.handle_add(title, start, end, all_day, color, location, description)
                    .await
            }
            Commands::Edit {
                id,
                title,
                start,
                end,
                color,
                location,
                description,
            } => {
                self.handle_edit(id, title, start, end, color, location, description)
                    .await
            }
            Commands::Delete { id } => self.handle_delete(&id).await,
            Commands::Config {
                paths,
                week_start,
                visible_limit,
            } => self.handle_config(paths, week_start, visible_limit),
        }
    }

    async fn handle_show(&self, view: &str, date: Option<NaiveDate>) -> Result<()> {
        let view = parse_view(view)?;
        self.controller
            .navigate(NavCommand::SwitchView(view), self.today)
            .await;

        if let Some(target) = date {
            let week_start = self.controller.config().week_start;
            let steps = steps_between(view, self.today, target, week_start);
            let command = if steps >= 0 {
                NavCommand::Next
            } else {
                NavCommand::Previous
            };
            for _ in 0..steps.unsigned_abs() {
                self.controller.navigate(command, self.today).await;
            }
        }

        let snapshot = self.controller.snapshot(self.today).await;
        print!("{}", render::render_snapshot(&snapshot));
        Ok(())
    }

    async fn handle_list(&self) -> Result<()> {
        let events = self.controller.events().await;
        if events.is_empty() {
            println!("No events.");
            return Ok(());
        }
        for event in events {
            println!("{}", summary_line(&event));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_add(
        &self,
        title: String,
        start: String,
        end: Option<String>,
        all_day: bool,
        color: Option<String>,
        location: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        let end = match end {
            Some(end) => end,
            None => (parse_instant(&start)? + Duration::hours(1))
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let color = color
            .map(|raw| parse_color(&raw))
            .unwrap_or_else(|| self.controller.config().default_color.clone());

        let draft = EventDraft {
            title,
            description,
            start_time: start,
            end_time: end,
            all_day,
            color,
            location,
        };
        let created = self.controller.create_event(&draft).await?;
        println!(
            "✅ Created '{}' ({})",
            created.title,
            created.id.unwrap_or_default()
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_edit(
        &self,
        id: String,
        title: Option<String>,
        start: Option<String>,
        end: Option<String>,
        color: Option<String>,
        location: Option<String>,
        description: Option<String>,
    ) -> Result<()> {
        let patch = EventPatch {
            title,
            description,
            start_time: start.as_deref().map(parse_instant).transpose()?,
            end_time: end.as_deref().map(parse_instant).transpose()?,
            all_day: None,
            color: color.map(|raw| parse_color(&raw)),
            location,
        };
        if patch.is_empty() {
            return Err(anyhow!("nothing to change; pass at least one field"));
        }

        self.controller.update_event(&id, &patch).await?;
        println!("✅ Updated {}", id);
        Ok(())
    }

    async fn handle_delete(&self, id: &str) -> Result<()> {
        self.controller.delete_event(id).await?;
        println!("✅ Deleted {}", id);
        Ok(())
    }

    fn handle_config(
        &self,
        paths: bool,
        week_start: Option<String>,
        visible_limit: Option<usize>,
    ) -> Result<()> {
        if paths {
            match CalendarConfig::config_file_path() {
                Some(path) => println!("config: {}", path.display()),
                None => println!("config: no config directory available"),
            }
            println!("events: {}", self.store.path().display());
            return Ok(());
        }

        let mut config = CalendarConfig::load()?;
        let mut changed = false;

        if let Some(raw) = week_start {
            config.week_start = raw
                .parse::<Weekday>()
                .map_err(|_| anyhow!("unknown weekday '{}'", raw))?;
            changed = true;
        }
        if let Some(limit) = visible_limit {
            config.visible_limit = limit;
            changed = true;
        }

        if changed {
            config.save()?;
            println!("✅ Configuration saved");
        }
        println!("week_start = {}", config.week_start);
        println!("visible_limit = {}", config.visible_limit);
        println!("default_color = {}", config.default_color.hex());
        Ok(())
    }
}

/// Parse a view mode argument, listing the valid modes on failure.
fn parse_view(raw: &str) -> Result<ViewMode> {
    raw.parse::<ViewMode>().map_err(|_| {
        let known: Vec<&str> = ViewMode::all().iter().map(ViewMode::name).collect();
        anyhow!(
            "unknown view mode '{}'; expected one of {}",
            raw,
            known.join(", ")
        )
    })
}

/// Navigation steps from `from` to `to` in units of the active view.
fn steps_between(view: ViewMode, from: NaiveDate, to: NaiveDate, week_start: Weekday) -> i64 {
    match view {
        ViewMode::Month => {
            let months_from = i64::from(from.year()) * 12 + i64::from(from.month());
            let months_to = i64::from(to.year()) * 12 + i64::from(to.month());
            months_to - months_from
        }
        ViewMode::Week => {
            (start_of_week(to, week_start) - start_of_week(from, week_start)).num_days() / 7
        }
        ViewMode::Day => (to - from).num_days(),
    }
}

fn parse_color(raw: &str) -> EventColor {
    for color in EventColor::palette() {
        if color.name().eq_ignore_ascii_case(raw) {
            return color.clone();
        }
    }
    EventColor::from_hex(raw)
}

fn summary_line(event: &Event) -> String {
    let id = event.id.as_deref().unwrap_or("-");
    let when = if event.all_day {
        format!("{} (all day)", event.start_time.format("%Y-%m-%d"))
    } else {
        event.start_time.format("%Y-%m-%d %H:%M").to_string()
    };
    let mut line = format!("{}  {}  {}", id, when, event.title);
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    line
}

fn default_data_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("datebook").join("events.json"))
}

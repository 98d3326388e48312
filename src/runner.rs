//! Application runner - entry point for the CLI subcommands.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, info, trace, warn};

use crate::cli::{Args, Command};
use crate::config::{self, CalendarConfig, PathConfig};
use crate::entities::{Board, ItemRef};
use crate::schedule::{DropPlanner, Interval};
use crate::server::ApiServer;
use crate::service::ScheduleUpdate;
use crate::store::JsonStore;
use crate::time::{CalendarDate, HourTime, date_range, month_block, resolve_timezone, shift_month};

/// One line of the agenda.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaEntry {
    pub item: ItemRef,
    pub name: String,
    pub time: HourTime,
    /// Seconds
    pub duration: i64,
}

/// Run the subcommand in `args`. Without one, prints today's agenda.
pub fn run_app(args: Args, path_config: &PathConfig) -> Result<()> {
    trace!("Command-line args: {:?}", args);

    let config_path = config::config_file(config::CONFIG_FILE, path_config);
    let calendar = CalendarConfig::load(&config_path)?;
    info!("Config path: {}", config_path.display());

    let data_dir = config::data_dir(path_config);
    info!("Data path: {}", data_dir.display());
    let store = JsonStore::new(&data_dir, calendar.work_session_min_duration_secs);

    let command = args.command.unwrap_or(Command::Agenda { date: None, days: 1 });
    match command {
        Command::Serve { port } => {
            let port = port.unwrap_or(calendar.server_port);
            ApiServer::new(port, Arc::new(store)).run();
            Ok(())
        }
        Command::Agenda { date, days } => {
            let board = store.load_board()?;
            let tz = resolve_timezone(&calendar.timezone);
            let start = date.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
            for day in date_range(start, days.max(1)) {
                let day = CalendarDate::in_zone(day, tz);
                println!("{} ({})", day.key(), day.weekday());
                let entries = agenda(&board, &day);
                if entries.is_empty() {
                    println!("  -");
                }
                for entry in entries {
                    println!(
                        "  {:>8}  {:>4}m  {:<18} {}",
                        entry.time.time12_with_suffix(),
                        entry.duration / 60,
                        entry.item.to_string(),
                        entry.name
                    );
                }
            }
            let backlog = board.backlog();
            if !backlog.is_empty() {
                println!("backlog");
                for task in backlog {
                    println!("  {:<18} {}", ItemRef::Task(task.id).to_string(), task.name);
                }
            }
            Ok(())
        }
        Command::Schedule { kind, id, date, time, minutes } => {
            let item = ItemRef::new(kind, id);
            let update = schedule_item(&store, &calendar, item, date, time, minutes.map(|m| m * 60))?;
            println!("{}", serde_json::to_string_pretty(&update)?);
            Ok(())
        }
        Command::Month { date, shift } => {
            let board = store.load_board()?;
            let tz = resolve_timezone(&calendar.timezone);
            let anchor = date.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
            let (year, month) = shift_month(anchor.year(), anchor.month(), shift);
            let grid = month_grid(&board, tz, year, month).with_context(|| format!("No month {year}-{month:02}"))?;
            println!("{year}-{month:02}");
            println!(" Mo  Tu  We  Th  Fr  Sa  Su");
            for week in grid.chunks(7) {
                let row: Vec<String> = week
                    .iter()
                    .map(|(day, count)| {
                        let mark = if *count > 0 { '*' } else { ' ' };
                        if day.month() == month {
                            format!("{:>3}{mark}", day.day())
                        } else {
                            "    ".to_string()
                        }
                    })
                    .collect();
                println!("{}", row.join(""));
            }
            Ok(())
        }
        Command::Backlog { kind, id } => {
            let item = ItemRef::new(kind, id);
            let update = store
                .update_schedule(item, None)
                .with_context(|| format!("Failed to move {item} to the backlog"))?;
            println!("{}", serde_json::to_string_pretty(&update)?);
            Ok(())
        }
    }
}

/// Schedule `item` at `time` on `date` after the same duration gate and
/// conflict check a drop on the grid gets.
pub fn schedule_item(
    store: &JsonStore,
    calendar: &CalendarConfig,
    item: ItemRef,
    date: NaiveDate,
    time: HourTime,
    duration: Option<i64>,
) -> Result<ScheduleUpdate> {
    let board = store.load_board()?;
    if !board.contains(item) {
        anyhow::bail!("{item} not found");
    }
    let day = CalendarDate::in_zone(date, resolve_timezone(&calendar.timezone));
    let duration = duration.unwrap_or_else(|| board.duration_of(item));
    let scheduled: Vec<(ItemRef, Interval)> = board.scheduled_between(day.start_seconds(), day.end_seconds());
    debug!("{} scheduled item(s) on {}", scheduled.len(), day.key());

    let plan = DropPlanner::new(calendar)
        .plan_at(item, duration, &day, time, &scheduled)
        .inspect_err(|rejection| warn!("Scheduling {item} rejected: {rejection}"))?;
    let update = store
        .update_schedule(item, Some(plan.schedule))
        .with_context(|| format!("Failed to save schedule of {item}"))?;
    info!("Scheduled {item} on {} at {}", day.key(), plan.time);
    Ok(update)
}

/// Mini-calendar cells for `month` of `year` with the agenda size of each day.
pub fn month_grid(board: &Board, tz: Tz, year: i32, month: u32) -> Option<Vec<(NaiveDate, usize)>> {
    let cells = month_block(year, month)?;
    Some(
        cells
            .into_iter()
            .map(|date| (date, agenda(board, &CalendarDate::in_zone(date, tz)).len()))
            .collect(),
    )
}

/// Items starting on `day`, in start order. Backlogged tasks are skipped.
pub fn agenda(board: &Board, day: &CalendarDate) -> Vec<AgendaEntry> {
    let mut entries: Vec<(i64, AgendaEntry)> = board
        .time_blocks()
        .filter_map(|block| {
            let item = block.owner()?;
            let starts_at = block.starts_at?;
            if !day.contains(starts_at.timestamp()) {
                return None;
            }
            let name = match item {
                ItemRef::Task(id) => {
                    let task = board.task(id)?;
                    if task.is_backlogged {
                        return None;
                    }
                    task.name.clone()
                }
                ItemRef::WorkSession(id) => board.work_session(id)?.name.clone(),
            };
            let entry = AgendaEntry {
                item,
                name,
                time: HourTime::from_datetime(&starts_at.with_timezone(&day.timezone())),
                duration: block.duration,
            };
            Some((starts_at.timestamp(), entry))
        })
        .collect();
    entries.sort_by_key(|(start, _)| *start);
    entries.into_iter().map(|(_, entry)| entry).collect()
}

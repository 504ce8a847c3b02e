// ============================================================================
// L2.10: TABLE MIRROR VIEWER SUBSYSTEM
// Timers fetch off the UI loop and hand immutable results back over a
// channel; only the UI loop touches the viewer state.
// ============================================================================
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connection_manager::{DestinationEndpoint, SourceEndpoint};
use crate::console::Console;
use crate::errors::{AppError, Engine};
use crate::insert_flow;
use crate::model::{TablePair, TableSnapshot};
use crate::table_fetch::{fetch_destination_table, fetch_source_table};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";
const TABLE_NOT_FOUND_TEXT: &str = "*** TABLE DOES NOT EXIST ***";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneState {
    Waiting,
    Rows(TableSnapshot),
    TableNotFound,
}

#[derive(Debug)]
pub struct Pane {
    pub title: String,
    pub state: PaneState,
    pub last_error: Option<String>,
}

impl Pane {
    fn new(engine: Engine, table: &str) -> Self {
        Pane {
            title: format!("{} - {}", engine, table),
            state: PaneState::Waiting,
            last_error: None,
        }
    }

    fn apply(&mut self, outcome: Result<TableSnapshot, AppError>) {
        match outcome {
            Ok(snapshot) => {
                self.state = PaneState::Rows(snapshot);
                self.last_error = None;
            }
            Err(e) if e.is_table_not_found() => {
                self.state = PaneState::TableNotFound;
                self.last_error = None;
            }
            Err(e) => {
                error!("❌ Refresh of {} failed: {}", self.title, e);
                self.last_error = Some(e.to_string());
            }
        }
    }
}

#[derive(Debug)]
pub struct Tab {
    pub pair: TablePair,
    pub source: Pane,
    pub destination: Pane,
}

/// Output of one background fetch.
#[derive(Debug)]
pub struct RefreshResult {
    pub tab: usize,
    pub side: Side,
    pub outcome: Result<TableSnapshot, AppError>,
}

#[derive(Debug)]
pub struct ViewerState {
    tabs: Vec<Tab>,
    selected: usize,
    max_rows: usize,
}

impl ViewerState {
    pub fn new(pairs: &[TablePair], max_rows: usize) -> Self {
        let tabs = pairs
            .iter()
            .map(|pair| Tab {
                source: Pane::new(Engine::SqlServer, &pair.source_table),
                destination: Pane::new(Engine::MySql, &pair.destination_table),
                pair: pair.clone(),
            })
            .collect();
        ViewerState {
            tabs,
            selected: 0,
            max_rows,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn tab(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.selected = (self.selected + 1) % self.tabs.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.tabs.is_empty() {
            self.selected = (self.selected + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    /// Applies a result to its own tab; returns whether the visible tab changed.
    pub fn apply(&mut self, result: RefreshResult) -> bool {
        let Some(tab) = self.tabs.get_mut(result.tab) else {
            return false;
        };
        match result.side {
            Side::Source => tab.source.apply(result.outcome),
            Side::Destination => tab.destination.apply(result.outcome),
        }
        result.tab == self.selected
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let bar = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, tab)| {
                if i == self.selected {
                    format!("*[{}] {}*", i + 1, tab.pair.label())
                } else {
                    format!(" [{}] {} ", i + 1, tab.pair.label())
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&bar);
        out.push('\n');

        if let Some(tab) = self.tab(self.selected) {
            for pane in [&tab.source, &tab.destination] {
                out.push('\n');
                out.push_str(&render_pane(pane, self.max_rows));
            }
        }
        out.push_str("\n[n]ext  [p]revious  [1-9] select  [i]nsert  [h]elp  [q]uit\n");
        out
    }
}

fn render_pane(pane: &Pane, max_rows: usize) -> String {
    let mut out = format!("=== {} ===\n", pane.title);
    match &pane.state {
        PaneState::Waiting => out.push_str("(waiting for first refresh)\n"),
        PaneState::TableNotFound => {
            out.push_str(TABLE_NOT_FOUND_TEXT);
            out.push('\n');
        }
        PaneState::Rows(snapshot) => out.push_str(&render_grid(snapshot, max_rows)),
    }
    if let Some(e) = &pane.last_error {
        out.push_str(&format!("! last refresh failed: {}\n", e));
    }
    out
}

pub fn render_grid(snapshot: &TableSnapshot, max_rows: usize) -> String {
    let shown = &snapshot.rows[..snapshot.rows.len().min(max_rows)];
    let mut widths: Vec<usize> = snapshot.columns.iter().map(|c| c.chars().count()).collect();
    for row in shown {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("| {} |\n", padded)
    };
    let separator = format!(
        "+{}+\n",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&line(&snapshot.columns));
    out.push_str(&separator);
    for row in shown {
        out.push_str(&line(row));
    }
    out.push_str(&separator);
    let hidden = snapshot.rows.len() - shown.len();
    if hidden > 0 {
        out.push_str(&format!("... {} more rows\n", hidden));
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
pub enum ViewerCommand {
    Next,
    Previous,
    Select(usize),
    Insert,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(input: &str) -> ViewerCommand {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "n" | "next" => ViewerCommand::Next,
        "p" | "prev" | "previous" => ViewerCommand::Previous,
        "i" | "insert" => ViewerCommand::Insert,
        "h" | "help" | "?" => ViewerCommand::Help,
        "q" | "quit" | "exit" => ViewerCommand::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => ViewerCommand::Select(n - 1),
            _ => ViewerCommand::Unknown(other.to_string()),
        },
    }
}

#[derive(Clone)]
pub struct Endpoints {
    pub source: SourceEndpoint,
    pub destination: DestinationEndpoint,
}

/// One independent timer per pair. A tick only fetches when its pair is
/// the selected tab; deselected tabs accumulate nothing.
pub fn spawn_refresh_timers(
    pairs: &[TablePair],
    endpoints: Arc<Endpoints>,
    period: Duration,
    selected: watch::Receiver<usize>,
    results: mpsc::UnboundedSender<RefreshResult>,
) -> Vec<JoinHandle<()>> {
    pairs
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, pair)| {
            let endpoints = Arc::clone(&endpoints);
            let selected = selected.clone();
            let results = results.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    if results.is_closed() {
                        break;
                    }
                    if *selected.borrow() != index {
                        continue;
                    }
                    spawn_refresh(index, &pair, &endpoints, &results);
                }
            })
        })
        .collect()
}

fn spawn_refresh(
    index: usize,
    pair: &TablePair,
    endpoints: &Arc<Endpoints>,
    results: &mpsc::UnboundedSender<RefreshResult>,
) {
    let (source, table, tx) = (Arc::clone(endpoints), pair.source_table.clone(), results.clone());
    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = fetch_source_table(&source.source, &table).await;
        debug!("Source refresh of {} took {:.2}s", table, started.elapsed().as_secs_f64());
        let _ = tx.send(RefreshResult {
            tab: index,
            side: Side::Source,
            outcome,
        });
    });

    let (dest, table, tx) = (
        Arc::clone(endpoints),
        pair.destination_table.clone(),
        results.clone(),
    );
    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = fetch_destination_table(&dest.destination, &table).await;
        debug!(
            "Destination refresh of {} took {:.2}s",
            table,
            started.elapsed().as_secs_f64()
        );
        let _ = tx.send(RefreshResult {
            tab: index,
            side: Side::Destination,
            outcome,
        });
    });
}

/// The UI loop: applies refresh results and handles typed commands until
/// the user quits or input ends.
pub async fn run<R: AsyncBufRead + Unpin>(
    console: &mut Console<R>,
    pairs: Vec<TablePair>,
    endpoints: Endpoints,
    period: Duration,
    max_rows: usize,
) -> Result<(), AppError> {
    let endpoints = Arc::new(endpoints);
    let mut state = ViewerState::new(&pairs, max_rows);
    let (selected_tx, selected_rx) = watch::channel(state.selected());
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let timers = spawn_refresh_timers(
        &pairs,
        Arc::clone(&endpoints),
        period,
        selected_rx,
        results_tx,
    );
    info!("👀 Watching {} table pair(s), refresh every {:?}", pairs.len(), period);

    print!("{}{}", CLEAR_SCREEN, state.render());
    loop {
        tokio::select! {
            Some(result) = results_rx.recv() => {
                if state.apply(result) {
                    print!("{}{}", CLEAR_SCREEN, state.render());
                }
            }
            line = console.read_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    ViewerCommand::Quit => break,
                    ViewerCommand::Next => state.next(),
                    ViewerCommand::Previous => state.previous(),
                    ViewerCommand::Select(i) => {
                        if !state.select(i) {
                            println!("No tab {}", i + 1);
                            continue;
                        }
                    }
                    ViewerCommand::Insert => {
                        if let Err(e) = insert_flow::run(console, &endpoints.source).await {
                            error!("❌ Manual insert failed: {}", e);
                            console.notify("Error", &e.to_string()).await?;
                        }
                    }
                    ViewerCommand::Help => {
                        println!("n/next, p/previous, <number> select tab, i/insert, q/quit");
                        continue;
                    }
                    ViewerCommand::Unknown(other) => {
                        if !other.is_empty() {
                            println!("Unknown command: {}", other);
                        }
                        continue;
                    }
                }
                let _ = selected_tx.send(state.selected());
                print!("{}{}", CLEAR_SCREEN, state.render());
            }
        }
    }

    for timer in timers {
        timer.abort();
    }
    info!("👋 Viewer closed");
    Ok(())
}

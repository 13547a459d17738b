use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{Event as CEvent, EventStream, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use directories::ProjectDirs;
use futures::StreamExt;
use lazy_static::lazy_static;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use serde::{Deserialize, Serialize};
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use updraft_client::clock::SAMPLE_INTERVAL;
use updraft_client::{
    AnimationClock, ApiClient, AutobetController, AutobetPhase, BetActionGateway,
    GatewayConnection, RoundEvent, RoundStateHandle, RoundStateTracker,
};
use updraft_types::{
    AutobetConfig, LiveBet, PlayerIdentity, RoundPhase, SettledBet, StakeStrategy,
};

/// CLI flags (user-provided override persisted config)
#[derive(Parser, Debug)]
#[command(name = "updraft-terminal", about = "Updraft crash-game ratatui client")]
struct Args {
    /// Gateway WS URL (ws://localhost:4000/ws)
    #[arg(long)]
    gateway: Option<String>,

    /// REST API base URL (http://localhost:4000)
    #[arg(long)]
    api: Option<String>,

    /// Player name used for login
    #[arg(long)]
    username: Option<String>,

    /// Multiplier at which the terminal explosion sequence fires early
    #[arg(long)]
    explode_at: Option<f64>,

    /// Log every decoded notification in the log pane
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone)]
struct CommandDef {
    name: &'static str,
    usage: &'static str,
    desc: &'static str,
    group: &'static str,
}

const fn cmd(
    name: &'static str,
    usage: &'static str,
    desc: &'static str,
    group: &'static str,
) -> CommandDef {
    CommandDef {
        name,
        usage,
        desc,
        group,
    }
}

lazy_static! {
    static ref COMMANDS: Vec<CommandDef> = vec![
        // Session
        cmd("help", "/help", "Show grouped palette", "Session"),
        cmd("status", "/status", "Show round + autobet state", "Session"),
        cmd("history", "/history", "Toggle settled-bet history pane", "Session"),
        cmd("quit", "/quit", "Exit", "Session"),
        // Betting
        cmd("bet", "/bet <amt> [cashout]", "Place a bet for the next round", "Betting"),
        cmd("cashout", "/cashout", "Cash out the active bet", "Betting"),
        // Autobet
        cmd(
            "auto",
            "/auto start <base> <ceiling> <cashout> [win] [lose]|stop",
            "Run the bet strategy (win/lose: base|double)",
            "Autobet",
        ),
    ];
    static ref COMPLETIONS: HashSet<String> =
        COMMANDS.iter().map(|c| format!("/{}", c.name)).collect();
    static ref HINTS: HashMap<String, String> = COMMANDS
        .iter()
        .map(|c| (format!("/{}", c.name), format!("{} — {}", c.usage, c.desc)))
        .collect();
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedConfig {
    gateway: Option<String>,
    api: Option<String>,
    username: Option<String>,
    verbose: Option<bool>,
}

struct AppState {
    input: String,
    logs: Vec<String>,
    status: String,
    hint: String,
    live_bets: Vec<LiveBet>,
    history: Option<Vec<SettledBet>>,
    last_multiplier: f64,
    verbose: bool,
}

enum UiEvent {
    Log(String),
    History(Vec<SettledBet>),
}

#[derive(Debug)]
enum CommandAction {
    Bet { amount: f64, cashout: Option<f64> },
    CashOut,
    AutoStart(AutobetConfig),
    AutoStop,
    HistoryToggle,
    Status,
    Local(String),
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = load_config().unwrap_or_default();

    let gateway_url = args
        .gateway
        .clone()
        .or_else(|| cfg.gateway.clone())
        .unwrap_or_else(|| "ws://localhost:4000/ws".to_string());
    let api_url = args
        .api
        .clone()
        .or_else(|| cfg.api.clone())
        .unwrap_or_else(|| "http://localhost:4000".to_string());
    let username = args
        .username
        .clone()
        .or_else(|| cfg.username.clone())
        .unwrap_or_else(|| "Player1".to_string());
    let verbose = args.verbose || cfg.verbose.unwrap_or(false);

    cfg.gateway = Some(gateway_url.clone());
    cfg.api = Some(api_url.clone());
    cfg.username = Some(username.clone());
    cfg.verbose = Some(verbose);
    save_config(&cfg)?;

    let api = Arc::new(ApiClient::new(&api_url).context("invalid api url")?);
    let (identity, login_note) = match api.login(&username).await {
        Ok(session) => {
            let note = format!("Logged in as {} (#{})", username, session.identity.user_id);
            (session.identity, note)
        }
        Err(err) => (
            PlayerIdentity {
                user_id: 1,
                username: username.clone(),
            },
            format!("Login failed ({err}); playing unregistered"),
        ),
    };

    // Composition root: one connection, its ends handed to each component.
    let connection = GatewayConnection::connect(&gateway_url)
        .await
        .with_context(|| format!("connect to {gateway_url}"))?;
    let mut notifications = connection.subscribe();
    let tracker = RoundStateTracker::new();
    let handle = tracker.handle();
    let gateway = BetActionGateway::new(identity.clone(), connection.intent_sender(), handle.clone());
    let mut autobet = AutobetController::new(gateway.clone());
    let mut clock = AnimationClock::new(args.explode_at.unwrap_or(f64::INFINITY));

    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    // TUI setup
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = AppState {
        input: String::new(),
        logs: vec![login_note],
        status: format!("Gateway: {gateway_url} | Player: {}", identity.username),
        hint: String::from("Type /help or Tab for completions"),
        live_bets: Vec::new(),
        history: None,
        last_multiplier: 1.0,
        verbose,
    };

    let mut events = EventStream::new();
    let mut stream_open = true;

    loop {
        terminal.draw(|f| draw_ui(f, &app, &handle, &clock, &autobet, Instant::now()))?;

        select! {
            maybe_ev = events.next() => {
                if let Some(Ok(ev)) = maybe_ev {
                    match ev {
                        CEvent::Resize(_, _) => clock.restart(Instant::now()),
                        other => {
                            if handle_key_event(
                                other,
                                &mut app,
                                &gateway,
                                &mut autobet,
                                &handle,
                                &api,
                                &identity,
                                &ui_tx,
                            )? {
                                break;
                            }
                        }
                    }
                }
            }
            result = notifications.recv(), if stream_open => {
                match result {
                    Ok(notification) => {
                        if app.verbose {
                            push_log(&mut app, format!("← {notification:?}"));
                        }
                        if let Some(event) = tracker.apply(&notification) {
                            route_event(&event, &mut app, &mut clock, &gateway, &mut autobet);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        push_log(&mut app, format!("… dropped {skipped} notifications"));
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        stream_open = false;
                        let event = tracker.close();
                        autobet.handle_event(&event);
                        clock.stop(Instant::now());
                        push_log(&mut app, "Connection closed; autobet disarmed".to_string());
                    }
                }
            }
            Some(ui_msg) = ui_rx.recv() => {
                match ui_msg {
                    UiEvent::Log(line) => push_log(&mut app, line),
                    UiEvent::History(bets) => {
                        push_log(&mut app, format!("History: {} settled bets", bets.len()));
                        app.history = Some(bets);
                    }
                }
            }
            _ = tokio::time::sleep(SAMPLE_INTERVAL) => {}
        }
    }

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Route one tracker event to the clock, the gateway, the autobet
/// controller, and the log.
fn route_event(
    event: &RoundEvent,
    app: &mut AppState,
    clock: &mut AnimationClock,
    gateway: &BetActionGateway,
    autobet: &mut AutobetController,
) {
    let now = Instant::now();
    match event {
        RoundEvent::RoundStarted => {
            app.last_multiplier = 1.0;
            clock.start(now);
        }
        RoundEvent::MultiplierChanged { multiplier } => {
            app.last_multiplier = *multiplier;
            if clock.observe_multiplier(*multiplier, now) {
                push_log(app, format!("Exploded at {multiplier:.2}x"));
            }
            gateway.observe_multiplier(*multiplier);
        }
        RoundEvent::RoundEnded => {
            clock.detonate(now);
            clock.stop(now);
            gateway.reset_round();
            push_log(app, format!("Crashed @ {:.2}x", app.last_multiplier));
        }
        RoundEvent::CountdownStarted { seconds_remaining } => {
            gateway.reset_round();
            push_log(app, format!("Next round in {seconds_remaining}s"));
        }
        RoundEvent::BetSettled { win, amount } => {
            let line = if *win {
                format!("Bet settled: won {amount:.2}")
            } else {
                format!("Bet settled: lost {amount:.2}")
            };
            push_log(app, line);
        }
        RoundEvent::LiveBetsChanged { users } => {
            app.live_bets = users.clone();
        }
        RoundEvent::Warning { message } => {
            push_log(app, format!("⚠️ server: {message}"));
        }
        _ => {}
    }
    autobet.handle_event(event);
}

#[allow(clippy::too_many_arguments)]
fn handle_key_event(
    ev: CEvent,
    app: &mut AppState,
    gateway: &BetActionGateway,
    autobet: &mut AutobetController,
    handle: &RoundStateHandle,
    api: &Arc<ApiClient>,
    identity: &PlayerIdentity,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) -> Result<bool> {
    if let CEvent::Key(KeyEvent {
        code, modifiers, ..
    }) = ev
    {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Ok(true),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => return Ok(true),
            (KeyCode::Tab, _) => {
                autocomplete(app);
                update_hint(app);
            }
            (KeyCode::Enter, _) => {
                let line = app.input.trim().to_string();
                app.input.clear();
                if line.is_empty() {
                    return Ok(false);
                }
                match handle_line(&line) {
                    Ok(CommandAction::Bet { amount, cashout }) => {
                        if gateway.can_place_bet() {
                            gateway.place_bet(amount, cashout);
                            push_log(app, format!("→ bet {amount:.2}"));
                        } else {
                            push_log(app, "Bets are closed right now".to_string());
                        }
                    }
                    Ok(CommandAction::CashOut) => {
                        if gateway.can_cash_out() {
                            gateway.cash_out();
                            push_log(app, "→ cash out".to_string());
                        } else {
                            push_log(app, "Nothing to cash out".to_string());
                        }
                    }
                    Ok(CommandAction::AutoStart(config)) => match autobet.start(config) {
                        Ok(()) => push_log(app, "Autobet armed".to_string()),
                        Err(err) => push_log(app, format!("⚠️ {err}")),
                    },
                    Ok(CommandAction::AutoStop) => {
                        autobet.stop();
                        push_log(app, "Autobet stopped".to_string());
                    }
                    Ok(CommandAction::HistoryToggle) => {
                        if app.history.take().is_none() {
                            let api = api.clone();
                            let ui_tx = ui_tx.clone();
                            let user_id = identity.user_id;
                            tokio::spawn(async move {
                                match api.bet_history(user_id).await {
                                    Ok(bets) => {
                                        let _ = ui_tx.send(UiEvent::History(bets));
                                    }
                                    Err(err) => {
                                        let _ = ui_tx
                                            .send(UiEvent::Log(format!("⚠️ history: {err}")));
                                    }
                                }
                            });
                        }
                    }
                    Ok(CommandAction::Status) => {
                        let state = handle.snapshot();
                        push_log(
                            app,
                            format!(
                                "Phase {} | bets {} | cashout {} | autobet {:?}",
                                state.phase.as_str(),
                                if state.bet_acceptance_open { "open" } else { "closed" },
                                if state.cashout_allowed { "allowed" } else { "off" },
                                autobet.phase(),
                            ),
                        );
                    }
                    Ok(CommandAction::Local(msg)) => push_log(app, msg),
                    Ok(CommandAction::Quit) => return Ok(true),
                    Err(e) => push_log(app, format!("⚠️ {e}")),
                }
                update_hint(app);
            }
            (KeyCode::Char(c), _) => {
                app.input.push(c);
                update_hint(app);
            }
            (KeyCode::Backspace, _) => {
                app.input.pop();
                update_hint(app);
            }
            (KeyCode::Esc, _) => {
                app.input.clear();
                update_hint(app);
            }
            _ => {}
        }
    }
    Ok(false)
}

fn autocomplete(app: &mut AppState) {
    let trimmed = app.input.trim_start();
    let (head, tail) = if let Some(space) = trimmed.find(' ') {
        (&trimmed[..space], Some(&trimmed[space + 1..]))
    } else {
        (trimmed, None)
    };
    let mut matches: Vec<&String> = COMPLETIONS.iter().filter(|c| c.starts_with(head)).collect();
    matches.sort();
    if let Some(first) = matches.first() {
        if let Some(rest) = tail {
            app.input = format!("{first} {rest}");
        } else {
            app.input = first.to_string();
        }
    }
}

fn update_hint(app: &mut AppState) {
    let trimmed = app.input.trim().to_string();
    if trimmed.is_empty() {
        app.hint = "Type /help or Tab for completions".into();
        return;
    }
    let first = trimmed.split_whitespace().next().unwrap_or("");
    app.hint = HINTS.get(&first.to_lowercase()).cloned().unwrap_or_default();
}

fn handle_line(line: &str) -> Result<CommandAction> {
    if !line.starts_with('/') {
        return Err(anyhow!("Commands start with '/'"));
    }
    let mut parts = line[1..]
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if parts.is_empty() {
        return Ok(CommandAction::Local(String::new()));
    }
    let cmd = parts.remove(0).to_lowercase();
    match cmd.as_str() {
        "quit" | "exit" => Ok(CommandAction::Quit),
        "help" => Ok(CommandAction::Local(render_help())),
        "status" => Ok(CommandAction::Status),
        "history" => Ok(CommandAction::HistoryToggle),
        "bet" => {
            let amount: f64 = parts
                .first()
                .ok_or_else(|| anyhow!("Usage: /bet <amt> [cashout]"))?
                .parse()
                .context("amount")?;
            let cashout = parts.get(1).map(|raw| raw.parse::<f64>()).transpose()?;
            Ok(CommandAction::Bet { amount, cashout })
        }
        "cashout" => Ok(CommandAction::CashOut),
        "auto" => handle_auto(parts),
        _ => Err(anyhow!("Unknown command /{cmd}")),
    }
}

fn handle_auto(args: Vec<String>) -> Result<CommandAction> {
    match args.first().map(String::as_str) {
        Some("stop") => Ok(CommandAction::AutoStop),
        Some("start") => {
            if args.len() < 4 {
                return Err(anyhow!(
                    "Usage: /auto start <base> <ceiling> <cashout> [win] [lose]"
                ));
            }
            let base_stake: f64 = args[1].parse().context("base stake")?;
            let stake_ceiling: u32 = args[2].parse().context("ceiling")?;
            let auto_cashout: f64 = args[3].parse().context("cashout")?;
            let on_win = parse_strategy(args.get(4))?;
            let on_lose = parse_strategy(args.get(5))?;
            Ok(CommandAction::AutoStart(AutobetConfig {
                base_stake,
                stake_ceiling,
                auto_cashout,
                on_win,
                on_lose,
            }))
        }
        _ => Err(anyhow!("Usage: /auto start ... | /auto stop")),
    }
}

fn parse_strategy(raw: Option<&String>) -> Result<StakeStrategy> {
    match raw.map(String::as_str) {
        None | Some("base") => Ok(StakeStrategy::ResetToBase),
        Some("double") => Ok(StakeStrategy::DoubleLastStake),
        Some(other) => Err(anyhow!("strategy must be base|double, got {other}")),
    }
}

fn render_help() -> String {
    let mut by_group: BTreeMap<&str, Vec<&CommandDef>> = BTreeMap::new();
    for c in COMMANDS.iter() {
        by_group.entry(c.group).or_default().push(c);
    }
    let mut out = String::new();
    for (group, cmds) in by_group {
        out.push_str(&format!("\n[{group}]\n"));
        for c in cmds {
            out.push_str(&format!("  {:<48} {}\n", c.usage, c.desc));
        }
    }
    out
}

fn push_log(app: &mut AppState, line: String) {
    let ts = Local::now().format("%H:%M:%S");
    app.logs.push(format!("{ts} {line}"));
    if app.logs.len() > 300 {
        let excess = app.logs.len() - 300;
        app.logs.drain(0..excess);
    }
}

fn draw_ui(
    f: &mut ratatui::Frame,
    app: &AppState,
    handle: &RoundStateHandle,
    clock: &AnimationClock,
    autobet: &AutobetController,
    now: Instant,
) {
    let state = handle.snapshot();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    // Status line
    let autobet_label = match (autobet.phase(), autobet.run_state()) {
        (AutobetPhase::Armed, Some(run)) => {
            format!("autobet {} bets @ {:.2}", run.bets_placed, run.current_stake)
        }
        _ => "autobet off".to_string(),
    };
    let status = Paragraph::new(format!(
        "{} | {} | bets {} | cashout {} | {}",
        app.status,
        state.phase.as_str(),
        if state.bet_acceptance_open { "OPEN" } else { "closed" },
        if state.cashout_allowed { "ALLOWED" } else { "off" },
        autobet_label,
    ))
    .style(Style::default().fg(Color::Gray));
    f.render_widget(status, chunks[0]);

    // Main area: trajectory + side panes
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    draw_trajectory(f, main_chunks[0], &state, clock, app, now);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    match &app.history {
        Some(bets) => draw_history(f, side_chunks[0], bets),
        None => draw_live_bets(f, side_chunks[0], &app.live_bets),
    }

    // Log pane
    let log_lines: Vec<Line> = app
        .logs
        .iter()
        .rev()
        .take((side_chunks[1].height.saturating_sub(2)) as usize)
        .rev()
        .map(|l| Line::raw(l.clone()))
        .collect();
    let log = Paragraph::new(log_lines)
        .block(Block::default().borders(Borders::ALL).title("Log"))
        .wrap(Wrap { trim: true });
    f.render_widget(log, side_chunks[1]);

    // Input + hint
    let input_block = Block::default().borders(Borders::ALL).title("Input");
    f.render_widget(Clear, chunks[2]);
    f.render_widget(input_block, chunks[2]);
    let prompt = format!("updraft $ {}", app.input);
    f.render_widget(Paragraph::new(prompt), chunks[2]);
    if !app.hint.is_empty() {
        let hint = Paragraph::new(app.hint.as_str()).style(Style::default().fg(Color::Gray));
        f.render_widget(hint, chunks[2]);
    }
}

/// The rising arc: the quadratic path the plane follows, the marker at the
/// clock's interpolated progress, and the big countdown/multiplier readout.
fn draw_trajectory(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &updraft_types::RoundState,
    clock: &AnimationClock,
    app: &AppState,
    now: Instant,
) {
    let block = Block::default().borders(Borders::ALL).title("Round");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width < 4 || inner.height < 3 {
        return;
    }

    let width = inner.width as usize;
    let height = inner.height as usize;
    let mut grid = vec![vec![' '; width]; height];

    // Path: y = t^2, drawn bottom-left to top-right.
    for x in 0..width {
        let t = x as f64 / (width.saturating_sub(1)) as f64;
        let row = ((1.0 - t * t) * (height - 1) as f64).round() as usize;
        grid[row.min(height - 1)][x] = '·';
    }

    let progress = clock.progress(now);
    let marker_col = (progress * (width.saturating_sub(1)) as f64).round() as usize;
    let marker_row =
        ((1.0 - progress * progress) * (height - 1) as f64).round() as usize;
    if clock.plane_visible() {
        grid[marker_row.min(height - 1)][marker_col.min(width - 1)] = '✈';
    } else if clock.explosion_visible(now) {
        grid[marker_row.min(height - 1)][marker_col.min(width - 1)] = '✸';
    }

    let lines: Vec<Line> = grid
        .into_iter()
        .map(|row| Line::raw(row.into_iter().collect::<String>()))
        .collect();
    let path = Paragraph::new(lines).style(Style::default().fg(Color::Yellow));
    f.render_widget(path, inner);

    // Big readout in the lower-right corner, countdown first.
    let readout = match state.phase {
        RoundPhase::Countdown { seconds_remaining } => format!("{seconds_remaining}"),
        RoundPhase::Running { multiplier } => format!("{multiplier:.2}x"),
        RoundPhase::Ended => {
            if app.last_multiplier > 1.0 {
                format!("crashed @ {:.2}x", app.last_multiplier)
            } else {
                String::new()
            }
        }
    };
    if !readout.is_empty() && inner.height >= 2 {
        let text_width = readout.chars().count() as u16;
        let rect = Rect {
            x: inner.x + inner.width.saturating_sub(text_width + 1),
            y: inner.y + inner.height - 1,
            width: text_width.min(inner.width),
            height: 1,
        };
        let readout = Paragraph::new(readout).style(Style::default().fg(Color::White));
        f.render_widget(readout, rect);
    }
}

fn draw_live_bets(f: &mut ratatui::Frame, area: Rect, bets: &[LiveBet]) {
    let items: Vec<ListItem> = bets
        .iter()
        .map(|bet| {
            let cashout = bet
                .cashout_at
                .map(|m| format!("{m:.2}x"))
                .unwrap_or_else(|| "pending".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", bet.username),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!("{:>8.2}  ", bet.amount)),
                Span::styled(cashout, Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Betting Users (Current Round)"),
    );
    f.render_widget(list, area);
}

fn draw_history(f: &mut ratatui::Frame, area: Rect, bets: &[SettledBet]) {
    let items: Vec<ListItem> = bets
        .iter()
        .rev()
        .map(|bet| {
            let (summary, color) = match bet.win_amount {
                w if w > 0.0 => (format!("won {w:.2}"), Color::Green),
                _ => (format!("lost {:.2}", bet.amount), Color::Red),
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!(
                    "{} {} ",
                    bet.created_at.format("%m-%d %H:%M"),
                    bet.round_id
                )),
                Span::styled(summary, Style::default().fg(color)),
                Span::styled(
                    format!("  crash {:.2}x", bet.crash_point),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Bet History (/history to close)"),
    );
    f.render_widget(list, area);
}

fn load_config() -> Option<PersistedConfig> {
    let path = config_path()?;
    let data = std::fs::read(path).ok()?;
    serde_json::from_slice(&data).ok()
}

fn save_config(cfg: &PersistedConfig) -> Result<()> {
    if let Some(path) = config_path() {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        std::fs::write(path, data)?;
    }
    Ok(())
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "updraft", "terminal-cli").map(|d| d.config_dir().join("config.json"))
}

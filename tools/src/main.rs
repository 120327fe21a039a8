//! barber-runner: headless runner for Undercover Barber.
//!
//! Usage:
//!   barber-runner --seed 12345 --data-dir ./data
//!   barber-runner --seed 12345 --ipc-mode
//!
//! Default mode plays one full mission with a scripted detective and
//! prints the result screen. `--ipc-mode` reads JSON commands from stdin,
//! one per line, and answers each with the produced events plus a snapshot.

use anyhow::{Context, Result};
use barber_core::{
    chase::{ChaseEngine, ChaseInput, ChaseKind, ChaseRules},
    chatbot::{ChatBackend, HttpChatBackend, OfflineBackend},
    config::GameConfig,
    content::ContentCatalog,
    deduction::DeductionPhase,
    dialogue::DialogueCategory,
    event::{GameEvent, GameObserver, LogObserver, Speaker},
    game::{Game, GameSnapshot, GameState},
    haircut::HaircutTool,
    types::{Lane, LineupIndex, Seconds},
};
use std::env;
use std::io::{self, BufRead, Write};

/// Frame step used by autoplay and by `tick` commands without a `dt`.
const FRAME_SECS: Seconds = 1.0 / 30.0;

/// Direct questions the bot asks before giving up on a customer.
const BOT_QUESTIONS: u32 = 3;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Brief,
    Begin,
    Interrogate {
        category: DialogueCategory,
    },
    Accuse,
    NextCustomer,
    SetTool {
        tool: HaircutTool,
    },
    Cut {
        x: f64,
        y: f64,
    },
    Chase {
        input: ChaseInput,
    },
    Tick {
        #[serde(default)]
        dt:    Option<Seconds>,
        #[serde(default = "one")]
        count: u32,
    },
    Restart,
    Quit,
}

fn one() -> u32 {
    1
}

#[derive(serde::Serialize)]
struct IpcReply<'a> {
    events: &'a [GameEvent],
    state:  GameSnapshot,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let max_time = parse_arg(&args, "--max-time", 600.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let offline = args.iter().any(|a| a == "--offline");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    if !ipc_mode {
        println!("Undercover Barber: A Cop's Cut - barber-runner");
        println!("  run:       {run_id}");
        println!("  seed:      {seed}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = GameConfig::load(data_dir)
        .with_context(|| format!("loading tuning from {data_dir}"))?;
    let catalog = ContentCatalog::load(data_dir)
        .with_context(|| format!("loading content from {data_dir}"))?;
    let backend = build_backend(&config, offline);

    let mut game = Game::new(config, catalog, seed, backend);
    game.subscribe(Box::new(LogObserver));

    if ipc_mode {
        run_ipc_loop(&mut game)?;
    } else {
        game.subscribe(Box::new(ConsoleObserver::default()));
        autoplay(&mut game, max_time)?;
        print_summary(&game, &run_id);
    }

    Ok(())
}

fn build_backend(config: &GameConfig, offline: bool) -> Box<dyn ChatBackend> {
    if offline || !config.session.use_chatbot {
        return Box::new(OfflineBackend);
    }
    match HttpChatBackend::new(&config.chatbot) {
        Ok(backend) => {
            log::info!("Chatbot backend: {} via {}", config.chatbot.provider, config.chatbot.endpoint);
            Box::new(backend)
        }
        Err(e) => {
            log::warn!("Chatbot unavailable ({e}); customers will use local lines");
            Box::new(OfflineBackend)
        }
    }
}

// ── IPC ────────────────────────────────────────────────────────────

fn run_ipc_loop(game: &mut Game) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        match handle_command(game, cmd) {
            Ok(events) => {
                let reply = IpcReply {
                    events: &events,
                    state:  game.snapshot(),
                };
                writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
            }
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(game: &mut Game, cmd: IpcCommand) -> Result<Vec<GameEvent>> {
    let events = match cmd {
        IpcCommand::GetState | IpcCommand::Quit => Vec::new(),
        IpcCommand::Brief                       => game.brief()?,
        IpcCommand::Begin                       => game.begin_mission(),
        IpcCommand::Interrogate { category }    => game.interrogate(category),
        IpcCommand::Accuse                      => game.accuse(),
        IpcCommand::NextCustomer                => game.next_customer(),
        IpcCommand::SetTool { tool }            => game.set_tool(tool),
        IpcCommand::Cut { x, y }                => game.cut_hair(x, y),
        IpcCommand::Chase { input } => {
            game.chase_input(input);
            Vec::new()
        }
        IpcCommand::Tick { dt, count } => {
            let dt = dt.unwrap_or(FRAME_SECS);
            let mut events = Vec::new();
            for _ in 0..count {
                events.extend(game.update(dt));
            }
            events
        }
        IpcCommand::Restart => game.restart(),
    };
    Ok(events)
}

// ── Autoplay ───────────────────────────────────────────────────────

/// Scripted detective: grills each customer, arrests on a tell,
/// finishes the haircut otherwise, then drives both chases.
#[derive(Default)]
struct Detective {
    /// Customer whose answers gave them away.
    tell:      Option<LineupIndex>,
    /// Customer the bot already picked a tool for.
    tooled_up: Option<LineupIndex>,
}

impl Detective {
    fn barbershop_turn(&mut self, game: &mut Game) {
        let Some(session) = game.session() else {
            return;
        };
        let DeductionPhase::Interrogating { index } = session.phase() else {
            return;
        };
        let Some(customer) = session.current_customer() else {
            return;
        };
        let asked = customer.dialogue_count;
        let can_ask = session.can_continue_dialogue();

        if self.tell == Some(index) {
            game.accuse();
            return;
        }
        if asked < BOT_QUESTIONS && can_ask {
            let remark = game.catalog().script.suspicious_remark.clone();
            let events = game.interrogate(DialogueCategory::Direct);
            if events.iter().any(|e| is_tell(e, &remark)) {
                self.tell = Some(index);
            }
            return;
        }

        if self.tooled_up != Some(index) {
            self.tooled_up = Some(index);
            game.set_tool(HaircutTool::Clippers);
            return;
        }
        let target = game
            .haircut()
            .filter(|h| !h.is_complete())
            .and_then(|h| h.strands().iter().find(|s| !s.cut).map(|s| (s.x, s.y)));
        match target {
            Some((x, y)) => {
                game.cut_hair(x, y);
            }
            None => {
                game.next_customer();
            }
        }
    }
}

fn is_tell(event: &GameEvent, remark: &str) -> bool {
    match event {
        GameEvent::PlayerHunch { .. } => true,
        GameEvent::DialogueAdded { speaker: Speaker::Customer, text } => text == remark,
        _ => false,
    }
}

/// Inputs for one frame: dodge what is coming, boost when it is safe.
fn chase_inputs<R: ChaseRules>(engine: &ChaseEngine<R>) -> Vec<ChaseInput> {
    let state = engine.state();
    let params = engine.params();
    let mut inputs = Vec::new();

    let incoming = |lane: Lane, window: f64| {
        state.hazards.iter().any(|h| {
            h.lane == lane
                && !h.triggered
                && h.position >= params.collision_front
                && h.position - params.collision_front < window
        })
    };

    match engine.kind() {
        ChaseKind::OnFoot => {
            let lead = params.hazard_speed * params.jump_duration * 0.5;
            if !state.is_airborne() && incoming(state.lane, lead) {
                inputs.push(ChaseInput::Jump);
            }
        }
        ChaseKind::Vehicular => {
            let window = params.hazard_speed * 1.5;
            if incoming(state.lane, window) {
                let mut lanes: Vec<Lane> = (0..params.lane_count).collect();
                lanes.sort_by_key(|l| l.abs_diff(state.lane));
                if let Some(lane) = lanes.into_iter().find(|l| !incoming(*l, window)) {
                    inputs.push(ChaseInput::SetLane { lane });
                }
            }
        }
    }

    let ready = state.elapsed >= state.boost_ready_at;
    if ready && state.gauge - params.boost_cost > params.hazard_gauge_penalty {
        inputs.push(ChaseInput::Boost);
    }
    inputs
}

fn autoplay(game: &mut Game, max_time: Seconds) -> Result<()> {
    game.brief()?;
    game.begin_mission();

    let mut detective = Detective::default();
    while game.state() != GameState::Result {
        if game.clock().elapsed > max_time {
            log::warn!("Autoplay stopped at the {max_time:.0}s limit in {:?}", game.state());
            break;
        }
        match game.state() {
            GameState::Barbershop => detective.barbershop_turn(game),
            GameState::StreetChase => {
                for input in chase_inputs(game.street_chase()) {
                    game.chase_input(input);
                }
            }
            GameState::CarChase => {
                for input in chase_inputs(game.car_chase()) {
                    game.chase_input(input);
                }
            }
            _ => {}
        }
        game.update(FRAME_SECS);
    }
    Ok(())
}

// ── Console output ─────────────────────────────────────────────────

/// Prints the story beats of a session as they happen.
#[derive(Default)]
struct ConsoleObserver;

impl GameObserver for ConsoleObserver {
    fn on_event(&mut self, event: &GameEvent) {
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        match event {
            GameEvent::MissionBriefed { codename, traits, background, lineup_size } => {
                println!("[{stamp}] BRIEFING: {codename}");
                println!("           {background}");
                for t in traits {
                    println!("           - {t}");
                }
                println!("           {lineup_size} customers booked today");
            }
            GameEvent::CustomerArrived { index, name, .. } => {
                println!("[{stamp}] customer #{} takes the chair: {name}", index + 1);
            }
            GameEvent::DialogueAdded { speaker, text } => {
                let who = match speaker {
                    Speaker::Player   => "you",
                    Speaker::Customer => "customer",
                    Speaker::System   => "--",
                };
                println!("[{stamp}] {who:>9}: {text}");
            }
            GameEvent::PlayerHunch { text } => println!("[{stamp}]     hunch: {text}"),
            GameEvent::ReputationChanged { reputation } => {
                println!("[{stamp}] reputation: {}", "*".repeat(*reputation as usize));
            }
            GameEvent::HaircutCompleted { index } => {
                println!("[{stamp}] haircut #{} done", index + 1);
            }
            GameEvent::ChaseStarted { kind, distance, gauge } => {
                println!(
                    "[{stamp}] {} begins: distance {distance:.0}, {} {gauge:.0}",
                    kind.label(),
                    kind.gauge_label()
                );
            }
            GameEvent::HazardHit { kind, lane, .. } => {
                println!("[{stamp}] {}: hit an obstacle in lane {lane}", kind.label());
            }
            GameEvent::ChaseEnded { kind, outcome } => {
                println!("[{stamp}] {} over: {outcome:?}", kind.label());
            }
            GameEvent::ChatbotFallback { reason, .. } => {
                log::debug!("chatbot fallback: {reason}");
            }
            _ => {}
        }
    }
}

fn print_summary(game: &Game, run_id: &str) {
    println!();
    match game.outcome() {
        Some(outcome) => println!("{outcome}"),
        None => println!("=== NO RESULT ({:?}) ===", game.state()),
    }
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run:             {run_id}");
    println!("  session:         {}", game.session_id());
    println!("  game time:       {:.1}s", game.clock().elapsed);
    println!("  chatbot errors:  {}", game.chatbot().failures());
    if let Some(e) = game.chatbot().last_error() {
        println!("  last error:      {e}");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

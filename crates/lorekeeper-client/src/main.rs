//! Lorekeeper terminal client entry point.

use std::sync::Arc;

use lorekeeper_client::config::ClientConfig;
use lorekeeper_client::error::AppError;
use lorekeeper_client::http::HttpBackend;
use lorekeeper_client::orchestrator::{self, Command, GameView, OrchestratorSettings};
use lorekeeper_client::storage::FileStore;
use lorekeeper_client::telemetry;
use lorekeeper_client::terminal::{self, Input};
use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::storage::KeyValueStore;
use lorekeeper_session::application::scenarios;
use lorekeeper_session::domain::resume::{OnboardingPhase, ResumeState};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{info, warn};

type InputLines = Lines<BufReader<Stdin>>;

enum Exit {
    Quit,
    Switch,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ClientConfig::from_env()?;
    telemetry::init(config.log_format);
    info!(api_url = %config.api_url, state_file = %config.state_file.display(), "starting Lorekeeper client");

    let backend: Arc<dyn GameBackend> =
        Arc::new(HttpBackend::new(&config.api_url, config.request_timeout)?);
    let store = FileStore::open(&config.state_file);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut state = ResumeState::load(&store);
    loop {
        state = match state.phase {
            OnboardingPhase::Intro => {
                println!("LOREKEEPER");
                println!("NPCs remember. Time moves on without you.");
                println!("Press enter to begin.");
                if lines.next_line().await?.is_none() {
                    return Ok(());
                }
                scenarios::enter_selection(&store)?
            }
            OnboardingPhase::Select => {
                match choose_scenario(backend.as_ref(), &store, &mut lines).await? {
                    Some(state) => state,
                    None => return Ok(()),
                }
            }
            OnboardingPhase::Game => {
                match play(Arc::clone(&backend), &config, &mut lines).await? {
                    Exit::Quit => return Ok(()),
                    Exit::Switch => scenarios::leave_game(&store)?,
                }
            }
        };
    }
}

async fn choose_scenario(
    backend: &dyn GameBackend,
    store: &dyn KeyValueStore,
    lines: &mut InputLines,
) -> Result<Option<ResumeState>, AppError> {
    loop {
        let list = match scenarios::list_scenarios(backend).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                println!("No scenarios are available. Press enter to retry, /quit to leave.");
                Vec::new()
            }
            Err(error) => {
                warn!(%error, "failed to list scenarios");
                println!("Could not reach the backend. Press enter to retry, /quit to leave.");
                Vec::new()
            }
        };
        if !list.is_empty() {
            println!("Choose your scenario:");
            for line in terminal::render_scenarios(&list) {
                println!("{line}");
            }
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        if terminal::parse_input(&line) == Input::Quit {
            return Ok(None);
        }
        let Some(scenario) = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| list.get(index))
        else {
            continue;
        };

        println!("Loading {}...", scenario.name);
        match scenarios::activate(backend, store, &scenario.id).await {
            Ok(state) => return Ok(Some(state)),
            Err(error) => {
                warn!(%error, scenario_id = %scenario.id, "activation failed");
                println!("That world would not open: {error}");
            }
        }
    }
}

async fn play(
    backend: Arc<dyn GameBackend>,
    config: &ClientConfig,
    lines: &mut InputLines,
) -> Result<Exit, AppError> {
    let handle = orchestrator::spawn(backend, OrchestratorSettings::from(config))?;
    let printer = tokio::spawn(print_updates(handle.subscribe()));
    println!("Type /help for commands.");

    let exit = loop {
        let Some(line) = lines.next_line().await? else {
            break Exit::Quit;
        };
        let view = handle.view();
        let command = match terminal::parse_input(&line) {
            Input::Command(command) => command,
            Input::Empty if view.playback.is_some() => Command::Continue,
            Input::Empty => continue,
            Input::Talk(target) => {
                match view
                    .world
                    .as_deref()
                    .and_then(|world| terminal::resolve_npc(world, &target))
                {
                    Some(npc_id) => Command::SelectNpc(npc_id),
                    None => {
                        println!("There is no one called {target} here.");
                        continue;
                    }
                }
            }
            Input::Npcs => {
                print_lines(view.world.as_deref().map(terminal::render_npcs));
                continue;
            }
            Input::World => {
                print_lines(view.world.as_deref().map(terminal::render_world));
                continue;
            }
            Input::Help => {
                println!("{}", terminal::HELP);
                continue;
            }
            Input::Switch => break Exit::Switch,
            Input::Quit => break Exit::Quit,
            Input::Unknown(text) => {
                println!("Unknown command: {text}. Type /help for commands.");
                continue;
            }
        };
        if handle.send(command).is_err() {
            break Exit::Quit;
        }
    };

    handle.shutdown().await;
    if let Err(error) = printer.await {
        warn!(%error, "printer task ended abnormally");
    }
    Ok(exit)
}

async fn print_updates(mut rx: watch::Receiver<GameView>) {
    let mut previous = GameView::default();
    while rx.changed().await.is_ok() {
        let next = rx.borrow_and_update().clone();
        for line in terminal::render_changes(&previous, &next) {
            println!("{line}");
        }
        previous = next;
    }
}

fn print_lines(lines: Option<Vec<String>>) {
    match lines {
        Some(lines) => lines.iter().for_each(|line| println!("{line}")),
        None => println!("The world has not loaded yet."),
    }
}

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use clap::Subcommand;
use focusloop_core::storage::{Database, ProjectStore};
use focusloop_core::{spawn_ticker, Event, SessionController, TimerMode};

use super::{format_clock, print_events, print_json, CmdResult, Workspace};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if stopped, pause if running
    Toggle,
    /// Back to a fresh work interval
    Reset {
        /// Start the new interval immediately
        #[arg(long)]
        auto_start: bool,
    },
    /// Print the current timer state as JSON
    Status,
    /// Run the countdown in the foreground until the sequence completes
    Watch,
}

pub fn run(action: TimerAction) -> CmdResult {
    let mut ws = Workspace::open()?;
    let mut events = ws.take_caught_up();

    match action {
        TimerAction::Start => events.extend(ws.session.start_timer()),
        TimerAction::Pause => events.extend(ws.session.pause_timer()),
        TimerAction::Toggle => events.extend(ws.session.toggle_timer()),
        TimerAction::Reset { auto_start } => events.extend(ws.session.reset_timer(auto_start)),
        TimerAction::Status => {
            print_events(&events)?;
            print_json(&ws.session.timer().snapshot())?;
            ws.save()?;
            return Ok(());
        }
        TimerAction::Watch => {
            print_events(&events)?;
            return watch(ws);
        }
    }

    print_events(&events)?;
    ws.save()?;
    Ok(())
}

fn lock(session: &Mutex<SessionController>) -> MutexGuard<'_, SessionController> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn watch(ws: Workspace) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let period = Duration::from_millis(ws.config.timer.tick_interval_ms);
    let Workspace { mut session, mut store, .. } = ws;

    if let Some(event) = session.start_timer() {
        print_json(&event)?;
    }
    let session = Arc::new(Mutex::new(session));
    let result = runtime.block_on(watch_loop(session.clone(), &mut store, period));

    let mut session = lock(&session);
    session.save_now(&mut store)?;
    result
}

async fn watch_loop(
    session: Arc<Mutex<SessionController>>,
    store: &mut ProjectStore<Database>,
    period: Duration,
) -> CmdResult {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let Some(_ticker) = spawn_ticker(session.clone(), period, move |event| {
        let _ = tx.send(event);
    }) else {
        return Ok(());
    };
    let mut display = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    eprintln!();
                    print_json(&event)?;
                    let done = matches!(event, Event::SequenceCompleted { .. });
                    lock(&session).sync_store(store)?;
                    if done {
                        break;
                    }
                }
                None => break,
            },
            _ = display.tick() => {
                let mut session = lock(&session);
                render_status(&session);
                session.sync_store(store)?;
            }
            _ = &mut ctrl_c => {
                eprintln!();
                tracing::info!("watch interrupted, timer keeps running");
                break;
            }
        }
    }
    Ok(())
}

fn render_status(session: &SessionController) {
    let timer = session.timer();
    let mode = match timer.mode() {
        TimerMode::Work => "focus",
        TimerMode::Break => "break",
    };
    let task = session
        .active_task()
        .map(|t| format!(" | {}", t.title))
        .unwrap_or_default();
    let mut stderr = std::io::stderr();
    let _ = write!(
        stderr,
        "\r{mode} {} ({:>3.0}%){task}   ",
        format_clock(timer.remaining_secs()),
        timer.progress() * 100.0
    );
    let _ = stderr.flush();
}

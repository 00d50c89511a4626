use std::io::Write;

use breathwork_core::{
    BreathingSession, Config, DisplayState, Event, MonotonicClock, Preview, RenderLoop,
    SessionConfig, SessionObserver, SessionOutcome, VisualFrame,
};
use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a guided breathing session (type `p` + Enter to pause/resume, `q` + Enter to exit)
    Run {
        /// Override the configured session length
        #[arg(long)]
        duration_secs: Option<u64>,
        /// Print display states and events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print what a session shows at a given active time as JSON
    Preview {
        /// Active (unpaused) milliseconds since the session started
        #[arg(long)]
        at_ms: u64,
        /// Override the configured session length
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

/// Prints the discrete channel to stdout. The continuous channel only goes to
/// the trace log; a terminal cannot redraw at frame rate.
struct TerminalObserver {
    json: bool,
    last_eased: f64,
}

impl TerminalObserver {
    fn line(&self, state: &DisplayState) -> String {
        let bloom = "*".repeat(1 + (self.last_eased * 10.0).round() as usize);
        format!(
            "{}  {:<6}  {}  {}",
            state.clock_label(),
            state.breath_state.label(),
            state.breath_timer,
            bloom
        )
    }
}

impl SessionObserver for TerminalObserver {
    fn on_visuals(&mut self, frame: &VisualFrame) {
        self.last_eased = frame.eased_progress;
        tracing::trace!(
            eased_progress = frame.eased_progress,
            container_scale = frame.container_scale,
            "frame"
        );
    }

    fn on_display(&mut self, state: &DisplayState) {
        let line = if self.json {
            match serde_json::to_string(state) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode display state");
                    return;
                }
            }
        } else {
            self.line(state)
        };
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to write display state");
        }
    }

    fn on_complete(&mut self) {
        if !self.json {
            println!("Session complete.");
        }
    }

    fn on_release(&mut self, _rest: &VisualFrame) {
        if !self.json {
            println!("Session ended early.");
        }
    }
}

fn session_config(duration_secs: Option<u64>) -> Result<(Config, SessionConfig), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut session = config.session_config()?;
    if let Some(secs) = duration_secs {
        session = session.with_total_secs(secs);
    }
    session.validate()?;
    Ok((config, session))
}

fn describe(event: &Event) -> Option<&'static str> {
    match event {
        Event::SessionPaused { .. } => Some("-- paused --"),
        Event::SessionResumed { .. } => Some("-- resumed --"),
        _ => None,
    }
}

async fn run_live(
    config: Config,
    session_config: SessionConfig,
    json: bool,
) -> Result<SessionOutcome, Box<dyn std::error::Error>> {
    let observer = TerminalObserver {
        json,
        last_eased: 0.0,
    };
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (handle, task) = RenderLoop::new(
        BreathingSession::new(session_config),
        MonotonicClock::new(),
        observer,
    )
    .with_frame_interval(config.frame_interval())
    .with_event_sink(events_tx)
    .spawn();

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            tracing::debug!(session_id = %event.session_id(), ?event, "session event");
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode session event"),
                }
            } else if let Some(text) = describe(&event) {
                println!("{text}");
            }
        }
    });

    let input_handle = handle.clone();
    let input = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim() {
                "p" | "pause" => {
                    input_handle.toggle_pause();
                }
                "q" | "quit" | "exit" => {
                    input_handle.exit();
                    break;
                }
                "" => {}
                other => eprintln!("unknown input: {other} (p = pause/resume, q = exit)"),
            }
        }
        // Closed stdin leaves the session running; keep the handle alive until then.
        std::future::pending::<()>().await;
    });

    let outcome = task.await?;
    input.abort();
    drop(handle);
    printer.await?;
    Ok(outcome)
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            duration_secs,
            json,
        } => {
            let (config, session_config) = session_config(duration_secs)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let outcome = runtime.block_on(run_live(config, session_config, json));
            // Stdin reads are blocking under the hood; don't wait on them.
            runtime.shutdown_background();
            if outcome? == SessionOutcome::Cancelled {
                tracing::info!("session exited before completion");
            }
        }
        SessionAction::Preview {
            at_ms,
            duration_secs,
        } => {
            let (_, session_config) = session_config(duration_secs)?;
            let preview = Preview::at(&session_config, at_ms)?;
            println!("{}", preview.to_json()?);
        }
    }
    Ok(())
}

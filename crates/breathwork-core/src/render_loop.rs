//! Host driver for a [`BreathingSession`].
//!
//! One tokio task owns the session. Frames come from an interval ticker and
//! pause/resume/exit commands arrive on a channel; both are handled inside the
//! same `select!`, so a frame never sees a half-applied transition and no
//! locking is needed around the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::events::Event;
use crate::session::{BreathingSession, Clock, SessionObserver, SessionState};

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Clock on tokio's timeline; follows paused/advanced time in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    TogglePause,
    Pause,
    Resume,
    Exit,
}

/// How a driven session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// Control handle for a running loop. Dropping every clone cancels the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Returns `false` once the loop has finished.
    pub fn toggle_pause(&self) -> bool {
        self.send(Command::TogglePause)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(Command::Resume)
    }

    /// Abort early. `on_complete` will not be invoked.
    pub fn exit(&self) -> bool {
        self.send(Command::Exit)
    }

    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct RenderLoop<C, O> {
    session: BreathingSession,
    clock: C,
    observer: O,
    frame_interval: Duration,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl<C, O> RenderLoop<C, O>
where
    C: Clock + Send + 'static,
    O: SessionObserver + Send + 'static,
{
    pub fn new(session: BreathingSession, clock: C, observer: O) -> Self {
        Self {
            session,
            clock,
            observer,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            events: None,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        // A zero period would make `interval` panic.
        self.frame_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Forward lifecycle events (start, pause, resume, completion, cancel).
    pub fn with_event_sink(mut self, tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Run on a new tokio task.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<SessionOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (SessionHandle { tx }, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> SessionOutcome {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(
            session_id = %self.session.id(),
            frame_interval_ms = self.frame_interval.as_millis() as u64,
            "render loop started"
        );

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let now = self.clock.now_ms();
                    let event = match command {
                        Some(Command::TogglePause) => self.session.toggle_pause(now),
                        Some(Command::Pause) => self.session.pause(now),
                        Some(Command::Resume) => self.session.resume(now),
                        Some(Command::Exit) | None => {
                            let event = self.session.cancel(now, &mut self.observer);
                            self.emit(event);
                            return self.outcome();
                        }
                    };
                    self.emit(event);
                }

                _ = ticker.tick() => {
                    let now = self.clock.now_ms();
                    let event = self.session.frame(now, &mut self.observer);
                    self.emit(event);
                    if !self.session.needs_frame() {
                        return self.outcome();
                    }
                }
            }
        }
    }

    fn emit(&self, event: Option<Event>) {
        if let (Some(tx), Some(event)) = (&self.events, event) {
            // Receiver gone just means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }

    fn outcome(&self) -> SessionOutcome {
        match self.session.state() {
            SessionState::Completed => SessionOutcome::Completed,
            _ => SessionOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::session::{DisplayState, SessionConfig};
    use crate::visuals::VisualFrame;

    #[derive(Default)]
    struct Counts {
        frames: usize,
        displays: Vec<DisplayState>,
        completions: usize,
        releases: usize,
    }

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Counts>>);

    impl SessionObserver for Shared {
        fn on_visuals(&mut self, _frame: &VisualFrame) {
            self.0.lock().unwrap().frames += 1;
        }
        fn on_display(&mut self, state: &DisplayState) {
            self.0.lock().unwrap().displays.push(*state);
        }
        fn on_complete(&mut self) {
            self.0.lock().unwrap().completions += 1;
        }
        fn on_release(&mut self, _rest: &VisualFrame) {
            self.0.lock().unwrap().releases += 1;
        }
    }

    fn short_session(total_secs: u64) -> BreathingSession {
        BreathingSession::new(SessionConfig::default().with_total_secs(total_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion() {
        let shared = Shared::default();
        let (handle, task) =
            RenderLoop::new(short_session(2), TokioClock::new(), shared.clone()).spawn();

        assert_eq!(task.await.unwrap(), SessionOutcome::Completed);
        assert!(handle.is_finished());

        let counts = shared.0.lock().unwrap();
        assert_eq!(counts.completions, 1);
        assert_eq!(counts.releases, 0);
        assert!(counts.frames > 100);
        let remaining: Vec<u64> = counts.displays.iter().map(|d| d.time_remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_extends_wall_time_not_session_time() {
        let shared = Shared::default();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let started = tokio::time::Instant::now();
        let (handle, task) = RenderLoop::new(short_session(2), TokioClock::new(), shared.clone())
            .with_event_sink(events_tx)
            .spawn();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(handle.pause());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handle.resume());

        assert_eq!(task.await.unwrap(), SessionOutcome::Completed);
        assert!(started.elapsed() >= Duration::from_secs(7));

        let mut kinds = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            kinds.push(match event {
                Event::SessionStarted { .. } => "started",
                Event::SessionPaused { .. } => "paused",
                Event::SessionResumed { .. } => "resumed",
                Event::SessionCompleted { .. } => "completed",
                Event::SessionCancelled { .. } => "cancelled",
                Event::StateSnapshot { .. } => "snapshot",
            });
        }
        assert_eq!(kinds, vec!["started", "paused", "resumed", "completed"]);
        assert_eq!(shared.0.lock().unwrap().completions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_before_first_tick_still_reports_start() {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let session = short_session(1);
        let id = session.id();
        let (handle, task) = RenderLoop::new(session, TokioClock::new(), ())
            .with_event_sink(events_tx)
            .spawn();
        assert!(handle.pause());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.resume());
        assert_eq!(task.await.unwrap(), SessionOutcome::Completed);

        let mut events = Vec::new();
        while let Ok(event) = events_rx.try_recv() {
            events.push(event);
        }
        assert!(events.iter().all(|e| e.session_id() == id));
        let started = events
            .iter()
            .filter(|e| matches!(e, Event::SessionStarted { .. }))
            .count();
        assert_eq!(started, 1);
        assert!(matches!(events.first(), Some(Event::SessionPaused { .. })));
        assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn exit_cancels_without_completion() {
        let shared = Shared::default();
        let (handle, task) =
            RenderLoop::new(short_session(60), TokioClock::new(), shared.clone()).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.exit());

        assert_eq!(task.await.unwrap(), SessionOutcome::Cancelled);
        let counts = shared.0.lock().unwrap();
        assert_eq!(counts.completions, 0);
        assert_eq!(counts.releases, 1);
        assert!(!handle.toggle_pause());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let shared = Shared::default();
        let (handle, task) =
            RenderLoop::new(short_session(60), TokioClock::new(), shared.clone()).spawn();
        drop(handle);

        assert_eq!(task.await.unwrap(), SessionOutcome::Cancelled);
        assert_eq!(shared.0.lock().unwrap().completions, 0);
    }
}

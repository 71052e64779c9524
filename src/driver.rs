//! Headless fixed-rate frame loop feeding scripted input into a [`GameSession`].

use std::{
    str::FromStr,
    sync::{
        Arc,
        Mutex
    },
    time::Duration
};

use crate::{
    game::input::InputSnapshot,
    session::{
        GameSession,
        SessionError,
        SessionEvent
    }
};

#[derive(Debug, thiserror::Error)]
pub enum InputScriptError {
    #[error("Entry {entry}: unknown button '{button}'")]
    UnknownButton {
        entry: usize,
        button: String,
    },

    #[error("Entry {entry}: invalid frame count '{value}'")]
    InvalidFrameCount {
        entry: usize,
        value: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Session failed, reason='{0}'")]
    Session(#[from] SessionError),

    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("Could not serialize frame, reason='{0}'")]
    Json(#[from] serde_json::Error),

    #[error("Could not join task, reason='{0}'")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

/// Sequence of held-button sets, each kept for a number of frames.
///
/// Entries are separated by commas or whitespace and read `buttons:frames`,
/// buttons joined with `+`, for example `right:30, right+jump:1, idle:20`.
/// A missing `:frames` means one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputScript {
    steps: Vec<(InputSnapshot, u64)>,
}

impl InputScript {
    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|(_, frames)| frames).sum()
    }

    /// Input held on `frame`, nothing is held once the script ran out.
    pub fn input_at(&self, frame: u64) -> InputSnapshot {
        let mut start = 0;
        for (input, frames) in self.steps.iter() {
            if frame < start + frames {
                return *input;
            }
            start += frames;
        }
        InputSnapshot::default()
    }

    fn parse_buttons(entry: usize, buttons: &str) -> Result<InputSnapshot, InputScriptError> {
        let mut input = InputSnapshot::default();
        for button in buttons.split('+').map(str::trim) {
            match button {
                "left" => input.left = true,
                "right" => input.right = true,
                "down" => input.down = true,
                "jump" => input.jump = true,
                "attack" => input.attack = true,
                "confirm" => input.confirm = true,
                "idle" => {},
                other => return Err(InputScriptError::UnknownButton { entry, button: other.to_string() }),
            }
        }
        Ok(input)
    }
}

impl FromStr for InputScript {
    type Err = InputScriptError;

    fn from_str(script: &str) -> Result<Self, Self::Err> {
        let mut steps = vec![];
        let entries = script
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|e| !e.is_empty());

        for (entry, text) in entries.enumerate() {
            let (buttons, frames) = match text.split_once(':') {
                Some((buttons, frames)) => {
                    let frames = frames.parse::<u64>().map_err(|_| InputScriptError::InvalidFrameCount {
                        entry,
                        value: frames.to_string(),
                    })?;
                    (buttons, frames)
                },
                None => (text, 1),
            };
            steps.push((InputScript::parse_buttons(entry, buttons)?, frames));
        }

        Ok(Self { steps })
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub fps: u32,
    /// Stop after this many frames, run until shutdown otherwise.
    pub max_frames: Option<u64>,
    pub script: InputScript,
    /// Print every render frame as a JSON line on stdout.
    pub dump_frames: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_frames: None,
            script: InputScript::default(),
            dump_frames: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DriverReport {
    pub frames: u64,
    pub events: Vec<SessionEvent>,
    pub game_over: bool,
}

pub struct GameDriverHandler {
    pub session: Arc<Mutex<GameSession>>,
    main_task_handler: tokio::task::JoinHandle<Result<DriverReport, DriverError>>,
    shutdown_sender: tokio::sync::oneshot::Sender<()>,
    notify_stopped: Arc<tokio::sync::Notify>,
}

pub struct GameDriver {
    session: GameSession,
    config: DriverConfig,
}

impl GameDriver {
    pub fn new(session: GameSession, config: DriverConfig) -> Self {
        Self {
            session,
            config,
        }
    }

    fn tick(session: &Mutex<GameSession>, config: &DriverConfig, frame: u64, report: &mut DriverReport) -> Result<(), DriverError> {
        let mut session = session.lock().map_err(|_| DriverError::LockPoisoned)?;
        let dt = 1.0 / config.fps.max(1) as f32;

        session.handle_input(config.script.input_at(frame));
        let events = session.step(dt)?;
        for event in events.iter() {
            log::debug!("Frame {frame}: {event:?}");
        }
        report.events.extend(events);

        if config.dump_frames {
            println!("{}", serde_json::to_string(&session.render_frame())?);
        }

        report.frames = frame + 1;
        report.game_over = session.is_game_over();
        Ok(())
    }

    pub fn run(self) -> GameDriverHandler {
        let session = Arc::new(Mutex::new(self.session));
        let session_shared = session.clone();
        let config = self.config;
        let (shutdown_sender, mut shutdown_receiver) = tokio::sync::oneshot::channel();
        let notify_stopped = Arc::new(tokio::sync::Notify::new());
        let notify_stopped_shared = notify_stopped.clone();

        let main_task_handler = tokio::spawn(async move {
            let frame_interval = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
            let mut interval = tokio::time::interval(frame_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut report = DriverReport::default();

            loop {
                if config.max_frames.is_some_and(|max| report.frames >= max) || report.game_over {
                    break;
                }

                tokio::select! {
                    _ = &mut shutdown_receiver => {
                        log::debug!("Received shut down signal...");
                        break;
                    },
                    _ = interval.tick() => {
                        let frame = report.frames;
                        if let Err(e) = Self::tick(&session_shared, &config, frame, &mut report) {
                            log::error!("Frame {frame} failed: {e}");
                            notify_stopped_shared.notify_one();
                            return Err(e);
                        }
                    },
                }
            }

            log::info!("Driver stopped after {} frames", report.frames);
            notify_stopped_shared.notify_one();
            Ok(report)
        });

        GameDriverHandler {
            session,
            main_task_handler,
            shutdown_sender,
            notify_stopped,
        }
    }
}

impl GameDriverHandler {
    /// Stops the loop if still running and returns what it ran.
    pub async fn shutdown(self) -> Result<DriverReport, DriverError> {
        log::debug!("Gracefully shutting down driver...");
        // Fails only when the loop already stopped on its own.
        let _ = self.shutdown_sender.send(());
        self.main_task_handler.await?
    }

    /// Resolves once the frame budget ran out, the game is over or a frame failed.
    pub async fn await_stopped(&self) {
        self.notify_stopped.notified().await
    }
}

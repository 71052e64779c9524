//! Progression and stage switching between the overworld and a running level.

use crate::{
    game::{
        input::InputSnapshot,
        level::{
            Level,
            LevelError,
            LevelEvent,
            Transition
        },
        overworld::Overworld,
        progress::{
            ProgressData,
            ProgressEvent
        }
    },
    levels::LevelDescriptor,
    rendering::RenderFrame
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session needs at least one level")]
    NoLevels,

    #[error("Level {0} does not exist")]
    UnknownLevel(u32),

    #[error("Level {level} is locked, unlocked up to {unlocked}")]
    LevelLocked {
        level: u32,
        unlocked: u32,
    },

    #[error("Operation needs the {expected} stage")]
    WrongStage {
        expected: &'static str,
    },

    #[error("Level failed, reason='{0}'")]
    Level(#[from] LevelError),
}

#[derive(Debug)]
pub enum Stage {
    Overworld(Overworld),
    Level(Box<Level>),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Overworld(_) => "overworld",
            Stage::Level(_) => "level",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Level(LevelEvent),
    Progress(ProgressEvent),
    EnteredLevel {
        level: u32,
    },
    EnteredOverworld,
    GameOver,
}

#[derive(Debug)]
pub struct GameSession {
    progress: ProgressData,
    stage: Stage,
    levels: Vec<LevelDescriptor>,
    game_over: bool,
}

impl GameSession {
    pub fn new(levels: Vec<LevelDescriptor>) -> Result<Self, SessionError> {
        Self::with_progress(levels, ProgressData::new())
    }

    pub fn with_progress(levels: Vec<LevelDescriptor>, progress: ProgressData) -> Result<Self, SessionError> {
        if levels.is_empty() {
            return Err(SessionError::NoLevels);
        }
        for level in levels.iter() {
            level.validate()?;
        }

        log::info!("Session started with {} levels", levels.len());
        let overworld = Overworld::new(progress.current_level(), levels.len() as u32);
        Ok(Self {
            progress,
            stage: Stage::Overworld(overworld),
            levels,
            game_over: false,
        })
    }

    pub fn progress(&self) -> &ProgressData {
        &self.progress
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn level(&self) -> Option<&Level> {
        match &self.stage {
            Stage::Level(level) => Some(level),
            Stage::Overworld(_) => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn handle_input(&mut self, input: InputSnapshot) {
        match &mut self.stage {
            Stage::Overworld(overworld) => overworld.handle_input(input),
            Stage::Level(level) => level.handle_input(input),
        }
    }

    /// Builds level `index` and switches to it. Only valid from the overworld.
    pub fn enter_level(&mut self, index: u32) -> Result<(), SessionError> {
        if !matches!(self.stage, Stage::Overworld(_)) {
            return Err(SessionError::WrongStage { expected: "overworld" });
        }
        if index > self.progress.unlocked_level() {
            return Err(SessionError::LevelLocked { level: index, unlocked: self.progress.unlocked_level() });
        }
        let descriptor = self.levels.get(index as usize).ok_or(SessionError::UnknownLevel(index))?;

        let level = Level::from_descriptor(descriptor)?;
        self.progress.set_current_level(index);
        self.stage = Stage::Level(Box::new(level));
        log::info!("Entered level {index} '{}'", descriptor.name);
        Ok(())
    }

    fn enter_overworld(&mut self) {
        log::info!("Returned to overworld");
        self.stage = Stage::Overworld(Overworld::new(self.progress.current_level(), self.levels.len() as u32));
    }

    fn apply_transition(&mut self, transition: Transition, events: &mut Vec<SessionEvent>) {
        let progress_events = match transition {
            Transition::GoalReached { unlock } => self.progress.unlock_level(unlock),
            Transition::FellOut => self.progress.add_health(-1),
        };
        events.extend(progress_events.into_iter().map(SessionEvent::Progress));

        self.enter_overworld();
        events.push(SessionEvent::EnteredOverworld);
    }

    /// Advances the active stage by `dt` seconds and applies any transition it raised.
    pub fn step(&mut self, dt: f32) -> Result<Vec<SessionEvent>, SessionError> {
        if self.game_over {
            return Ok(vec![]);
        }

        let mut events = vec![];
        let mut selected = None;
        let mut transition = None;

        match &mut self.stage {
            Stage::Overworld(overworld) => {
                selected = overworld.step(dt, &mut self.progress);
            },
            Stage::Level(level) => {
                for event in level.step(dt, &mut self.progress) {
                    if let LevelEvent::Transition(t) = event {
                        transition = Some(t);
                    }
                    events.push(SessionEvent::Level(event));
                }
            },
        }

        if let Some(index) = selected {
            self.enter_level(index)?;
            events.push(SessionEvent::EnteredLevel { level: index });
        }
        if let Some(transition) = transition {
            self.apply_transition(transition, &mut events);
        }

        if self.progress.is_game_over() {
            log::info!("Game over, coins={}", self.progress.coins());
            self.game_over = true;
            events.push(SessionEvent::GameOver);
        }

        Ok(events)
    }

    pub fn render_frame(&self) -> RenderFrame {
        match &self.stage {
            Stage::Overworld(overworld) => overworld.render_frame(&self.progress),
            Stage::Level(level) => level.render_frame(),
        }
    }
}

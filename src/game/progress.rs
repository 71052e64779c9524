use serde::{
    Deserialize,
    Serialize
};

pub const COINS_PER_HEALTH: u32 = 100;
pub const STARTING_HEALTH: i32 = 5;

/// Change notification produced by every progression mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    CoinsChanged { coins: u32 },
    HealthChanged { health: i32 },
    LevelUnlocked { level: u32 },
}

/// Session-wide progression, survives level switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressData {
    coins: u32,
    health: i32,
    unlocked_level: u32,
    current_level: u32,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            coins: 0,
            health: STARTING_HEALTH,
            unlocked_level: 0,
            current_level: 0,
        }
    }
}

impl ProgressData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn unlocked_level(&self) -> u32 {
        self.unlocked_level
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn is_game_over(&self) -> bool {
        self.health <= 0
    }

    /// Every full hundred coins converts into one health point.
    pub fn add_coins(&mut self, amount: u32) -> Vec<ProgressEvent> {
        let mut events = vec![];
        self.coins = self.coins.saturating_add(amount);

        let mut extra_health = 0;
        while self.coins >= COINS_PER_HEALTH {
            self.coins -= COINS_PER_HEALTH;
            extra_health += 1;
        }

        if extra_health > 0 {
            log::debug!("{extra_health} health granted from coins");
            events.extend(self.add_health(extra_health));
        }
        events.push(ProgressEvent::CoinsChanged { coins: self.coins });
        events
    }

    pub fn add_health(&mut self, delta: i32) -> Vec<ProgressEvent> {
        self.health += delta;
        vec![ProgressEvent::HealthChanged { health: self.health }]
    }

    /// Never locks a level that was already open.
    pub fn unlock_level(&mut self, level: u32) -> Vec<ProgressEvent> {
        if level > self.unlocked_level {
            self.unlocked_level = level;
            vec![ProgressEvent::LevelUnlocked { level }]
        } else {
            vec![]
        }
    }

    pub fn set_current_level(&mut self, level: u32) {
        self.current_level = level.min(self.unlocked_level);
    }
}

#[test]
fn test_coins_below_threshold_accumulate() {
    let mut progress = ProgressData::new();
    let events = progress.add_coins(99);
    assert_eq!(progress.coins(), 99);
    assert_eq!(progress.health(), STARTING_HEALTH);
    assert_eq!(events, vec![ProgressEvent::CoinsChanged { coins: 99 }]);
}

#[test]
fn test_coin_rollover_is_chainable() {
    let mut progress = ProgressData::new();
    let events = progress.add_coins(250);
    assert_eq!(progress.coins(), 50);
    assert_eq!(progress.health(), STARTING_HEALTH + 2);
    assert_eq!(events, vec![
        ProgressEvent::HealthChanged { health: STARTING_HEALTH + 2 },
        ProgressEvent::CoinsChanged { coins: 50 },
    ]);
}

#[test]
fn test_coin_rollover_across_increments() {
    let mut progress = ProgressData::new();
    for _ in 0..30 {
        progress.add_coins(5);
        assert!(progress.coins() < COINS_PER_HEALTH);
    }
    assert_eq!(progress.coins(), 50);
    assert_eq!(progress.health(), STARTING_HEALTH + 1);
}

#[test]
fn test_game_over_at_zero_health() {
    let mut progress = ProgressData::new();
    progress.add_health(-(STARTING_HEALTH - 1));
    assert!(!progress.is_game_over());
    progress.add_health(-1);
    assert!(progress.is_game_over());
}

#[test]
fn test_unlock_never_regresses() {
    let mut progress = ProgressData::new();
    assert_eq!(progress.unlock_level(2), vec![ProgressEvent::LevelUnlocked { level: 2 }]);
    assert!(progress.unlock_level(1).is_empty());
    assert_eq!(progress.unlocked_level(), 2);

    progress.set_current_level(5);
    assert_eq!(progress.current_level(), 2);
}

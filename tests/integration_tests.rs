use std::{
    collections::HashSet,
    time::Duration
};

use pirate_world::{
    game::{
        enemies::ShooterKind,
        entity::{
            CollisionGroups,
            EntityBody
        },
        input::InputSnapshot,
        items::PickupKind,
        level::{
            Level,
            LevelEvent,
            Transition
        },
        math::{
            Rect2F,
            Vector2F
        },
        progress::{
            ProgressData,
            ProgressEvent
        }
    },
    levels::{
        LevelDescriptor,
        SpawnDescriptor
    },
    session::{
        GameSession,
        SessionEvent
    }
};

const DT: f32 = 1.0 / 60.0;
const GROUND_TOP: f32 = 400.0;
/// Player center that puts the hitbox bottom on `GROUND_TOP`.
const STANDING_Y: f32 = GROUND_TOP - 30.0;

fn descriptor(name: &str, finish: Rect2F, with_ground: bool, spawns: Vec<SpawnDescriptor>) -> LevelDescriptor {
    let mut all_spawns = vec![SpawnDescriptor::Player { center: Vector2F::new(100.0, STANDING_Y) }];
    all_spawns.extend(spawns);
    LevelDescriptor {
        name: name.to_string(),
        width: 2000.0,
        bottom: 600.0,
        finish,
        level_unlock: 1,
        solids: if with_ground { vec![Rect2F::new(0.0, GROUND_TOP, 2000.0, 64.0)] } else { vec![] },
        semi_solids: vec![],
        spawns: all_spawns,
    }
}

fn far_finish() -> Rect2F {
    Rect2F::new(1900.0, 300.0, 64.0, 100.0)
}

fn ground_level() -> Level {
    let mut level = Level::new("Flat", 2000.0, 600.0, far_finish(), 1, Vector2F::new(100.0, STANDING_Y));
    level.create_solid(Rect2F::new(0.0, GROUND_TOP, 2000.0, 64.0));
    level
}

fn run_session(session: &mut GameSession, frames: usize) -> Vec<SessionEvent> {
    let mut events = vec![];
    for _ in 0..frames {
        events.extend(session.step(DT).unwrap());
    }
    events
}

#[test]
fn test_falling_out_costs_one_life_once() {
    let mut session = GameSession::new(vec![descriptor("Pit", far_finish(), false, vec![])]).unwrap();
    session.enter_level(0).unwrap();

    let events = run_session(&mut session, 240);
    let fell_out = events.iter()
        .filter(|e| **e == SessionEvent::Level(LevelEvent::Transition(Transition::FellOut)))
        .count();
    assert_eq!(fell_out, 1);
    assert_eq!(session.progress().health(), 4);
    assert!(events.contains(&SessionEvent::Progress(ProgressEvent::HealthChanged { health: 4 })));
    assert!(events.contains(&SessionEvent::EnteredOverworld));
    assert_eq!(session.stage().name(), "overworld");
}

#[test]
fn test_goal_unlocks_next_level_once() {
    let finish = Rect2F::new(80.0, 300.0, 64.0, 100.0);
    let levels = vec![
        descriptor("First", finish, true, vec![]),
        descriptor("Second", far_finish(), true, vec![]),
    ];
    let mut session = GameSession::new(levels).unwrap();
    session.enter_level(0).unwrap();

    let events = run_session(&mut session, 60);
    let goals = events.iter()
        .filter(|e| matches!(e, SessionEvent::Level(LevelEvent::Transition(Transition::GoalReached { .. }))))
        .count();
    assert_eq!(goals, 1);
    assert_eq!(session.progress().unlocked_level(), 1);
    assert!(events.contains(&SessionEvent::Progress(ProgressEvent::LevelUnlocked { level: 1 })));

    // Back on the overworld, walk to the newly opened node and enter it.
    session.handle_input(InputSnapshot { right: true, ..Default::default() });
    run_session(&mut session, 1);
    session.handle_input(InputSnapshot { confirm: true, ..Default::default() });
    let events = run_session(&mut session, 1);
    assert!(events.contains(&SessionEvent::EnteredLevel { level: 1 }));
    assert_eq!(session.level().map(|l| l.name()), Some("Second"));
}

#[test]
fn test_replaying_a_level_never_locks_progress() {
    let finish = Rect2F::new(80.0, 300.0, 64.0, 100.0);
    let mut first = descriptor("First", finish, true, vec![]);
    first.level_unlock = 1;
    let levels = vec![first, descriptor("Second", far_finish(), true, vec![]), descriptor("Third", far_finish(), true, vec![])];

    let mut progress = ProgressData::new();
    progress.unlock_level(2);
    let mut session = GameSession::with_progress(levels, progress).unwrap();
    session.enter_level(0).unwrap();
    run_session(&mut session, 10);
    assert_eq!(session.progress().unlocked_level(), 2);
}

#[test]
fn test_shooter_fires_single_projectile_per_cooldown() {
    let mut level = ground_level();
    let mut progress = ProgressData::new();
    level.create_shooter(ShooterKind::Shell, Vector2F::new(300.0, GROUND_TOP - 64.0), true);

    let mut seen = HashSet::new();
    // Just short of the 3 s cooldown.
    for _ in 0..170 {
        level.step(DT, &mut progress);
        seen.extend(level.iter_entities()
            .filter(|e| e.is_in(CollisionGroups::PROJECTILE))
            .map(|e| e.id));
    }
    assert_eq!(seen.len(), 1);
    assert_eq!(progress.health(), 4, "pearl should have hit the player");
    assert!(!level.iter_entities().any(|e| e.is_in(CollisionGroups::PROJECTILE)));
}

#[test]
fn test_coins_roll_over_into_health() {
    let mut level = ground_level();
    let mut progress = ProgressData::new();
    for _ in 0..5 {
        level.create_pickup(PickupKind::Skull, Vector2F::new(100.0, STANDING_Y));
    }

    let events = level.step(DT, &mut progress);
    assert_eq!(progress.coins(), 50);
    assert_eq!(progress.health(), 7);
    let health_changes: Vec<_> = events.iter()
        .filter_map(|e| match e {
            LevelEvent::Progress(ProgressEvent::HealthChanged { health }) => Some(*health),
            _ => None,
        })
        .collect();
    assert_eq!(health_changes, vec![6, 7]);
}

#[test]
fn test_hazard_damage_leads_to_single_game_over() {
    let spike = SpawnDescriptor::Spike {
        center: Vector2F::new(100.0, STANDING_Y),
        radius: 0.0,
        speed: 0.0,
        start_angle: 0.0,
        end_angle: -1.0,
    };
    let mut session = GameSession::new(vec![descriptor("Spikes", far_finish(), true, vec![spike])]).unwrap();
    session.enter_level(0).unwrap();

    let events = run_session(&mut session, 400);
    let game_overs = events.iter().filter(|e| **e == SessionEvent::GameOver).count();
    assert_eq!(game_overs, 1);
    assert!(session.is_game_over());
    assert_eq!(session.progress().health(), 0);
    assert!(session.step(DT).unwrap().is_empty());
}

#[test]
fn test_attack_reverses_tooth_once_per_debounce() {
    let mut level = ground_level();
    let mut progress = ProgressData::new();
    let tooth_id = level.create_tooth(Vector2F::new(150.0, GROUND_TOP - 40.0), -1.0);

    let tooth_direction = |level: &Level| match &level.get_entity_by_id(tooth_id).unwrap().body {
        EntityBody::Tooth(tooth) => tooth.direction(),
        _ => unreachable!(),
    };

    level.handle_input(InputSnapshot { attack: true, ..Default::default() });
    level.step(DT, &mut progress);
    assert_eq!(tooth_direction(&level), 1.0);

    // A second deflection inside the debounce window is ignored.
    let now = level.clock();
    let entity = level.get_entity_by_id_mut(tooth_id).unwrap();
    assert!(!entity.reverse(now));
    assert!(!entity.reverse(now + Duration::from_millis(10)));
    assert_eq!(tooth_direction(&level), 1.0);
}

#[test]
fn test_builtin_session_runs_headless() {
    let mut session = GameSession::new(pirate_world::levels::builtin_levels()).unwrap();
    session.handle_input(InputSnapshot { confirm: true, ..Default::default() });
    run_session(&mut session, 1);

    session.handle_input(InputSnapshot { right: true, ..Default::default() });
    run_session(&mut session, 120);

    let frame = session.render_frame();
    assert!(frame.items.iter().any(|i| i.sprite == "player"));
    let json = serde_json::to_string(&frame).unwrap();
    assert!(json.contains("\"player_flicker\""));
}

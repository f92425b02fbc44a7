use maze_chase::{Action, Dir, SaveStore, Session, SessionConfig, State};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded(seed: u64) -> Session {
    Session::with_rng(SessionConfig::default(), 0, StdRng::seed_from_u64(seed)).unwrap()
}

#[test]
fn countdown_runs_out_and_replay_restarts() {
    let mut session = seeded(0xBEEF);
    session.handle_action(Action::Start);
    assert_eq!(session.state(), State::Playing);

    for _ in 0..61 {
        session.tick(1.0);
    }
    assert_eq!(session.state(), State::GameOver);
    assert_eq!(session.time_left(), 0.0);

    session.handle_action(Action::Replay);
    assert_eq!(session.state(), State::Playing);
    assert_eq!(session.level(), 1);
    assert_eq!(session.score(), 0);
    assert_eq!(session.time_left(), 60.0);
}

#[test]
fn random_walk_never_leaves_the_path() {
    let mut session = seeded(0x5EED);
    session.handle_action(Action::Start);

    let dirs = [Dir::Right, Dir::Down, Dir::Left, Dir::Up, Dir::Right, Dir::Down];
    for step in 0..400 {
        session.handle_action(Action::Move(dirs[step % dirs.len()]));
        session.tick(0.05);
        if session.state() != State::Playing {
            break;
        }
        assert!(session.grid().is_path(session.player()));
    }
}

#[test]
fn pause_freezes_the_clock_but_not_queries() {
    let mut session = seeded(1);
    session.handle_action(Action::Start);
    session.tick(1.0);
    let remaining = session.time_left();

    session.handle_action(Action::TogglePause);
    for _ in 0..20 {
        session.tick(1.0);
    }
    assert!(session.is_paused());
    assert_eq!(session.time_left(), remaining);
    // Render queries keep answering while paused.
    assert!(session.grid().is_path(session.player()));
    assert!(session.enemy_positions().count() > 0);

    session.handle_action(Action::TogglePause);
    session.tick(1.0);
    assert!(session.time_left() < remaining);
}

#[test]
fn save_and_load_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::new(dir.path().join("savegame.txt"), dir.path().join("highscore.txt"));

    let mut session = seeded(2);
    session.handle_action(Action::Start);
    session.tick(0.5);
    store.save_game(&session.save_data()).unwrap();

    let loaded = store.load_game().unwrap().expect("save written above");
    let mut restored = seeded(3);
    restored.handle_action(Action::LoadFrom(loaded));
    assert_eq!(restored.state(), State::Playing);
    assert_eq!(restored.level(), session.level());
    assert_eq!(restored.score(), session.score());
    assert!(restored.grid().is_path(restored.player()));
}

#[test]
fn menu_return_and_restart_work_mid_game() {
    let mut session = seeded(4);
    session.handle_action(Action::Start);
    for _ in 0..10 {
        session.tick(0.5);
    }
    session.handle_action(Action::ReturnToMenu);
    assert_eq!(session.state(), State::Menu);

    // Ticks are inert on the menu.
    let level = session.level();
    session.tick(10.0);
    assert_eq!(session.state(), State::Menu);

    session.handle_action(Action::Start);
    assert_eq!(session.state(), State::Playing);
    assert_eq!(session.level(), level);
    assert_eq!(session.score(), 0);
}

#[test]
fn high_score_survives_in_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SaveStore::new(dir.path().join("savegame.txt"), dir.path().join("highscore.txt"));
    assert_eq!(store.load_high_score(), 0);
    store.save_high_score(230).unwrap();
    assert_eq!(store.load_high_score(), 230);
}

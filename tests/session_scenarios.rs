// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! End-to-end scenarios driving a whole session.

use vidink::io::{FileStore, KeyValueStore, MemoryStore};
use vidink::models::{Color, Point, SessionSettings, SurfaceTag, Tool};
use vidink::{
    EngineConfig, ManualScheduler, PlayerState, ScriptedPlayer, Session, StrokeOutcome,
    VideoPlayer,
};

fn session() -> Session<ManualScheduler> {
    Session::new(
        EngineConfig::default(),
        SessionSettings::default(),
        (160, 90),
        (320, 240),
        ManualScheduler::new(),
    )
}

fn stroke(s: &mut Session<ManualScheduler>, from: Point, to: Point, now: u64) -> StrokeOutcome {
    s.pointer_down(from, now);
    s.pointer_move(to, now + 8);
    s.pointer_up(to, now + 16)
}

/// Run every due task up to `now`, like a host event loop would.
fn run_tasks(s: &mut Session<ManualScheduler>, now: u64, player: Option<&dyn VideoPlayer>) -> bool {
    let due = s.scheduler_mut().due(now);
    let mut repainted = false;
    for handle in due {
        repainted |= s.on_task(handle, now, player);
    }
    repainted
}

#[test]
fn test_rectangle_scenario() {
    let mut s = session();
    s.set_tool(Tool::Rectangle);
    s.set_color(Color::from_hex("#ff0000").unwrap());
    s.set_brush_width(2.0);

    s.pointer_down(Point::new(10.0, 10.0), 0);
    s.pointer_move(Point::new(25.0, 18.0), 10);
    s.pointer_move(Point::new(50.0, 30.0), 20);
    let outcome = s.pointer_up(Point::new(50.0, 30.0), 30);

    assert_eq!(outcome, StrokeOutcome::Committed(SurfaceTag::Video));
    let video = s.compositor().video();
    for (x, y) in [(10, 10), (50, 10), (50, 30), (10, 30)] {
        assert_eq!(video.persistent.pixel(x, y), Some(Color::rgb(255, 0, 0)));
    }
    assert!(video.overlay.is_blank());
}

#[test]
fn test_timestamp_scenario() {
    let mut s = session();
    let mut player = ScriptedPlayer::at(12.4);

    stroke(&mut s, Point::new(5.0, 5.0), Point::new(40.0, 5.0), 0);
    let first = s.save_timestamp(Some(&player)).unwrap();

    // Within a second: the same entry, new snapshot.
    stroke(&mut s, Point::new(5.0, 20.0), Point::new(40.0, 20.0), 100);
    player.seek_to(12.9);
    assert_eq!(s.save_timestamp(Some(&player)), Some(first));
    assert_eq!(s.timestamps().len(), 1);
    assert_eq!(s.timestamps().entries()[0].time, 12.4);

    s.clear_active();
    stroke(&mut s, Point::new(5.0, 60.0), Point::new(40.0, 60.0), 200);
    player.seek_to(20.0);
    let second = s.save_timestamp(Some(&player)).unwrap();
    assert_ne!(first, second);

    let times: Vec<f64> = s.timestamps().entries().iter().map(|e| e.time).collect();
    assert_eq!(times, vec![12.4, 20.0]);

    // Playback at 15s shows the 12.4s drawing (both scribbles), not the 20s one.
    s.on_player_state(PlayerState::Playing, 1_000);
    player.seek_to(15.0);
    assert!(run_tasks(&mut s, 1_250, Some(&player)));
    let video = &s.compositor().video().persistent;
    assert!(video.is_painted(20, 5));
    assert!(video.is_painted(20, 20));
    assert!(!video.is_painted(20, 60));

    // No repaint while the same entry stays active.
    player.advance(0.25);
    assert!(!run_tasks(&mut s, 1_500, Some(&player)));

    player.seek_to(21.0);
    assert!(run_tasks(&mut s, 1_750, Some(&player)));
    assert!(s.compositor().video().persistent.is_painted(20, 60));

    s.on_player_state(PlayerState::Paused, 2_000);
    assert_eq!(s.scheduler().active_count(), 0);
}

#[test]
fn test_laser_fades_away() {
    let mut s = session();
    s.set_tool(Tool::Laser);
    let outcome = stroke(&mut s, Point::new(10.0, 40.0), Point::new(100.0, 40.0), 0);
    assert!(matches!(outcome, StrokeOutcome::Transient { .. }));
    assert!(s.fade().is_running());

    let overlay_alpha = |s: &Session<ManualScheduler>| {
        s.compositor().video().overlay.pixel(50, 40).map_or(0, |c| c.a)
    };
    let full = overlay_alpha(&s);
    assert!(full > 0);
    assert!(s.compositor().video().persistent.is_blank());

    // Still in the hold period.
    run_tasks(&mut s, 400, None);
    assert_eq!(overlay_alpha(&s), full);

    // Fading: stroke ended at 16, fade starts at 516.
    run_tasks(&mut s, 1_516, None);
    let mid = overlay_alpha(&s);
    assert!(mid > 0 && mid < full);

    run_tasks(&mut s, 2_600, None);
    assert!(overlay_alpha(&s) < mid);

    run_tasks(&mut s, 3_000, None);
    assert!(s.fade().is_empty());
    assert!(!s.fade().is_running());
    assert!(s.compositor().video().overlay.is_blank());
    assert!(s.compositor().video().persistent.is_blank());
}

#[test]
fn test_notebook_grows_once_per_check() {
    let mut s = session();
    s.set_notebook_mode(true);
    assert_eq!(s.notebook().dimensions(), (320, 240));

    // Viewport bottom at 200, within 100px of 240.
    s.scroll_notebook(0.0, 60.0, 320, 140);
    assert_eq!(s.notebook().dimensions(), (320, 480));
    s.scroll_notebook(0.0, 60.0, 320, 140);
    assert_eq!(s.notebook().dimensions(), (320, 480));

    // Horizontal growth is off by default.
    s.scroll_notebook(300.0, 0.0, 320, 100);
    assert_eq!(s.notebook().dimensions().0, 320);

    s.set_notebook_layout(100.0, 100.0, true);
    s.scroll_notebook(300.0, 0.0, 320, 100);
    assert_eq!(s.notebook().dimensions(), (640, 480));
}

#[test]
fn test_session_round_trip_through_store() {
    let mut s = session();
    let player = ScriptedPlayer::at(3.0);
    s.set_video_url("https://videos.example/lecture");
    stroke(&mut s, Point::new(5.0, 5.0), Point::new(60.0, 30.0), 0);
    let id = s.save_timestamp(Some(&player)).unwrap();

    s.set_notebook_mode(true);
    s.set_color(Color::rgb(0, 0, 255));
    stroke(&mut s, Point::new(10.0, 10.0), Point::new(200.0, 10.0), 50);
    s.scroll_notebook(0.0, 100.0, 320, 140);
    s.place_document_page(40, 20, vec![255; 40 * 20 * 4], 2, Point::new(30.0, 300.0))
        .unwrap();
    s.set_font(24, "Georgia");

    let mut store = MemoryStore::new();
    assert!(s.save_to(&mut store));
    assert!(s.last_saved().is_some());

    let mut restored = session();
    assert!(restored.load_from(&store));

    assert_eq!(restored.video_url(), Some("https://videos.example/lecture"));
    assert_eq!(restored.settings(), s.settings());
    assert_eq!(restored.timestamps().len(), 1);
    let (a, b) = (&s.timestamps().entries()[0], &restored.timestamps().entries()[0]);
    assert_eq!(b.id, id);
    assert_eq!(b.time, a.time);
    assert_eq!(b.snapshot, a.snapshot);

    assert_eq!(restored.notebook().dimensions(), s.notebook().dimensions());
    assert_eq!(
        restored.notebook().content().image(),
        s.notebook().content().image()
    );
    assert_eq!(
        restored.compositor().video().persistent.image(),
        s.compositor().video().persistent.image()
    );
    let media = restored.notebook().media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].page_number, Some(2));
    assert_eq!((media[0].x, media[0].y), (30.0, 300.0));
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session();
    stroke(&mut s, Point::new(1.0, 1.0), Point::new(9.0, 9.0), 0);
    s.save_timestamp(Some(&ScriptedPlayer::at(65.0)));

    let mut store = FileStore::new(dir.path());
    assert!(s.save_to(&mut store));
    let blob = store.get("vidink-session").unwrap().unwrap();
    assert!(blob.contains("\"timeFormatted\":\"1:05\""));

    let mut restored = session();
    assert!(restored.load_from(&store));
    assert_eq!(restored.timestamps().entries()[0].time, 65.0);
}

#[test]
fn test_corrupt_image_aborts_load() {
    let mut s = session();
    stroke(&mut s, Point::new(1.0, 1.0), Point::new(9.0, 9.0), 0);
    s.save_timestamp(Some(&ScriptedPlayer::at(1.0)));

    let mut store = MemoryStore::new();
    store
        .set(
            "vidink-session",
            r#"{"brushSize": 12, "mainCanvasData": "data:image/png;base64,AAAA"}"#,
        )
        .unwrap();
    assert!(!s.load_from(&store));
    assert_eq!(s.settings().brush_width, 3.0);
    assert_eq!(s.timestamps().len(), 1);
    assert!(!s.compositor().video().persistent.is_blank());
}

use lrcsync_core::{
    LrcFile, LrcFormat, LyricCursor, LyricMatcher, LyricsStatus, PlaybackState,
    PlayerObservation, PositionTracker, SyncEngine, TrackId, TrackerEvent,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

const SONG_A: &str = "\
[00:00.50]<00:00.50>one <00:01.00>two <00:01.50>three <00:02.00>
[00:02.50]<00:02.50>four <00:03.20>five <00:04.00>
[00:04.50]<00:04.50>six <00:06.00>
[00:08.00]<00:08.00>seven <00:09.00>eight <00:10.00>
";

const SONG_B: &str = "\
[00:00.20]first line here
[00:01.50]second
[00:03.00]
";

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn track(title: &str) -> TrackId {
    TrackId::new(None, Some("X".into()), Some(title.into()))
}

/// Ground truth: which track plays at wall time `t` (ms) and where.
///
/// Plays A, pauses at 3 s for one second, resumes, seeks from 5 s to 8 s at
/// wall time 6 s, then switches to B at wall time 8 s.
fn truth(t: u64) -> (TrackId, Duration, bool) {
    match t {
        0..=2_999 => (track("A"), ms(t), true),
        3_000..=3_999 => (track("A"), ms(3_000), false),
        4_000..=5_999 => (track("A"), ms(3_000 + (t - 4_000)), true),
        6_000..=7_999 => (track("A"), ms(8_000 + (t - 6_000)), true),
        _ => (track("B"), ms(t - 8_000), true),
    }
}

/// Brute-force reference: scan every line and word for one containing `position`.
fn linear_scan(lyrics: &LrcFile, position: Duration) -> LyricCursor {
    for (i, line) in lyrics.lines.iter().enumerate() {
        if line.start_time <= position && position < line.end_time {
            let word = line
                .words
                .iter()
                .position(|w| w.start_time <= position && position < w.end_time);
            return LyricCursor {
                line: Some(i),
                word,
            };
        }
    }
    LyricCursor::IDLE
}

fn write_songs(dir: &Path) {
    fs::write(dir.join("X - A.wlrc"), SONG_A).unwrap();
    fs::write(dir.join("X - B.wlrc"), SONG_B).unwrap();
}

#[tokio::test]
async fn test_cursor_matches_linear_scan_through_pause_seek_and_track_change() {
    let dir = tempfile::tempdir().unwrap();
    write_songs(dir.path());

    let mut engine = SyncEngine::new(
        PositionTracker::default(),
        LyricMatcher::new(dir.path(), LrcFormat::Word),
    );
    let t0 = Instant::now();
    let mut events = Vec::new();
    let mut visited = HashSet::new();

    for t in (0..=11_000_u64).step_by(10) {
        let (id, position, playing) = truth(t);
        let now = t0 + ms(t);

        if t % 50 == 0 {
            let sample = PlaybackState::new(id.clone(), position, playing, now);
            events.extend(engine.apply(&PlayerObservation::Playing(sample)).await);
        }

        assert_eq!(engine.status(), LyricsStatus::Loaded, "t={t}");
        assert_eq!(engine.tracker().track(), Some(&id), "t={t}");
        assert_eq!(engine.position(now), Some(position), "t={t}");

        let lyrics = engine.lyrics().unwrap();
        let cursor = engine.cursor(now);
        assert_eq!(cursor, linear_scan(lyrics, position), "t={t}");
        visited.insert((id.title.clone(), cursor));
    }

    assert!(matches!(events[0], TrackerEvent::TrackChanged { .. }));
    assert!(events.contains(&TrackerEvent::Paused { position: ms(3_000) }));
    assert!(events.contains(&TrackerEvent::Resumed { position: ms(3_000) }));
    assert!(events.contains(&TrackerEvent::Seeked {
        from: ms(5_000),
        to: ms(8_000)
    }));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, TrackerEvent::TrackChanged { .. }))
            .count(),
        2
    );

    let a = Some("A".to_string());
    let b = Some("B".to_string());
    // Last line of A is only reachable through the seek
    assert!(visited.contains(&(a.clone(), LyricCursor { line: Some(3), word: Some(1) })));
    assert!(visited.contains(&(a, LyricCursor::IDLE)));
    // B is phrase-level on disk and gets even word timing on load
    assert!(visited.contains(&(b.clone(), LyricCursor { line: Some(0), word: Some(2) })));
    assert!(visited.contains(&(b, LyricCursor { line: Some(1), word: Some(0) })));
}

#[tokio::test]
async fn test_cursor_holds_while_player_is_lost() {
    let dir = tempfile::tempdir().unwrap();
    write_songs(dir.path());

    let mut engine = SyncEngine::new(
        PositionTracker::default(),
        LyricMatcher::new(dir.path(), LrcFormat::Word),
    );
    let t0 = Instant::now();
    engine
        .apply(&PlayerObservation::Playing(PlaybackState::new(
            track("A"),
            ms(1_200),
            true,
            t0,
        )))
        .await;
    let events = engine
        .apply(&PlayerObservation::Unreachable {
            observed_at: t0 + ms(100),
        })
        .await;
    assert_eq!(events, vec![TrackerEvent::PlayerLost]);

    let frozen = engine.cursor(t0 + ms(100));
    assert_eq!(frozen, LyricCursor { line: Some(0), word: Some(1) });
    assert_eq!(engine.cursor(t0 + ms(5_000)), frozen);
    assert_eq!(engine.status(), LyricsStatus::Loaded);
}

#[tokio::test]
async fn test_unmatched_track_is_idle_until_next_change() {
    let dir = tempfile::tempdir().unwrap();
    write_songs(dir.path());

    let mut engine = SyncEngine::new(
        PositionTracker::default(),
        LyricMatcher::new(dir.path(), LrcFormat::Word),
    );
    let t0 = Instant::now();
    engine
        .apply(&PlayerObservation::Playing(PlaybackState::new(
            track("Unknown"),
            ms(1_000),
            true,
            t0,
        )))
        .await;
    assert_eq!(engine.status(), LyricsStatus::NotFound);
    assert!(engine.cursor(t0 + ms(50)).is_idle());

    engine
        .apply(&PlayerObservation::Playing(PlaybackState::new(
            track("A"),
            ms(1_000),
            true,
            t0 + ms(100),
        )))
        .await;
    assert_eq!(engine.status(), LyricsStatus::Loaded);
    assert_eq!(
        engine.cursor(t0 + ms(100)),
        LyricCursor { line: Some(0), word: Some(1) }
    );
}

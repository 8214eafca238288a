//! Replaying a recorded feed through the service
use skytrail::AircraftTracker;
use skytrail::config::TrackerConfig;
use skytrail::feed_client::{FeedSource, ReplayFeed};
use skytrail::metadata::JsonFileMetadata;
use skytrail::service::TrackerService;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

fn recording() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..12 {
        let now = 1_700_000_000.0 + i as f64;
        let lat = 50.0 + i as f64 * 0.009;
        let alt = if i < 6 { 5000 } else { 7000 };
        writeln!(
            file,
            r#"{{"now": {now}, "messages": {msgs}, "aircraft": [{{"hex": "3C6DD4", "type": "adsb_icao", "flight": "DLH4AB  ", "lat": {lat}, "lon": 10.0, "seen": 0.1, "seen_pos": 0.1, "alt_baro": {alt}, "track": 0.0}}]}}"#,
            msgs = 1000 + i * 50,
        )
        .unwrap();
        if i == 3 {
            writeln!(file, "not json").unwrap();
        }
    }
    file
}

#[tokio::test]
async fn test_replay_builds_trail_and_applies_metadata() {
    let file = recording();
    let feed = ReplayFeed::from_file(file.path()).await.unwrap();
    assert!(!feed.is_live());

    let tracker = Arc::new(Mutex::new(AircraftTracker::new(TrackerConfig::default())));
    let metadata =
        JsonFileMetadata::from_json(r#"{"3C6DD4": {"r": "D-AIBL", "t": "A319", "wtc": "M"}}"#)
            .unwrap();
    let service = TrackerService::new(
        Arc::clone(&tracker),
        Box::new(feed),
        Arc::new(metadata),
        Duration::ZERO,
    );

    service.run(CancellationToken::new()).await.unwrap();

    let tracker = tracker.lock().await;
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.messages(), Some(1550));

    let aircraft = tracker.get("3c6dd4").unwrap();
    assert_eq!(aircraft.name, "DLH4AB");
    assert_eq!(aircraft.registration.as_deref(), Some("D-AIBL"));
    assert_eq!(aircraft.wtc.as_deref(), Some("M"));
    // one split for the climb from the 5000 to the 7000 ft bucket
    assert_eq!(aircraft.track_history().len(), 2);
}

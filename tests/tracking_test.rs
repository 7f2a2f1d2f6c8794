use image::RgbImage;
use traffic_tally::{
    ByteTracker, Detection, DetectionLog, DetectionOracle, Frame, LogDetector, TallyEngine,
    TrackerConfig, TrackingOracle,
};

#[test]
fn test_basic_tracking() {
    let mut tracker = ByteTracker::new(TrackerConfig::default());

    // First frame: tracks born here are confirmed immediately.
    let tracks1 = tracker.update(vec![Detection::new(100.0, 100.0, 200.0, 200.0, 0.9, 2)]);
    assert_eq!(tracks1.len(), 1);
    let id1 = tracks1[0].track_id;
    assert_eq!(id1, 1);

    // Same object moved slightly
    let tracks2 = tracker.update(vec![Detection::new(105.0, 105.0, 205.0, 205.0, 0.9, 2)]);
    assert_eq!(tracks2.len(), 1);
    assert_eq!(tracks2[0].track_id, id1);

    // Occluded: low score, recovered by the second association
    let tracks3 = tracker.update(vec![Detection::new(110.0, 110.0, 210.0, 210.0, 0.2, 2)]);
    assert_eq!(tracks3.len(), 1);
    assert_eq!(tracks3[0].track_id, id1);

    // Gone
    let tracks4 = tracker.update(vec![]);
    assert!(tracks4.is_empty());

    // Back within the track buffer: same identity
    let tracks5 = tracker.update(vec![Detection::new(115.0, 115.0, 215.0, 215.0, 0.9, 2)]);
    assert_eq!(tracks5.len(), 1);
    assert_eq!(tracks5[0].track_id, id1);
}

#[test]
fn test_two_objects_keep_distinct_ids() {
    let mut tracker = ByteTracker::new(TrackerConfig::default());
    let frame = |dx: f32| {
        vec![
            Detection::new(10.0 + dx, 300.0, 60.0 + dx, 350.0, 0.9, 2),
            Detection::new(400.0 - dx, 300.0, 440.0 - dx, 380.0, 0.8, 0),
        ]
    };

    let first = tracker.update(frame(0.0));
    assert_eq!(first.len(), 2);
    let mut ids: Vec<u64> = first.iter().map(|t| t.track_id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2]);

    for step in 1..6 {
        let tracks = tracker.update(frame(step as f32 * 3.0));
        assert_eq!(tracks.len(), 2);
        for track in tracks {
            let expected = if track.class_id == 2 { first[0].track_id } else { first[1].track_id };
            assert_eq!(track.track_id, expected);
        }
    }
}

/// Raw detections of one car, replayed through ByteTrack and the tally engine,
/// count as a single vehicle.
#[test]
fn test_tracked_log_counts_once() {
    let lines: String = (0..6)
        .map(|i| {
            format!(
                "{{\"frame\": {}, \"detections\": [{{\"class_id\": 2, \"confidence\": 0.85, \"bbox\": [{}, 420, 60, 40]}}]}}\n",
                i * 5,
                200 + i * 4
            )
        })
        .collect();
    let log = DetectionLog::from_reader(lines.as_bytes()).unwrap();
    let mut oracle = TrackingOracle::with_default_config(LogDetector::new(log));
    let mut engine = TallyEngine::default();

    for i in 0..6 {
        let frame = Frame::new(i * 5, RgbImage::new(4, 4));
        for det in oracle.detect_and_track(&frame).unwrap() {
            engine.process(&det, 600);
        }
    }
    assert_eq!(engine.count(2), 1);
    assert_eq!(engine.summary().vehicles, 1);
}

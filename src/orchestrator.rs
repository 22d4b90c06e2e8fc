// src/orchestrator.rs
//
// Multi-stream orchestration: one task per configured stream, each with its
// own source, detector, track history, strategy, and scheduler. Streams share
// no mutable state; a failing stream never takes the others down.

use crate::stream::{build_controller, StreamStats};
use crate::types::Config;
use anyhow::Result;
use tracing::{error, info};

pub struct StreamOutcome {
    pub name: String,
    pub result: Result<StreamStats>,
}

pub fn any_failed(outcomes: &[StreamOutcome]) -> bool {
    outcomes.iter().any(|o| o.result.is_err())
}

/// Run every configured stream to completion and collect per-stream outcomes
/// in config order. Startup failures (missing replay, bad region file) are
/// reported as that stream's outcome, same as mid-run failures.
pub async fn run_streams(config: &Config) -> Vec<StreamOutcome> {
    info!("Starting {} stream(s)", config.streams.len());

    // Spawn everything before awaiting anything, so streams run concurrently
    let mut handles = Vec::with_capacity(config.streams.len());
    for stream in &config.streams {
        let name = stream.name.clone();
        match build_controller(stream, config) {
            Ok(controller) => handles.push((name, Ok(tokio::spawn(controller.run())))),
            Err(e) => {
                error!("Stream '{}' failed to start: {:#}", name, e);
                handles.push((name, Err(e)));
            }
        }
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let result = match handle {
            Ok(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("Stream task panicked: {}", e)),
            },
            Err(startup_err) => Err(startup_err),
        };
        outcomes.push(StreamOutcome { name, result });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        LoggingConfig, OccupancyMode, OutputConfig, PublishConfig, SnapshotConfig, StreamConfig,
        TrackingConfig,
    };
    use std::fs;
    use std::path::PathBuf;

    fn write_replay(name: &str, lines: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orch-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn stream(name: &str, source: &str) -> StreamConfig {
        StreamConfig {
            name: name.to_string(),
            parking: "lot".to_string(),
            source: source.to_string(),
            regions: None,
            mode: OccupancyMode::PointCount,
            total_spaces: Some(10),
            fps: 30.0,
            overlap_buffer: 5.0,
            frame_width: 1920.0,
            frame_height: 1080.0,
        }
    }

    fn config(streams: Vec<StreamConfig>) -> Config {
        Config {
            tracking: TrackingConfig {
                history_cap: 30,
                stationary_threshold: 5.0,
                classes: Vec::new(),
            },
            snapshot: SnapshotConfig {
                interval_seconds: 5.0,
            },
            publish: PublishConfig {
                enabled: false,
                endpoint: String::new(),
                timeout_secs: 10,
            },
            output: OutputConfig {
                dir: String::new(),
                save_frames: false,
                exist_ok: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            streams,
        }
    }

    #[tokio::test]
    async fn test_streams_run_independently() {
        let car = r#"{"frame": 1, "detections": [{"bbox": [90, 90, 110, 110], "track_id": 1, "label": "car"}]}"#;
        let car2 = r#"{"frame": 2, "detections": [{"bbox": [90, 90, 110, 110], "track_id": 1, "label": "car"}]}"#;
        let a = write_replay("a.jsonl", &[car, car2]);
        let b = write_replay("b.jsonl", &[r#"{"frame": 1}"#]);

        let config = config(vec![
            stream("area_a", a.to_str().unwrap()),
            stream("area_b", b.to_str().unwrap()),
        ]);
        let outcomes = run_streams(&config).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].name, "area_a");
        let stats_a = outcomes[0].result.as_ref().unwrap();
        assert_eq!(stats_a.frames, 2);
        assert_eq!(stats_a.last_occupancy.as_ref().unwrap().occupied, 1);

        // Stream b saw no detections — its counters are untouched by a's
        let stats_b = outcomes[1].result.as_ref().unwrap();
        assert_eq!(stats_b.frames, 1);
        assert_eq!(stats_b.last_occupancy.as_ref().unwrap().occupied, 0);
        assert!(!any_failed(&outcomes));
    }

    #[tokio::test]
    async fn test_one_failing_stream_does_not_stop_the_other() {
        let good = write_replay("good.jsonl", &[r#"{"frame": 1}"#]);
        let config = config(vec![
            stream("broken", "/nonexistent/feed.jsonl"),
            stream("healthy", good.to_str().unwrap()),
        ]);
        let outcomes = run_streams(&config).await;

        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().unwrap().frames, 1);
        assert!(any_failed(&outcomes));
    }
}

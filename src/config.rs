// src/config.rs

use crate::types::{Config, OccupancyMode};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.streams.is_empty() {
            bail!("Config defines no streams");
        }
        if self.tracking.history_cap < 2 {
            bail!(
                "tracking.history_cap must be at least 2 (got {})",
                self.tracking.history_cap
            );
        }
        if self.snapshot.interval_seconds <= 0.0 {
            bail!("snapshot.interval_seconds must be positive");
        }
        for stream in &self.streams {
            if stream.fps <= 0.0 {
                bail!("Stream '{}': fps must be positive", stream.name);
            }
            match stream.mode {
                OccupancyMode::PointCount => {
                    if stream.total_spaces.is_none() {
                        bail!(
                            "Stream '{}': total_spaces is required in point_count mode",
                            stream.name
                        );
                    }
                }
                OccupancyMode::SpaceOverlap => {
                    if stream.regions.is_none() {
                        bail!(
                            "Stream '{}': a space definition file is required in space_overlap mode",
                            stream.name
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Startup check for a stream's input files. Failing here is fatal for that
/// stream only, before its frame loop begins.
pub fn check_stream_inputs(source: &str, regions: Option<&str>) -> Result<()> {
    if !Path::new(source).exists() {
        bail!("Source path '{}' does not exist", source);
    }
    if let Some(regions) = regions {
        if !Path::new(regions).exists() {
            bail!("Region definition file '{}' does not exist", regions);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_yaml() -> String {
        r#"
tracking:
  history_cap: 30
  stationary_threshold: 5.0
snapshot:
  interval_seconds: 5.0
publish:
  enabled: false
  endpoint: "http://localhost:3000/api"
  timeout_secs: 10
output:
  dir: "./output"
  save_frames: true
  exist_ok: true
logging:
  level: "info"
streams:
  - name: "first_parking_01"
    parking: "first_parking"
    source: "./detections/first_parking_01.jsonl"
    mode: point_count
    total_spaces: 200
    fps: 29.0
    frame_width: 1920.0
    frame_height: 1080.0
"#
        .to_string()
    }

    #[test]
    fn test_parse_and_validate() {
        let config: Config = serde_yaml::from_str(&base_yaml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.streams.len(), 1);
        assert_eq!(config.streams[0].mode, OccupancyMode::PointCount);
        assert_eq!(config.streams[0].overlap_buffer, 5.0);
    }

    #[test]
    fn test_point_count_requires_total_spaces() {
        let yaml = base_yaml().replace("    total_spaces: 200\n", "");
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_space_overlap_requires_definition_file() {
        let yaml = base_yaml().replace("mode: point_count", "mode: space_overlap");
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_source_is_stream_fatal() {
        let err = check_stream_inputs("/nonexistent/feed.jsonl", None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}

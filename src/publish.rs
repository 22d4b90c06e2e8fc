// src/publish.rs
//
// Occupancy publishing to the remote store. Fire-and-forget from the frame
// loop's perspective: a failed publish is logged and skipped, never fatal.
// The payload mirrors the remote occupancy document (total/occupied/available
// per parking area) plus an optional base64 snapshot blob.

use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::occupancy::FrameOccupancy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyReport {
    /// Unique id for correlation with the remote store.
    pub report_id: String,
    pub parking: String,
    pub area: String,
    pub frame_id: u64,
    /// RFC 3339 capture time.
    pub captured_at: String,
    pub total_spaces: u32,
    pub occupied_spaces: u32,
    pub available_spaces: u32,
    pub busiest_region: Option<String>,
    pub quietest_region: Option<String>,
    /// Reserved: the upstream system no longer derives a concrete empty-space
    /// assignment, so this is always absent.
    pub assigned_space: Option<String>,
    /// Base64-encoded snapshot image, when one was available this interval.
    pub image_base64: Option<String>,
}

pub struct Publisher {
    http_client: reqwest::Client,
    endpoint: String,
}

impl Publisher {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn build_report(
        parking: &str,
        area: &str,
        frame_id: u64,
        occupancy: &FrameOccupancy,
        image: Option<&[u8]>,
    ) -> OccupancyReport {
        OccupancyReport {
            report_id: uuid::Uuid::new_v4().to_string(),
            parking: parking.to_string(),
            area: area.to_string(),
            frame_id,
            captured_at: chrono::Utc::now().to_rfc3339(),
            total_spaces: occupancy.total,
            occupied_spaces: occupancy.occupied,
            available_spaces: occupancy.available,
            busiest_region: occupancy.busiest.clone(),
            quietest_region: occupancy.quietest.clone(),
            assigned_space: None,
            image_base64: image
                .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }

    /// POST one report. Blocks this stream's frame loop until the server
    /// responds or the timeout elapses; there is no publish queue.
    pub async fn publish(&self, report: &OccupancyReport) -> Result<()> {
        let url = format!(
            "{}/occupancy/{}/{}",
            self.endpoint.trim_end_matches('/'),
            report.parking,
            report.area
        );
        debug!(
            "Publishing report {} to {} (occupied {}/{})",
            report.report_id, url, report.occupied_spaces, report.total_spaces
        );

        let response = self
            .http_client
            .post(&url)
            .json(report)
            .send()
            .await
            .with_context(|| format!("Publish request to '{}' failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            anyhow::bail!("Publish sink returned {}: {}", status, body);
        }

        info!(
            "Published occupancy for {}/{} at frame {}: occupied={}, available={}",
            report.parking, report.area, report.frame_id, report.occupied_spaces,
            report.available_spaces
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupancy() -> FrameOccupancy {
        FrameOccupancy {
            total: 200,
            occupied: 73,
            available: 127,
            busiest: Some("north".to_string()),
            quietest: Some("south".to_string()),
            changed_spaces: Vec::new(),
        }
    }

    #[test]
    fn test_report_carries_occupancy_numbers() {
        let report =
            Publisher::build_report("first_parking", "first_parking_01", 145, &occupancy(), None);
        assert_eq!(report.total_spaces, 200);
        assert_eq!(report.occupied_spaces, 73);
        assert_eq!(report.available_spaces, 127);
        assert_eq!(report.busiest_region.as_deref(), Some("north"));
        assert!(report.image_base64.is_none());
        assert!(
            report.assigned_space.is_none(),
            "space assignment is permanently absent"
        );
    }

    #[test]
    fn test_report_encodes_image_blob() {
        let report = Publisher::build_report("p", "a", 1, &occupancy(), Some(b"jpegbytes"));
        let encoded = report.image_base64.unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"jpegbytes");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = Publisher::build_report("p", "a", 1, &occupancy(), None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["parking"], "p");
        assert_eq!(json["occupied_spaces"], 73);
        assert!(json["assigned_space"].is_null());
    }
}

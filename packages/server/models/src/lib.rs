#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the raid map server.
//!
//! The report records themselves are served as-is from
//! [`raid_map_report_models::PipelineRun`]; these types cover the
//! remaining endpoints.

use chrono::NaiveDate;
use raid_map_report_models::PipelineRun;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Summary of a refresh, returned by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRefresh {
    /// Number of records in the new run.
    pub count: usize,
    /// Number of records that resolved to coordinates.
    pub located: usize,
    /// Run date, absent for an empty run.
    pub date: Option<NaiveDate>,
    /// The board could not be fetched and the previous run is still
    /// being served.
    #[serde(default)]
    pub stale: bool,
}

impl From<&PipelineRun> for ApiRefresh {
    fn from(run: &PipelineRun) -> Self {
        Self {
            count: run.len(),
            located: run.located_count(),
            date: run.date(),
            stale: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use raid_map_report_models::GeoResult;

    use super::*;

    #[test]
    fn summarizes_run() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let run = PipelineRun::new(vec![
            GeoResult {
                id: 0,
                lat: Some(1.0),
                lon: Some(2.0),
                city: None,
                date,
            },
            GeoResult {
                id: 1,
                lat: None,
                lon: None,
                city: Some("Austin".to_string()),
                date,
            },
        ]);
        let summary = ApiRefresh::from(&run);
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({
                "count": 2,
                "located": 1,
                "date": "2025-06-14",
                "stale": false
            })
        );
    }

    #[test]
    fn empty_run_has_null_date() {
        let summary = ApiRefresh::from(&PipelineRun::empty());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.date, None);
    }
}

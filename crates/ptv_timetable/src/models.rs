//! Timetable API response models
//!
//! Typed representations of stops, lines, departures and disruptions as
//! returned by the PTV Timetable API (v2).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::requests::{DisruptionMode, TransportType};

/// Response of the health check operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckResponse {
    #[serde(rename = "securityTokenOK")]
    pub security_token_ok: bool,
    #[serde(rename = "clientClockOK")]
    pub client_clock_ok: bool,
    #[serde(rename = "memcacheOK")]
    pub memcache_ok: bool,
    #[serde(rename = "databaseOK")]
    pub database_ok: bool,
}

impl HealthCheckResponse {
    /// All checks passed
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.security_token_ok && self.client_clock_ok && self.memcache_ok && self.database_ok
    }
}

/// A stop (station, tram stop, bus stop)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub stop_id: u32,
    pub location_name: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub transport_type: String,
    #[serde(default)]
    pub route_type: Option<i64>,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the queried point, for location-based queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Stop {
    /// Transport mode of the stop, when known
    #[must_use]
    pub fn mode(&self) -> Option<TransportType> {
        self.route_type.and_then(TransportType::from_id)
    }
}

/// A line (route)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Line {
    pub line_id: u32,
    pub line_name: String,
    #[serde(default)]
    pub line_number: String,
    #[serde(default)]
    pub line_name_short: Option<String>,
    #[serde(default)]
    pub line_number_long: Option<String>,
    #[serde(default)]
    pub transport_type: String,
    #[serde(default)]
    pub route_type: Option<i64>,
}

/// An entry of a search or nearby-stops result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "result", rename_all = "lowercase")]
pub enum SearchResult {
    Stop(Stop),
    Line(Line),
}

impl SearchResult {
    /// The stop, if this entry is one
    #[must_use]
    pub const fn as_stop(&self) -> Option<&Stop> {
        match self {
            Self::Stop(stop) => Some(stop),
            Self::Line(_) => None,
        }
    }

    /// The line, if this entry is one
    #[must_use]
    pub const fn as_line(&self) -> Option<&Line> {
        match self {
            Self::Line(line) => Some(line),
            Self::Stop(_) => None,
        }
    }
}

/// Response of the search operation
pub type SearchResponse = Vec<SearchResult>;

/// Response of the nearby stops operation
pub type StopsNearbyResponse = Vec<SearchResult>;

/// Response of the stops for line operation
pub type StopsForLineResponse = Vec<Stop>;

/// Response of the lines by mode operation
pub type LinesByModeResponse = Vec<Line>;

/// A point of interest (stop or ticket outlet)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointOfInterest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub transport_type: Option<String>,
    #[serde(default)]
    pub stop_id: Option<u32>,
    #[serde(default)]
    pub outlet_type: Option<String>,
}

/// Response of the points of interest operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointsOfInterestResponse {
    #[serde(default)]
    pub locations: Vec<PointOfInterest>,
    #[serde(default)]
    pub total_locations: u32,
}

/// Direction of travel on a line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Direction {
    #[serde(default)]
    pub linedir_id: u32,
    pub direction_id: u32,
    pub direction_name: String,
    pub line: Line,
}

/// Where a service departs from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Platform {
    #[serde(default)]
    pub realtime_id: u32,
    pub stop: Stop,
    pub direction: Direction,
}

/// A single trip of a service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Run {
    pub run_id: u32,
    #[serde(default)]
    pub transport_type: String,
    #[serde(default)]
    pub num_skipped: u32,
    #[serde(default)]
    pub destination_id: u32,
    #[serde(default)]
    pub destination_name: String,
}

/// A timetabled departure, with the realtime estimate when available
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Departure {
    pub platform: Platform,
    pub run: Run,
    pub time_timetable_utc: DateTime<Utc>,
    #[serde(default)]
    pub time_realtime_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flags: String,
}

impl Departure {
    /// Realtime estimate if present, timetabled time otherwise
    #[must_use]
    pub fn expected_utc(&self) -> DateTime<Utc> {
        self.time_realtime_utc.unwrap_or(self.time_timetable_utc)
    }

    /// Minutes behind the timetable, when a realtime estimate exists
    #[must_use]
    pub fn delay_minutes(&self) -> Option<i64> {
        self.time_realtime_utc
            .map(|realtime| (realtime - self.time_timetable_utc).num_minutes())
    }
}

/// Response of the next departures operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextDeparturesResponse {
    #[serde(default)]
    pub values: Vec<Departure>,
}

/// Response of the stopping pattern operation
pub type StoppingPatternResponse = NextDeparturesResponse;

/// A service disruption notice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Disruption {
    #[serde(rename = "disruption_id", default)]
    pub disruption_id: u64,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_on: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
}

/// Response of the disruptions operation, keyed by mode name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DisruptionsResponse {
    pub by_mode: BTreeMap<String, Vec<Disruption>>,
}

impl DisruptionsResponse {
    /// Disruptions reported for one mode
    #[must_use]
    pub fn for_mode(&self, mode: DisruptionMode) -> &[Disruption] {
        self.by_mode
            .get(mode.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of disruptions across all modes
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_mode.values().map(Vec::len).sum()
    }

    /// True when no mode reports a disruption
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_health_check() {
        let json = r#"{
            "securityTokenOK": true,
            "clientClockOK": true,
            "memcacheOK": true,
            "databaseOK": false
        }"#;
        let response: HealthCheckResponse = serde_json::from_str(json).unwrap();
        assert!(response.security_token_ok);
        assert!(!response.database_ok);
        assert!(!response.is_healthy());
    }

    #[test]
    fn test_parse_search_results() {
        let json = r#"[
            {
                "result": {
                    "suburb": "Melbourne City",
                    "transport_type": "train",
                    "route_type": 0,
                    "stop_id": 1071,
                    "location_name": "Flinders Street",
                    "lat": -37.8183,
                    "lon": 144.9671,
                    "distance": 0.0
                },
                "type": "stop"
            },
            {
                "result": {
                    "transport_type": "tram",
                    "route_type": 1,
                    "line_id": 1041,
                    "line_name": "East Coburg - South Melbourne Beach",
                    "line_number": "1"
                },
                "type": "line"
            }
        ]"#;

        let results: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(results.len(), 2);

        let stop = results[0].as_stop().unwrap();
        assert_eq!(stop.stop_id, 1071);
        assert_eq!(stop.location_name, "Flinders Street");
        assert_eq!(stop.mode(), Some(TransportType::Train));

        let line = results[1].as_line().unwrap();
        assert_eq!(line.line_id, 1041);
        assert_eq!(line.line_number, "1");
        assert!(results[1].as_stop().is_none());
    }

    #[test]
    fn test_parse_departures() {
        let json = r#"{
            "values": [{
                "platform": {
                    "realtime_id": 0,
                    "stop": {
                        "suburb": "Melbourne City",
                        "transport_type": "train",
                        "stop_id": 1071,
                        "location_name": "Flinders Street",
                        "lat": -37.8183,
                        "lon": 144.9671
                    },
                    "direction": {
                        "linedir_id": 38,
                        "direction_id": 5,
                        "direction_name": "South Morang",
                        "line": {
                            "transport_type": "train",
                            "line_id": 5,
                            "line_name": "South Morang",
                            "line_number": "250"
                        }
                    }
                },
                "run": {
                    "transport_type": "train",
                    "run_id": 15716,
                    "num_skipped": 0,
                    "destination_id": 1041,
                    "destination_name": "Clifton Hill"
                },
                "time_timetable_utc": "2014-08-15T06:18:00Z",
                "time_realtime_utc": "2014-08-15T06:21:00Z",
                "flags": "",
                "disruptions": ""
            }]
        }"#;

        let response: NextDeparturesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.values.len(), 1);

        let departure = &response.values[0];
        assert_eq!(departure.run.run_id, 15716);
        assert_eq!(departure.platform.direction.direction_name, "South Morang");
        assert_eq!(departure.delay_minutes(), Some(3));
        assert_eq!(
            departure.expected_utc(),
            departure.time_realtime_utc.unwrap()
        );
    }

    #[test]
    fn test_departure_without_realtime() {
        let json = r#"{
            "platform": {
                "stop": { "stop_id": 1, "location_name": "A", "lat": 0.0, "lon": 0.0 },
                "direction": {
                    "direction_id": 1,
                    "direction_name": "City",
                    "line": { "line_id": 2, "line_name": "B" }
                }
            },
            "run": { "run_id": 3 },
            "time_timetable_utc": "2014-08-15T06:18:00Z",
            "time_realtime_utc": null
        }"#;

        let departure: Departure = serde_json::from_str(json).unwrap();
        assert!(departure.delay_minutes().is_none());
        assert_eq!(departure.expected_utc(), departure.time_timetable_utc);
    }

    #[test]
    fn test_parse_disruptions() {
        let json = r#"{
            "general": [],
            "metro-train": [{
                "disruption_id": 52519,
                "title": "Buses replace trains",
                "url": "http://ptv.vic.gov.au/disruptions/52519",
                "description": "Buses replace trains between Clifton Hill and South Morang.",
                "publishedOn": "2014-08-12T01:06:00Z",
                "type": "Planned Works",
                "fromDate": "2014-08-15T10:30:00Z",
                "toDate": null
            }]
        }"#;

        let response: DisruptionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.len(), 1);
        assert!(!response.is_empty());
        assert!(response.for_mode(DisruptionMode::General).is_empty());
        assert!(response.for_mode(DisruptionMode::MetroBus).is_empty());

        let disruption = &response.for_mode(DisruptionMode::MetroTrain)[0];
        assert_eq!(disruption.disruption_id, 52519);
        assert_eq!(disruption.kind, "Planned Works");
        assert!(disruption.from_date.is_some());
        assert!(disruption.to_date.is_none());
    }

    #[test]
    fn test_parse_points_of_interest() {
        let json = r#"{
            "minLat": -37.9,
            "totalLocations": 2,
            "locations": [
                {
                    "outlet_type": "7-Eleven",
                    "business_name": "7-Eleven Southbank",
                    "suburb": "Southbank",
                    "lat": -37.82,
                    "lon": 144.96
                },
                {
                    "transport_type": "train",
                    "stop_id": 1071,
                    "location_name": "Flinders Street",
                    "lat": -37.8183,
                    "lon": 144.9671
                }
            ]
        }"#;

        let response: PointsOfInterestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_locations, 2);
        assert_eq!(
            response.locations[0].business_name.as_deref(),
            Some("7-Eleven Southbank")
        );
        assert_eq!(response.locations[1].stop_id, Some(1071));
    }

    #[test]
    fn test_parse_unknown_search_type_fails() {
        let json = r#"[{ "result": {}, "type": "myki-outlet" }]"#;
        assert!(serde_json::from_str::<SearchResponse>(json).is_err());
    }
}

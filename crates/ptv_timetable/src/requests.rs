//! Request descriptors
//!
//! One value type per timetable API operation. Each renders itself into the
//! request path and query string the API expects; signing happens later in
//! the dispatcher, so rendering depends only on the descriptor's own fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::models::{
    DisruptionsResponse, HealthCheckResponse, LinesByModeResponse, NextDeparturesResponse,
    PointsOfInterestResponse, SearchResponse, StopsForLineResponse, StopsNearbyResponse,
    StoppingPatternResponse,
};

mod sealed {
    pub trait Sealed {}
}

/// A typed timetable API operation
///
/// Implemented only by the descriptors in this module.
pub trait ApiRequest: sealed::Sealed + Send + Sync {
    /// Shape of the JSON response
    type Response: DeserializeOwned + Send;

    /// Request path and query, before `devid` and `signature` are appended
    fn request_path(&self) -> String;
}

/// Transport mode, as used in request paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    Train,
    Tram,
    Bus,
    VLine,
    NightRider,
}

impl TransportType {
    /// Numeric mode id used by the API
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Train => 0,
            Self::Tram => 1,
            Self::Bus => 2,
            Self::VLine => 3,
            Self::NightRider => 4,
        }
    }

    /// Look up a mode by its numeric id
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::Train),
            1 => Some(Self::Tram),
            2 => Some(Self::Bus),
            3 => Some(Self::VLine),
            4 => Some(Self::NightRider),
            _ => None,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Point of interest category for [`PointsOfInterestRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointOfInterestType {
    Train,
    Tram,
    Bus,
    VLine,
    NightRider,
    TicketOutlet,
}

impl PointOfInterestType {
    /// Numeric category id used by the API
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Train => 0,
            Self::Tram => 1,
            Self::Bus => 2,
            Self::VLine => 3,
            Self::NightRider => 4,
            Self::TicketOutlet => 100,
        }
    }
}

/// Disruption category for [`DisruptionsRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisruptionMode {
    General,
    MetroBus,
    MetroTrain,
    MetroTram,
    RegionalBus,
    RegionalCoach,
    RegionalTrain,
}

impl DisruptionMode {
    /// Every disruption mode, in API order
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::MetroBus,
        Self::MetroTrain,
        Self::MetroTram,
        Self::RegionalBus,
        Self::RegionalCoach,
        Self::RegionalTrain,
    ];

    /// Name used in request paths and as the response key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::MetroBus => "metro-bus",
            Self::MetroTrain => "metro-train",
            Self::MetroTram => "metro-tram",
            Self::RegionalBus => "regional-bus",
            Self::RegionalCoach => "regional-coach",
            Self::RegionalTrain => "regional-train",
        }
    }
}

impl fmt::Display for DisruptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckRequest {
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckRequest {
    /// Health check stamped with the current time
    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

impl sealed::Sealed for HealthCheckRequest {}

impl ApiRequest for HealthCheckRequest {
    type Response = HealthCheckResponse;

    fn request_path(&self) -> String {
        format!("/v2/healthcheck?timestamp={}", format_utc(&self.timestamp))
    }
}

/// Stops closest to a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopsNearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
}

impl sealed::Sealed for StopsNearbyRequest {}

impl ApiRequest for StopsNearbyRequest {
    type Response = StopsNearbyResponse;

    fn request_path(&self) -> String {
        format!(
            "/v2/nearme/latitude/{}/longitude/{}",
            self.latitude, self.longitude
        )
    }
}

/// Points of interest inside a bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct PointsOfInterestRequest {
    pub poi_types: Vec<PointOfInterestType>,
    /// `(latitude, longitude)` of the top left corner
    pub top_left: (f64, f64),
    /// `(latitude, longitude)` of the bottom right corner
    pub bottom_right: (f64, f64),
    pub grid_depth: u32,
    pub limit: u32,
}

impl sealed::Sealed for PointsOfInterestRequest {}

impl ApiRequest for PointsOfInterestRequest {
    type Response = PointsOfInterestResponse;

    fn request_path(&self) -> String {
        let types = join_csv(self.poi_types.iter().map(|t| t.id()));
        format!(
            "/v2/poi/{types}/lat1/{}/long1/{}/lat2/{}/long2/{}/griddepth/{}/limit/{}",
            self.top_left.0,
            self.top_left.1,
            self.bottom_right.0,
            self.bottom_right.1,
            self.grid_depth,
            self.limit
        )
    }
}

/// Free-text search over stops and lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
}

impl sealed::Sealed for SearchRequest {}

impl ApiRequest for SearchRequest {
    type Response = SearchResponse;

    fn request_path(&self) -> String {
        format!("/v2/search/{}", encode(&self.term))
    }
}

/// Next departures from a stop, for every line and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadNextDeparturesRequest {
    pub mode: TransportType,
    pub stop_id: u32,
    pub limit: u32,
}

impl sealed::Sealed for BroadNextDeparturesRequest {}

impl ApiRequest for BroadNextDeparturesRequest {
    type Response = NextDeparturesResponse;

    fn request_path(&self) -> String {
        format!(
            "/v2/mode/{}/stop/{}/departures/by-destination/limit/{}",
            self.mode, self.stop_id, self.limit
        )
    }
}

/// Lines of a transport mode, optionally filtered by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinesByModeRequest {
    pub mode: TransportType,
    pub name_filter: Option<String>,
}

impl sealed::Sealed for LinesByModeRequest {}

impl ApiRequest for LinesByModeRequest {
    type Response = LinesByModeResponse;

    fn request_path(&self) -> String {
        let mut path = format!("/v2/lines/mode/{}", self.mode);
        if let Some(name) = self.name_filter.as_deref().filter(|n| !n.is_empty()) {
            path.push_str(&format!("?name={}", encode(name)));
        }
        path
    }
}

/// Current disruptions for a set of modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisruptionsRequest {
    /// Modes to query; empty requests every mode
    pub modes: Vec<DisruptionMode>,
}

impl sealed::Sealed for DisruptionsRequest {}

impl ApiRequest for DisruptionsRequest {
    type Response = DisruptionsResponse;

    fn request_path(&self) -> String {
        let modes = if self.modes.is_empty() {
            join_csv(DisruptionMode::ALL.iter())
        } else {
            join_csv(self.modes.iter())
        };
        format!("/v2/disruptions/modes/{modes}")
    }
}

/// Next departures for one line, stop and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecificNextDeparturesRequest {
    pub mode: TransportType,
    pub line_id: u32,
    pub stop_id: u32,
    pub direction_id: u32,
    pub limit: u32,
    pub for_utc: Option<DateTime<Utc>>,
}

impl sealed::Sealed for SpecificNextDeparturesRequest {}

impl ApiRequest for SpecificNextDeparturesRequest {
    type Response = NextDeparturesResponse;

    fn request_path(&self) -> String {
        let mut path = format!(
            "/v2/mode/{}/line/{}/stop/{}/directionid/{}/departures/all/limit/{}",
            self.mode, self.line_id, self.stop_id, self.direction_id, self.limit
        );
        if let Some(for_utc) = &self.for_utc {
            path.push_str(&format!("?for_utc={}", format_utc(for_utc)));
        }
        path
    }
}

/// Every stop a run makes, from a given stop and time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoppingPatternRequest {
    pub mode: TransportType,
    pub run_id: u32,
    pub stop_id: u32,
    pub for_utc: DateTime<Utc>,
}

impl sealed::Sealed for StoppingPatternRequest {}

impl ApiRequest for StoppingPatternRequest {
    type Response = StoppingPatternResponse;

    fn request_path(&self) -> String {
        format!(
            "/v2/mode/{}/run/{}/stop/{}/stopping-pattern?for_utc={}",
            self.mode,
            self.run_id,
            self.stop_id,
            format_utc(&self.for_utc)
        )
    }
}

/// Stops served by a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopsForLineRequest {
    pub mode: TransportType,
    pub line_id: u32,
}

impl sealed::Sealed for StopsForLineRequest {}

impl ApiRequest for StopsForLineRequest {
    type Response = StopsForLineResponse;

    fn request_path(&self) -> String {
        format!(
            "/v2/mode/{}/line/{}/stops-for-line",
            self.mode, self.line_id
        )
    }
}

fn format_utc(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn join_csv<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(char::from(b));
            },
            _ => result.push_str(&format!("%{b:02X}")),
        }
    }
    result
}

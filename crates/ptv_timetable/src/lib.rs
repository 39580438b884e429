//! Client for the PTV Timetable API
//!
//! Provides stop lookup, next departures, stopping patterns, disruptions and
//! line maps for Public Transport Victoria via the
//! [PTV Timetable API](http://timetableapi.ptv.vic.gov.au).
//!
//! # Architecture
//!
//! Each API operation is a request descriptor implementing [`ApiRequest`],
//! which renders the request path and query. [`PtvTimetableClient::execute`]
//! appends the developer id, signs the result with HMAC-SHA1 (see
//! [`Credentials::sign_request_path`]), sends the GET and decodes the JSON
//! body into the descriptor's response type. [`TimetableService`] wraps each
//! operation in a single method.
//!
//! # Example
//!
//! ```rust,ignore
//! use ptv_timetable::{PtvConfig, PtvTimetableClient, TimetableService, TransportType};
//!
//! let config = PtvConfig::load()?;
//! let client = PtvTimetableClient::new(&config)?;
//!
//! let departures = client
//!     .broad_next_departures(TransportType::Train, 1071, 5) // Flinders Street
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod map;
mod models;
mod requests;
mod signer;

pub use client::{PtvTimetableClient, TimetableService};
pub use config::{LINE_ID_PLACEHOLDER, PtvConfig};
pub use error::{PtvError, TransportCause};
pub use map::ROUTE_MAP_ELEMENT_ID;
pub use models::{
    Departure, Direction, Disruption, DisruptionsResponse, HealthCheckResponse, Line,
    LinesByModeResponse, NextDeparturesResponse, Platform, PointOfInterest,
    PointsOfInterestResponse, Run, SearchResponse, SearchResult, Stop, StopsForLineResponse,
    StopsNearbyResponse, StoppingPatternResponse,
};
pub use requests::{
    ApiRequest, BroadNextDeparturesRequest, DisruptionMode, DisruptionsRequest,
    HealthCheckRequest, LinesByModeRequest, PointOfInterestType, PointsOfInterestRequest,
    SearchRequest, SpecificNextDeparturesRequest, StopsForLineRequest, StopsNearbyRequest,
    StoppingPatternRequest, TransportType,
};
pub use signer::{Credentials, sign};

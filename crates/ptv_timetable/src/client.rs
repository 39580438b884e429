//! PTV Timetable API client
//!
//! Every operation renders a request descriptor, signs it with the
//! configured credentials and issues a GET against the API origin. The line
//! map is the exception: it is scraped from the public line page and fetched
//! unsigned.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use tracing::{debug, instrument, warn};
use url::{Position, Url};

use crate::config::PtvConfig;
use crate::error::{PtvError, TransportCause};
use crate::map;
use crate::models::{
    DisruptionsResponse, HealthCheckResponse, LinesByModeResponse, NextDeparturesResponse,
    PointsOfInterestResponse, SearchResponse, StopsForLineResponse, StopsNearbyResponse,
    StoppingPatternResponse,
};
use crate::requests::{
    ApiRequest, BroadNextDeparturesRequest, DisruptionMode, DisruptionsRequest,
    HealthCheckRequest, LinesByModeRequest, PointOfInterestType, PointsOfInterestRequest,
    SearchRequest, SpecificNextDeparturesRequest, StopsForLineRequest, StopsNearbyRequest,
    StoppingPatternRequest, TransportType,
};
use crate::signer::Credentials;

/// Trait for timetable service clients
#[async_trait]
pub trait TimetableService: Send + Sync {
    /// Check API availability and that the credentials are accepted
    async fn health_check(&self) -> Result<HealthCheckResponse, PtvError>;

    /// Stops closest to a location
    async fn stops_nearby(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<StopsNearbyResponse, PtvError>;

    /// Points of interest inside a bounding box
    #[allow(clippy::too_many_arguments)]
    async fn points_of_interest(
        &self,
        poi_types: &[PointOfInterestType],
        top_left: (f64, f64),
        bottom_right: (f64, f64),
        grid_depth: u32,
        limit: u32,
    ) -> Result<PointsOfInterestResponse, PtvError>;

    /// Search stops and lines by name
    async fn search(&self, term: &str) -> Result<SearchResponse, PtvError>;

    /// Next departures from a stop across all lines and directions
    async fn broad_next_departures(
        &self,
        mode: TransportType,
        stop_id: u32,
        limit: u32,
    ) -> Result<NextDeparturesResponse, PtvError>;

    /// Lines of a transport mode, optionally filtered by name
    async fn lines_by_mode(
        &self,
        mode: TransportType,
        name_filter: Option<&str>,
    ) -> Result<LinesByModeResponse, PtvError>;

    /// Current disruptions
    ///
    /// `None` is rejected with [`PtvError::InvalidArgument`] before any
    /// request is sent; an empty slice requests every mode.
    async fn disruptions(
        &self,
        modes: Option<&[DisruptionMode]>,
    ) -> Result<DisruptionsResponse, PtvError>;

    /// Next departures for one line, stop and direction
    #[allow(clippy::too_many_arguments)]
    async fn specific_next_departures(
        &self,
        mode: TransportType,
        line_id: u32,
        stop_id: u32,
        direction_id: u32,
        limit: u32,
        for_utc: Option<DateTime<Utc>>,
    ) -> Result<NextDeparturesResponse, PtvError>;

    /// Stopping pattern of a run from a stop
    async fn stopping_pattern(
        &self,
        mode: TransportType,
        run_id: u32,
        stop_id: u32,
        for_utc: DateTime<Utc>,
    ) -> Result<StoppingPatternResponse, PtvError>;

    /// Stops served by a line
    async fn stops_for_line(
        &self,
        mode: TransportType,
        line_id: u32,
    ) -> Result<StopsForLineResponse, PtvError>;

    /// Raw bytes of the line map image
    async fn line_map(&self, line_id: u32) -> Result<Vec<u8>, PtvError>;
}

/// Client for the PTV Timetable API
#[derive(Debug, Clone)]
pub struct PtvTimetableClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
    config: PtvConfig,
}

impl PtvTimetableClient {
    /// Create a new client with its own connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &PtvConfig) -> Result<Self, PtvError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| PtvError::ConfigurationError(e.to_string()))?;

        Self::with_http_client(config, client)
    }

    /// Create a client sharing an existing HTTP client (and its pool)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_http_client(config: &PtvConfig, client: Client) -> Result<Self, PtvError> {
        config.validate()?;
        let credentials = config.credentials()?;

        Ok(Self {
            client,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    /// Sign and send a request, decoding the JSON response
    ///
    /// Transport failures and non-success statuses become
    /// [`PtvError::Transport`]; a body that does not match
    /// `R::Response` becomes [`PtvError::Decode`].
    pub async fn execute<R: ApiRequest>(&self, request: &R) -> Result<R::Response, PtvError> {
        let request_path = request.request_path();
        let uri = self.signed_uri(&request_path)?;

        debug!(path = %request_path, "Sending PTV API request");

        let response = self.get(uri.clone()).await?;
        let status = response.status();

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            warn!(path = %request_path, error = %e, "Failed to read PTV API response");
            PtvError::transport(e, Some(status), uri)
        })?;

        let result = serde_json::from_str(&body).inspect_err(|e| {
            warn!(path = %request_path, error = %e, "Failed to decode PTV API response");
        })?;

        Ok(result)
    }

    /// Absolute URI of a signed request path
    ///
    /// Fails when URL parsing would rewrite the signed path (dot segments
    /// such as a search for `..`), since the server would then reject the
    /// signature.
    fn signed_uri(&self, request_path: &str) -> Result<Url, PtvError> {
        let signed = self.credentials.sign_request_path(request_path);
        let uri = Url::parse(&format!("{}{signed}", self.base_url))
            .map_err(|e| PtvError::InvalidArgument(format!("invalid request path: {e}")))?;

        if !uri[Position::BeforePath..].ends_with(&signed) {
            return Err(PtvError::InvalidArgument(format!(
                "request path {request_path:?} is not preserved by URL parsing"
            )));
        }

        Ok(uri)
    }

    /// GET `uri`, failing on transport errors and non-success statuses
    async fn get(&self, uri: Url) -> Result<Response, PtvError> {
        let response = match self.client.get(uri.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                warn!(
                    path = uri.path(),
                    error = %e,
                    connect = e.is_connect(),
                    timeout = e.is_timeout(),
                    "PTV request failed without a response"
                );
                return Err(PtvError::transport(e, None, uri));
            },
        };

        let status = response.status();
        if !status.is_success() {
            warn!(path = uri.path(), %status, "PTV request returned an unsuccessful status");
            return Err(PtvError::transport(
                TransportCause::UnsuccessfulStatus(status),
                Some(status),
                uri,
            ));
        }

        Ok(response)
    }

    /// GET `uri` and return the whole body
    async fn get_bytes(&self, uri: Url) -> Result<Vec<u8>, PtvError> {
        let response = self.get(uri.clone()).await?;
        let status = response.status();

        let bytes = response.bytes().await.map_err(|e| {
            let e = e.without_url();
            warn!(path = uri.path(), error = %e, "Failed to read PTV response body");
            PtvError::transport(e, Some(status), uri)
        })?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TimetableService for PtvTimetableClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<HealthCheckResponse, PtvError> {
        self.execute(&HealthCheckRequest::now()).await
    }

    #[instrument(skip(self))]
    async fn stops_nearby(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<StopsNearbyResponse, PtvError> {
        self.execute(&StopsNearbyRequest {
            latitude,
            longitude,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn points_of_interest(
        &self,
        poi_types: &[PointOfInterestType],
        top_left: (f64, f64),
        bottom_right: (f64, f64),
        grid_depth: u32,
        limit: u32,
    ) -> Result<PointsOfInterestResponse, PtvError> {
        self.execute(&PointsOfInterestRequest {
            poi_types: poi_types.to_vec(),
            top_left,
            bottom_right,
            grid_depth,
            limit,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str) -> Result<SearchResponse, PtvError> {
        self.execute(&SearchRequest {
            term: term.to_string(),
        })
        .await
    }

    #[instrument(skip(self))]
    async fn broad_next_departures(
        &self,
        mode: TransportType,
        stop_id: u32,
        limit: u32,
    ) -> Result<NextDeparturesResponse, PtvError> {
        self.execute(&BroadNextDeparturesRequest {
            mode,
            stop_id,
            limit,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn lines_by_mode(
        &self,
        mode: TransportType,
        name_filter: Option<&str>,
    ) -> Result<LinesByModeResponse, PtvError> {
        self.execute(&LinesByModeRequest {
            mode,
            name_filter: name_filter.map(str::to_string),
        })
        .await
    }

    #[instrument(skip(self))]
    async fn disruptions(
        &self,
        modes: Option<&[DisruptionMode]>,
    ) -> Result<DisruptionsResponse, PtvError> {
        let modes = modes.ok_or_else(|| {
            PtvError::InvalidArgument("disruption modes must not be absent".to_string())
        })?;

        self.execute(&DisruptionsRequest {
            modes: modes.to_vec(),
        })
        .await
    }

    #[instrument(skip(self))]
    async fn specific_next_departures(
        &self,
        mode: TransportType,
        line_id: u32,
        stop_id: u32,
        direction_id: u32,
        limit: u32,
        for_utc: Option<DateTime<Utc>>,
    ) -> Result<NextDeparturesResponse, PtvError> {
        self.execute(&SpecificNextDeparturesRequest {
            mode,
            line_id,
            stop_id,
            direction_id,
            limit,
            for_utc,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn stopping_pattern(
        &self,
        mode: TransportType,
        run_id: u32,
        stop_id: u32,
        for_utc: DateTime<Utc>,
    ) -> Result<StoppingPatternResponse, PtvError> {
        self.execute(&StoppingPatternRequest {
            mode,
            run_id,
            stop_id,
            for_utc,
        })
        .await
    }

    #[instrument(skip(self))]
    async fn stops_for_line(
        &self,
        mode: TransportType,
        line_id: u32,
    ) -> Result<StopsForLineResponse, PtvError> {
        self.execute(&StopsForLineRequest { mode, line_id }).await
    }

    #[instrument(skip(self))]
    async fn line_map(&self, line_id: u32) -> Result<Vec<u8>, PtvError> {
        let page_url = self.config.map_page_url(line_id)?;
        debug!(%page_url, "Fetching line page");

        let page = self.get_bytes(page_url.clone()).await?;
        let image_url = map::resolve_map_image_url(&page_url, &page)?;
        debug!(%image_url, "Fetching line map image");

        let image = self.get_bytes(image_url).await?;
        debug!(bytes = image.len(), "Line map fetched");
        Ok(image)
    }
}

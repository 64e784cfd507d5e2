//! Address geocoding.
//!
//! Resolves a street address through a Nominatim-compatible search API.
//! When the provider has no answer, a point close to the configured
//! fallback location is used and flagged as approximate.

use async_trait::async_trait;
use platebook_common::{AppError, AppResult, config::GeocodingConfig};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Maximum jitter applied to the fallback point, in degrees per axis.
const FALLBACK_JITTER_DEG: f64 = 0.005;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Result of locating an address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    /// True when `point` is the jittered fallback rather than a provider hit.
    pub approximate: bool,
}

/// Address lookup provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address. `Ok(None)` means the provider found nothing.
    async fn geocode(&self, address: &str) -> AppResult<Option<GeoPoint>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim search endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    http_client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Create a geocoder from configuration.
    pub fn new(config: &GeocodingConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> AppResult<Option<GeoPoint>> {
        let places: Vec<NominatimPlace> = self
            .http_client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Geocoding request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::ExternalService(format!("Geocoding provider error: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid geocoding response: {e}")))?;

        Ok(places.first().and_then(|place| {
            Some(GeoPoint {
                latitude: place.lat.parse().ok()?,
                longitude: place.lon.parse().ok()?,
            })
        }))
    }
}

/// Shared geocoder handle.
pub type GeocoderService = Arc<dyn Geocoder>;

/// Locates restaurant addresses, falling back to an approximate point.
#[derive(Clone)]
pub struct GeocodingService {
    geocoder: Option<GeocoderService>,
    fallback: GeoPoint,
}

impl GeocodingService {
    /// Create a geocoding service. With `geocoder = None` every address
    /// resolves to the fallback point.
    #[must_use]
    pub fn new(geocoder: Option<GeocoderService>, config: &GeocodingConfig) -> Self {
        Self {
            geocoder,
            fallback: GeoPoint {
                latitude: config.fallback_latitude,
                longitude: config.fallback_longitude,
            },
        }
    }

    /// Build the service from configuration, using Nominatim when enabled.
    pub fn from_config(config: &GeocodingConfig) -> AppResult<Self> {
        let geocoder: Option<GeocoderService> = if config.enabled {
            Some(Arc::new(NominatimGeocoder::new(config)?))
        } else {
            None
        };
        Ok(Self::new(geocoder, config))
    }

    /// Locate an address. Never fails: provider misses and errors yield
    /// the jittered fallback point.
    pub async fn locate(&self, address: &str) -> Location {
        if let Some(geocoder) = &self.geocoder {
            match geocoder.geocode(address).await {
                Ok(Some(point)) => {
                    return Location {
                        point,
                        approximate: false,
                    };
                }
                Ok(None) => {
                    tracing::info!(address = %address, "Address not found, using fallback location");
                }
                Err(e) => {
                    tracing::warn!(error = %e, address = %address, "Geocoding failed, using fallback location");
                }
            }
        }

        Location {
            point: self.jittered_fallback(),
            approximate: true,
        }
    }

    fn jittered_fallback(&self) -> GeoPoint {
        let mut rng = rand::thread_rng();
        GeoPoint {
            latitude: self.fallback.latitude
                + rng.gen_range(-FALLBACK_JITTER_DEG..=FALLBACK_JITTER_DEG),
            longitude: self.fallback.longitude
                + rng.gen_range(-FALLBACK_JITTER_DEG..=FALLBACK_JITTER_DEG),
        }
    }
}

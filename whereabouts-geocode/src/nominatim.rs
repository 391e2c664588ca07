use log::warn;
use serde::Deserialize;

use whereabouts_logic::{ADDRESS_NOT_FOUND, Coordinate, Geocoder, prelude::*};

use crate::GEOCODER_URL;

// Nominatim's usage policy wants an identifying agent
const USER_AGENT: &str = concat!("whereabouts/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    /// Absent when the service can't match the coordinate (it returns an
    /// `error` body instead)
    display_name: Option<String>,
}

/// Reverse geocoder backed by a Nominatim-compatible HTTP endpoint.
///
/// Every failure mode (network, bad status, unmatched coordinate) degrades to
/// [ADDRESS_NOT_FOUND], the address is decoration and never worth an error
/// dialog.
pub struct NominatimGeocoder {
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    async fn lookup(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let url = format!(
            "{GEOCODER_URL}/reverse?format=jsonv2&lat={}&lon={}",
            coordinate.lat, coordinate.long
        );

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Geocoder returned error")?
            .json::<ReverseResponse>()
            .await
            .context("Malformed geocoder response")?;

        Ok(response.display_name)
    }
}

impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, coordinate: Coordinate) -> String {
        match self.lookup(coordinate).await {
            Ok(Some(address)) => address,
            Ok(None) => ADDRESS_NOT_FOUND.to_string(),
            Err(why) => {
                warn!(
                    "Reverse geocode of {}, {} failed: {why:?}",
                    coordinate.lat, coordinate.long
                );
                ADDRESS_NOT_FOUND.to_string()
            }
        }
    }
}

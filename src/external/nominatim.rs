use async_trait::async_trait;
use serde::Deserialize;

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, upstream_error, Error};
use crate::external::Geocoder;

const USER_AGENT: &str = concat!("missiondesk/", env!("CARGO_PKG_VERSION"));

/// Reverse geocoding against a Nominatim instance.
#[derive(Clone, Debug)]
pub struct Nominatim {
    api_base: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Place {
    display_name: Option<String>,
}

impl Nominatim {
    pub fn new(api_base: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            api_base: api_base.into(),
            http,
        })
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    #[tracing::instrument(skip(self))]
    async fn reverse_geocode(&self, point: Coordinates) -> Result<String, Error> {
        let url = format!("{}/reverse", self.api_base.trim_end_matches('/'));

        let res = self
            .http
            .get(url)
            .query(&[("format", "json")])
            .query(&[("lat", point.lat), ("lon", point.lng)])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let place: Place = res.json().await?;

        Ok(place.display_name.unwrap_or_default())
    }
}

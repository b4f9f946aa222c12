use std::env::{self, VarError};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{invalid_input_error, Error};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4000";
pub const DEFAULT_API_BASE: &str = "http://localhost:3000/aryafoulad";
pub const DEFAULT_ROUTING_API_BASE: &str = "https://router.project-osrm.org";
pub const DEFAULT_GEOCODING_API_BASE: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_RATE_SETTING_ID: i64 = 1;
pub const DEFAULT_FORM_IDLE_SECS: u64 = 3600;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub api_base: String,
    pub routing_api_base: String,
    pub geocoding_api_base: String,
    pub rate_setting_id: i64,
    /// Form sessions untouched for this long are discarded.
    pub form_idle_timeout: Duration,
}

impl Config {
    /// Reads `MISSIONDESK_*` variables, after loading a `.env` file if
    /// one is present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(err) => Err(err.into()),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<Option<String>, Error>,
    {
        let var = |name: &str, default: &str| -> Result<String, Error> {
            Ok(lookup(name)?
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string()))
        };

        let listen_addr = var("MISSIONDESK_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?
            .parse()
            .map_err(|_| invalid_input_error())?;

        let rate_setting_id = var(
            "MISSIONDESK_RATE_SETTING_ID",
            &DEFAULT_RATE_SETTING_ID.to_string(),
        )?
        .parse()
        .map_err(|_| invalid_input_error())?;

        let form_idle_secs: u64 = var(
            "MISSIONDESK_FORM_IDLE_SECS",
            &DEFAULT_FORM_IDLE_SECS.to_string(),
        )?
        .parse()
        .map_err(|_| invalid_input_error())?;

        if form_idle_secs == 0 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            listen_addr,
            api_base: var("MISSIONDESK_API_BASE", DEFAULT_API_BASE)?,
            routing_api_base: var("MISSIONDESK_ROUTING_API_BASE", DEFAULT_ROUTING_API_BASE)?,
            geocoding_api_base: var(
                "MISSIONDESK_GEOCODING_API_BASE",
                DEFAULT_GEOCODING_API_BASE,
            )?,
            rate_setting_id,
            form_idle_timeout: Duration::from_secs(form_idle_secs),
        })
    }
}

#[test]
fn falls_back_to_defaults() {
    let config = Config::from_lookup(|_| Ok(None)).unwrap();

    assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR.parse::<SocketAddr>().unwrap());
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.rate_setting_id, 1);
    assert_eq!(config.form_idle_timeout, Duration::from_secs(3600));
}

#[test]
fn reads_overrides() {
    let config = Config::from_lookup(|name| {
        Ok(match name {
            "MISSIONDESK_LISTEN_ADDR" => Some("0.0.0.0:8080".into()),
            "MISSIONDESK_RATE_SETTING_ID" => Some("3".into()),
            "MISSIONDESK_ROUTING_API_BASE" => Some("".into()),
            "MISSIONDESK_FORM_IDLE_SECS" => Some("600".into()),
            _ => None,
        })
    })
    .unwrap();

    assert_eq!(config.listen_addr.port(), 8080);
    assert_eq!(config.rate_setting_id, 3);
    assert_eq!(config.routing_api_base, DEFAULT_ROUTING_API_BASE);
    assert_eq!(config.form_idle_timeout, Duration::from_secs(600));
}

#[test]
fn rejects_malformed_values() {
    let result = Config::from_lookup(|name| {
        Ok((name == "MISSIONDESK_RATE_SETTING_ID").then(|| "one".to_string()))
    });

    assert_eq!(result.unwrap_err(), invalid_input_error());
}

#[test]
fn rejects_zero_idle_timeout() {
    let result = Config::from_lookup(|name| {
        Ok((name == "MISSIONDESK_FORM_IDLE_SECS").then(|| "0".to_string()))
    });

    assert_eq!(result.unwrap_err(), invalid_input_error());
}

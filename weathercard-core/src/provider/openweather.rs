use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{Result, WeatherError};

use super::{Lookup, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CURRENT_PATH: &str = "/data/2.5/weather";
const ONE_CALL_PATH: &str = "/data/2.5/onecall";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Provider against a custom endpoint. Every request is bounded by `timeout`.
    pub fn with_options(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Lookup<T>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }

        let body = res.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            tracing::warn!(%status, %url, "OpenWeather request failed");
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed = serde_json::from_str(&body)?;
        Ok(Lookup::Found(parsed))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_name(&self, location: &str) -> Result<Lookup<CurrentWeather>> {
        self.get(CURRENT_PATH, &[("q", location)]).await
    }

    async fn one_call(&self, coord: Coord) -> Result<Lookup<OneCall>> {
        let lon = coord.lon.to_string();
        let lat = coord.lat.to_string();

        self.get(
            ONE_CALL_PATH,
            &[
                ("lon", lon.as_str()),
                ("lat", lat.as_str()),
                ("exclude", "minutely,hourly"),
            ],
        )
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub main: String,
    #[serde(default)]
    pub description: String,
    pub icon: String,
}

/// `/data/2.5/weather` response, reduced to what the second call needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub coord: Coord,
    pub sys: Sys,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneCallCurrent {
    pub temp: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyTemp {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneCallDaily {
    pub dt: i64,
    pub temp: DailyTemp,
    pub weather: Vec<Condition>,
}

/// `/data/2.5/onecall` response with minutely and hourly data excluded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneCall {
    pub timezone_offset: i64,
    pub current: OneCallCurrent,
    pub daily: Vec<OneCallDaily>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

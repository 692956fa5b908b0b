use async_trait::async_trait;
use chrono::DateTime;
use std::fmt::Debug;

use crate::{
    error::{Result, WeatherError},
    model::{CurrentConditions, DailyForecastEntry, LocationQuery, WeatherCardModel},
    provider::openweather::{Condition, Coord, CurrentWeather, OneCall},
};

pub mod openweather;

const ICON_URL_LARGE: &str = "http://openweathermap.org/img/wn/{icon}@2x.png";
const ICON_URL_SMALL: &str = "http://openweathermap.org/img/wn/{icon}.png";

const TIME_OF_DAY_FORMAT: &str = "%I:%M %p";
const DATE_FORMAT: &str = "%a %b %d %Y";
const MISSING_TIME: &str = "--:--";

/// Result of a lookup that reached the provider and got an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// The two dependent calls a weather card needs.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current weather by place name. Resolves the canonical name and coordinates.
    async fn current_by_name(&self, location: &str) -> Result<Lookup<CurrentWeather>>;

    /// Current conditions plus daily forecast by coordinates.
    async fn one_call(&self, coord: Coord) -> Result<Lookup<OneCall>>;
}

/// Outcome of weather acquisition for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    Acquired(WeatherCardModel),
    NotFound(LocationQuery),
}

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Run both lookups in order and normalize the result.
    ///
    /// Only a not-found answer to the first lookup is recoverable. A 404 from
    /// the second lookup is an error: the coordinates came from the provider.
    pub async fn acquire(&self, query: &LocationQuery) -> Result<Acquisition> {
        let current = match self.provider.current_by_name(query.as_str()).await? {
            Lookup::Found(current) => current,
            Lookup::NotFound => {
                tracing::info!(location = %query, "location not found");
                return Ok(Acquisition::NotFound(query.clone()));
            }
        };

        tracing::debug!(
            name = %current.name,
            lat = current.coord.lat,
            lon = current.coord.lon,
            "resolved location"
        );

        let one_call = match self.provider.one_call(current.coord).await? {
            Lookup::Found(one_call) => one_call,
            Lookup::NotFound => {
                return Err(WeatherError::UnexpectedNotFound {
                    lat: current.coord.lat,
                    lon: current.coord.lon,
                });
            }
        };

        normalize(&current, &one_call).map(Acquisition::Acquired)
    }
}

/// Flatten both provider responses into the card model.
pub fn normalize(current: &CurrentWeather, one_call: &OneCall) -> Result<WeatherCardModel> {
    let offset = one_call.timezone_offset;
    let now = &one_call.current;
    let condition = first_condition(&now.weather)?;

    let conditions = CurrentConditions {
        location_name: current.name.clone(),
        country: current.sys.country.clone(),
        temperature_c: round_display(now.temp),
        description: condition.main.clone(),
        humidity_pct: now.humidity,
        wind_speed: round_display(now.wind_speed),
        icon_url: icon_url(ICON_URL_LARGE, &condition.icon),
        sunrise: optional_time_label(now.sunrise, offset)?,
        sunset: optional_time_label(now.sunset, offset)?,
        timezone_offset: offset,
    };

    let daily_forecast = one_call
        .daily
        .iter()
        .map(|day| {
            let condition = first_condition(&day.weather)?;
            Ok(DailyForecastEntry {
                date: local_date_label(day.dt, offset)?,
                icon_url: icon_url(ICON_URL_SMALL, &condition.icon),
                description: condition.main.clone(),
                high_c: round_display(day.temp.max),
                low_c: round_display(day.temp.min),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WeatherCardModel {
        current: conditions,
        daily_forecast,
    })
}

fn first_condition(weather: &[Condition]) -> Result<&Condition> {
    weather.first().ok_or(WeatherError::MissingCondition)
}

fn icon_url(template: &str, icon: &str) -> String {
    template.replace("{icon}", icon)
}

/// Round half away from zero to a whole display unit.
pub fn round_display(value: f64) -> i64 {
    value.round() as i64
}

/// Time of day at `timestamp + offset`, read as UTC (e.g. `"07:05 AM"`).
pub fn local_time_label(timestamp: i64, offset: i64) -> Result<String> {
    shifted(timestamp, offset).map(|dt| dt.format(TIME_OF_DAY_FORMAT).to_string())
}

/// Calendar date at `timestamp + offset`, read as UTC (e.g. `"Mon Oct 19 2026"`).
pub fn local_date_label(timestamp: i64, offset: i64) -> Result<String> {
    shifted(timestamp, offset).map(|dt| dt.format(DATE_FORMAT).to_string())
}

fn optional_time_label(timestamp: Option<i64>, offset: i64) -> Result<String> {
    match timestamp {
        Some(ts) => local_time_label(ts, offset),
        // Polar day/night: the provider omits sunrise and sunset.
        None => Ok(MISSING_TIME.to_string()),
    }
}

fn shifted(timestamp: i64, offset: i64) -> Result<DateTime<chrono::Utc>> {
    timestamp
        .checked_add(offset)
        .and_then(|local| DateTime::from_timestamp(local, 0))
        .ok_or(WeatherError::InvalidTimestamp(timestamp))
}

use serde::{Deserialize, Serialize};

/// The part of an inbound chat activity the handler reads.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingActivity {
    pub text: String,
    #[serde(default)]
    pub from: Option<ChannelAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelAccount {
    #[serde(default)]
    pub name: Option<String>,
}

/// Location name extracted from a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions, normalized for display.
///
/// Temperatures and wind speed are already rounded; sunrise and sunset are
/// local time-of-day labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub location_name: String,
    pub country: String,
    pub temperature_c: i64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed: i64,
    pub icon_url: String,
    pub sunrise: String,
    pub sunset: String,
    pub timezone_offset: i64,
}

impl CurrentConditions {
    /// Card title, e.g. `"Seattle, US"`.
    pub fn display_location(&self) -> String {
        format!("{}, {}", self.location_name, self.country)
    }
}

/// One forecast day, normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastEntry {
    pub date: String,
    pub icon_url: String,
    pub description: String,
    pub high_c: i64,
    pub low_c: i64,
}

/// Everything the card template binds against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCardModel {
    #[serde(flatten)]
    pub current: CurrentConditions,
    pub daily_forecast: Vec<DailyForecastEntry>,
}

/// A renderable chat attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: serde_json::Value,
}

/// Outcome of a processed request: a card or a plain-text fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum CardResult {
    Attachment(Attachment),
    Text(String),
}

/// Response body returned to the chat service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingActivity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_layout: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    pub input_hint: String,
}

const ACCEPTING_INPUT: &str = "acceptingInput";

impl From<CardResult> for OutgoingActivity {
    fn from(result: CardResult) -> Self {
        match result {
            CardResult::Attachment(attachment) => Self {
                kind: "message".to_string(),
                text: None,
                attachment_layout: Some("list".to_string()),
                attachments: vec![attachment],
                input_hint: ACCEPTING_INPUT.to_string(),
            },
            CardResult::Text(text) => Self {
                kind: "message".to_string(),
                text: Some(text),
                attachment_layout: None,
                attachments: Vec::new(),
                input_hint: ACCEPTING_INPUT.to_string(),
            },
        }
    }
}

use serde_json::Value;

use crate::{
    card::template::Template,
    error::CardError,
    model::{Attachment, CardResult, LocationQuery, WeatherCardModel},
    provider::Acquisition,
};

pub mod template;

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

const WEATHER_CARD_TEMPLATE: &str = include_str!("../templates/weather_card.json");

// The provider is queried in metric units, so the value under this label is m/s.
const WIND_SPEED_LABEL: &str = "mph";

/// Binds a [`WeatherCardModel`] into the Adaptive Card template.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    template: Value,
}

impl CardRenderer {
    /// Renderer for the bundled weather card.
    pub fn new() -> Result<Self, CardError> {
        let template = serde_json::from_str(WEATHER_CARD_TEMPLATE).map_err(CardError::Template)?;
        Ok(Self::from_template(template))
    }

    pub fn from_template(template: Value) -> Self {
        Self { template }
    }

    pub fn render(&self, model: &WeatherCardModel) -> Result<Attachment, CardError> {
        let mut data = serde_json::to_value(model).map_err(CardError::Data)?;
        if let Value::Object(root) = &mut data {
            root.insert("windSpeedLabel".to_string(), Value::from(WIND_SPEED_LABEL));
        }

        Ok(Attachment {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content: Template::new(&data).expand(&self.template),
        })
    }

    /// Card for an acquired model, fallback text for an unknown location.
    pub fn respond(&self, acquisition: &Acquisition) -> Result<CardResult, CardError> {
        match acquisition {
            Acquisition::Acquired(model) => self.render(model).map(CardResult::Attachment),
            Acquisition::NotFound(query) => Ok(fallback(query)),
        }
    }
}

pub fn fallback(query: &LocationQuery) -> CardResult {
    CardResult::Text(format!("Sorry, I couldn't find weather for {query}."))
}

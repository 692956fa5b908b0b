//! Request orchestration: verify, extract, acquire, render.

use crate::{
    Config,
    auth::SigningKey,
    card::CardRenderer,
    error::HandlerError,
    location::extract_location,
    model::{CardResult, IncomingActivity},
    provider::{Acquisition, WeatherService, openweather::OpenWeatherProvider},
};

/// Stages a request moves through. Each stage runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Unauthenticated,
    LocationResolved,
    WeatherAcquired,
    Responded,
    FallbackResponded,
    Failed,
}

#[derive(Debug)]
pub struct Handler {
    signing_key: SigningKey,
    weather: WeatherService,
    renderer: CardRenderer,
}

impl Handler {
    pub fn new(signing_key: SigningKey, weather: WeatherService, renderer: CardRenderer) -> Self {
        Self {
            signing_key,
            weather,
            renderer,
        }
    }

    /// Wire the OpenWeather provider and bundled card from explicit configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = OpenWeatherProvider::with_options(
            config.api_key()?.to_owned(),
            config.base_url(),
            config.request_timeout(),
        )?;

        Ok(Self::new(
            config.signing_key()?,
            WeatherService::new(Box::new(provider)),
            CardRenderer::new()?,
        ))
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Handle one inbound message.
    ///
    /// `Ok(None)` means the request was not authenticated and nothing should
    /// be sent back. Errors display only the fixed public failure message.
    pub async fn handle(
        &self,
        authorization: Option<&str>,
        body: &[u8],
    ) -> Result<Option<CardResult>, HandlerError> {
        if !self.signing_key.verify(authorization, body).is_verified() {
            transition(RequestState::Unauthenticated);
            return Ok(None);
        }

        let result = self.process(body).await;
        match &result {
            Ok(CardResult::Attachment(_)) => transition(RequestState::Responded),
            Ok(CardResult::Text(_)) => transition(RequestState::FallbackResponded),
            Err(err) => {
                transition(RequestState::Failed);
                tracing::error!(cause = ?std::error::Error::source(err), "request failed");
            }
        }
        result.map(Some)
    }

    async fn process(&self, body: &[u8]) -> Result<CardResult, HandlerError> {
        let activity: IncomingActivity =
            serde_json::from_slice(body).map_err(HandlerError::MalformedInput)?;

        let query = extract_location(&activity.text);
        transition(RequestState::LocationResolved);
        tracing::info!(
            location = %query,
            from = activity.from.as_ref().and_then(|f| f.name.as_deref()),
            "weather requested"
        );

        let acquisition = self.weather.acquire(&query).await?;
        if matches!(acquisition, Acquisition::Acquired(_)) {
            transition(RequestState::WeatherAcquired);
        }

        Ok(self.renderer.respond(&acquisition)?)
    }
}

fn transition(state: RequestState) {
    tracing::debug!(?state, "request state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Result, WeatherError},
        provider::{
            Lookup, WeatherProvider,
            openweather::{Condition, Coord, CurrentWeather, DailyTemp, OneCall, OneCallCurrent, OneCallDaily, Sys},
        },
    };
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Clone, Copy)]
    enum Script {
        Found,
        NotFound,
        ServerError,
    }

    #[derive(Debug)]
    struct ScriptedProvider {
        current: Script,
        calls: Arc<AtomicUsize>,
    }

    fn condition() -> Vec<Condition> {
        vec![Condition {
            main: "Clear".into(),
            description: "clear sky".into(),
            icon: "01d".into(),
        }]
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn current_by_name(&self, location: &str) -> Result<Lookup<CurrentWeather>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.current {
                Script::Found => Ok(Lookup::Found(CurrentWeather {
                    name: location.to_string(),
                    coord: Coord { lon: 10.7, lat: 59.9 },
                    sys: Sys { country: "NO".into() },
                })),
                Script::NotFound => Ok(Lookup::NotFound),
                Script::ServerError => Err(WeatherError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                }),
            }
        }

        async fn one_call(&self, _coord: Coord) -> Result<Lookup<OneCall>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Lookup::Found(OneCall {
                timezone_offset: 3600,
                current: OneCallCurrent {
                    temp: 4.4,
                    humidity: 60,
                    wind_speed: 2.6,
                    sunrise: Some(1_792_393_200),
                    sunset: Some(1_792_429_200),
                    weather: condition(),
                },
                daily: (0..8)
                    .map(|i| OneCallDaily {
                        dt: 1_792_400_000 + i * 86_400,
                        temp: DailyTemp { min: -1.0, max: 6.0 },
                        weather: condition(),
                    })
                    .collect(),
            }))
        }
    }

    fn handler(script: Script) -> (Handler, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider {
            current: script,
            calls: calls.clone(),
        };
        let handler = Handler::new(
            SigningKey::new(b"shared-secret".to_vec()).unwrap(),
            WeatherService::new(Box::new(provider)),
            CardRenderer::new().unwrap(),
        );
        (handler, calls)
    }

    fn body(text: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({ "type": "message", "text": text })).unwrap()
    }

    #[tokio::test]
    async fn signed_request_gets_a_card() {
        let (handler, calls) = handler(Script::Found);
        let body = body("<at>WeatherBot</at>&nbsp;Oslo");
        let header = handler.signing_key().sign(&body);

        let result = handler.handle(Some(&header), &body).await.unwrap();
        let Some(CardResult::Attachment(attachment)) = result else {
            panic!("expected a card, got {result:?}");
        };
        assert_eq!(attachment.content["body"][0]["text"], "Oslo, NO");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsigned_request_is_dropped_before_lookup() {
        let (handler, calls) = handler(Script::Found);
        let body = body("<at>WeatherBot</at>&nbsp;Oslo");

        assert_eq!(handler.handle(None, &body).await.unwrap(), None);
        assert_eq!(
            handler.handle(Some("HMAC AAAA"), &body).await.unwrap(),
            None
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tampered_body_is_dropped() {
        let (handler, calls) = handler(Script::Found);
        let header = handler.signing_key().sign(&body("<at>Bot</at> Oslo"));

        let result = handler.handle(Some(&header), &body("<at>Bot</at> Bergen")).await;
        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_location_gets_fallback_text() {
        let (handler, calls) = handler(Script::NotFound);
        let body = body("<at>WeatherBot</at>&nbsp;Atlantis");
        let header = handler.signing_key().sign(&body);

        let result = handler.handle(Some(&header), &body).await.unwrap();
        assert_eq!(
            result,
            Some(CardResult::Text("Sorry, I couldn't find weather for Atlantis.".into()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_generic_failure() {
        let (handler, _) = handler(Script::ServerError);
        let body = body("<at>WeatherBot</at>&nbsp;Seattle");
        let header = handler.signing_key().sign(&body);

        let err = handler.handle(Some(&header), &body).await.unwrap_err();
        assert!(matches!(err, HandlerError::Acquisition(_)));
        assert_eq!(err.to_string(), "Sorry, an error occurred.");
    }

    #[tokio::test]
    async fn body_without_text_is_malformed() {
        let (handler, calls) = handler(Script::Found);
        let body = br#"{"type":"message"}"#.to_vec();
        let header = handler.signing_key().sign(&body);

        let err = handler.handle(Some(&header), &body).await.unwrap_err();
        assert!(matches!(err, HandlerError::MalformedInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signed_non_json_body_is_malformed() {
        let (handler, _) = handler(Script::Found);
        let body = b"Oslo".to_vec();
        let header = handler.signing_key().sign(&body);

        let err = handler.handle(Some(&header), &body).await.unwrap_err();
        assert!(matches!(err, HandlerError::MalformedInput(_)));
    }
}

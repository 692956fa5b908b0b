use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, validator::Validation};
use weathercard_core::{
    CardRenderer, Config, OutgoingActivity, SigningKey, WeatherService, extract_location,
    provider::openweather::OpenWeatherProvider,
};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathercard-bot", version, about = "Weather card chat bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the signed webhook endpoint.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:3978")]
        addr: SocketAddr,
    },

    /// Configure the OpenWeather API key and the webhook signing secret.
    Configure,

    /// Print the response a message naming this location would get.
    Show {
        /// Location name, optionally with a bot mention.
        location: String,
    },

    /// Print the Authorization header value for a request body file.
    Sign {
        /// Path to the raw request body.
        body: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { addr } => {
                let handler = weathercard_core::Handler::from_config(&load_config()?)?;
                server::serve(addr, Arc::new(handler)).await
            }
            Command::Configure => configure(),
            Command::Show { location } => {
                let activity = show(&load_config()?, &location).await?;
                println!("{}", serde_json::to_string_pretty(&activity)?);
                Ok(())
            }
            Command::Sign { body } => {
                println!("{}", sign(&load_config()?, &body)?);
                Ok(())
            }
        }
    }
}

/// Config file overlaid with the environment.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env()?;
    Ok(config)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(|input: &str| {
            Ok(if input.trim().is_empty() {
                Validation::Invalid("API key must not be empty".into())
            } else {
                Validation::Valid
            })
        })
        .prompt()?;

    let secret = Password::new("Webhook security token (base64):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Shown once when the outgoing webhook is created")
        .with_validator(|input: &str| {
            Ok(match SigningKey::from_base64(input) {
                Ok(_) => Validation::Valid,
                Err(err) => Validation::Invalid(err.to_string().into()),
            })
        })
        .prompt()?;

    config.weather_api_key = Some(api_key.trim().to_string());
    config.signing_secret = Some(secret.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Authorization header value the chat service would send for this body file.
fn sign(config: &Config, body: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(body)
        .with_context(|| format!("Failed to read body file: {}", body.display()))?;
    Ok(config.signing_key()?.sign(&bytes))
}

/// Response a message naming `location` would get, without the signature check.
async fn show(config: &Config, location: &str) -> anyhow::Result<OutgoingActivity> {
    let provider = OpenWeatherProvider::with_options(
        config.api_key()?.to_owned(),
        config.base_url(),
        config.request_timeout(),
    )?;
    let weather = WeatherService::new(Box::new(provider));
    let renderer = CardRenderer::new()?;

    let query = extract_location(location);
    let acquisition = weather
        .acquire(&query)
        .await
        .with_context(|| format!("Failed to fetch weather for '{query}'"))?;

    Ok(OutgoingActivity::from(renderer.respond(&acquisition)?))
}

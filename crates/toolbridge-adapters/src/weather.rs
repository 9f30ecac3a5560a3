//! Weather lookup adapter backed by WeatherAPI.com.
//!
//! Two tools: current conditions for a city and a 1-7 day forecast, both
//! reshaped into short human-readable reports.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::{RemoteClient, RemoteRequest};
use crate::config::env_var;
use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, AdapterType, HealthStatus, ToolDefinition};

/// Environment variable holding the WeatherAPI.com key.
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default forecast length in days.
const DEFAULT_FORECAST_DAYS: u64 = 3;

/// Configuration for the weather adapter.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// WeatherAPI.com key (`WEATHER_API_KEY`).
    pub api_key: Option<String>,
    /// Base URL of the weather service; overridable for tests.
    pub base_url: String,
}

impl WeatherConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            api_key: env_var(ENV_WEATHER_API_KEY),
            ..Self::default()
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Weather lookup service adapter.
pub struct WeatherAdapter {
    id: String,
    connected: bool,
    config: WeatherConfig,
    client: RemoteClient,
}

impl WeatherAdapter {
    /// Create a new weather adapter with an injected configuration.
    pub fn new(id: impl Into<String>, config: WeatherConfig) -> Self {
        Self {
            id: id.into(),
            connected: false,
            config,
            client: RemoteClient::new(),
        }
    }

    /// Create a new weather adapter configured from the environment.
    pub fn from_env(id: impl Into<String>) -> Self {
        Self::new(id, WeatherConfig::from_env())
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::config_missing([ENV_WEATHER_API_KEY]))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn tool_get_weather(&self, params: Value) -> Result<Value> {
        let city = require_city(&params, "get_weather")?;
        let api_key = self.api_key()?;

        debug!(city, "fetching current weather");

        let url = self.endpoint("current.json");
        let data = self
            .client
            .call(
                RemoteRequest::get(&url)
                    .header("accept", "application/json")
                    .query("key", api_key)
                    .query("q", city)
                    .timeout(WEATHER_TIMEOUT),
            )
            .await?;

        let report = format_current(city, &data).ok_or_else(|| AdapterError::ResponseParse {
            url,
            reason: "response missing expected `current` fields".to_string(),
        })?;

        info!(city, "weather retrieved");
        Ok(Value::String(report))
    }

    async fn tool_get_forecast(&self, params: Value) -> Result<Value> {
        let city = require_city(&params, "get_forecast")?;
        let days = params
            .get("days")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_FORECAST_DAYS);

        if !(1..=7).contains(&days) {
            return Err(AdapterError::InvalidParams {
                tool_name: "get_forecast".into(),
                reason: format!("`days` must be between 1 and 7, got {days}"),
            });
        }

        let api_key = self.api_key()?;

        debug!(city, days, "fetching forecast");

        let url = self.endpoint("forecast.json");
        let data = self
            .client
            .call(
                RemoteRequest::get(&url)
                    .header("accept", "application/json")
                    .query("key", api_key)
                    .query("q", city)
                    .query("days", days.to_string())
                    .timeout(WEATHER_TIMEOUT),
            )
            .await?;

        let report = format_forecast(city, days, &data).ok_or_else(|| {
            AdapterError::ResponseParse {
                url,
                reason: "response missing expected `forecast` fields".to_string(),
            }
        })?;

        info!(city, days, "forecast retrieved");
        Ok(Value::String(report))
    }
}

fn require_city<'a>(params: &'a Value, tool_name: &str) -> Result<&'a str> {
    params
        .get("city")
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::InvalidParams {
            tool_name: tool_name.to_string(),
            reason: "missing required string field `city`".into(),
        })
}

fn format_current(city: &str, data: &Value) -> Option<String> {
    let current = data.get("current")?;
    let condition = current.pointer("/condition/text")?.as_str()?;
    let temp_c = current.get("temp_c")?.as_f64()?;
    let feels_like = current.get("feelslike_c")?.as_f64()?;
    let humidity = current.get("humidity")?.as_f64()?;
    let wind_kph = current.get("wind_kph")?.as_f64()?;
    let wind_dir = current.get("wind_dir").and_then(Value::as_str).unwrap_or("-");
    let last_updated = current
        .get("last_updated")
        .and_then(Value::as_str)
        .unwrap_or("-");

    Some(format!(
        "Weather in {city}\n\
         Condition: {condition}\n\
         Temperature: {temp_c}°C (feels like {feels_like}°C)\n\
         Humidity: {humidity}%\n\
         Wind: {wind_kph} km/h ({wind_dir})\n\
         Last updated: {last_updated}"
    ))
}

fn format_forecast(city: &str, days: u64, data: &Value) -> Option<String> {
    let forecast_days = data.pointer("/forecast/forecastday")?.as_array()?;

    let mut report = format!("{days}-day forecast for {city}\n");
    for day in forecast_days {
        let date = day.get("date").and_then(Value::as_str).unwrap_or("-");
        let condition = day
            .pointer("/day/condition/text")
            .and_then(Value::as_str)
            .unwrap_or("-");
        let max = day.pointer("/day/maxtemp_c").and_then(Value::as_f64)?;
        let min = day.pointer("/day/mintemp_c").and_then(Value::as_f64)?;
        report.push_str(&format!(
            "\n{date}: {condition}, {min}°C to {max}°C"
        ));
    }
    Some(report)
}

#[async_trait]
impl Adapter for WeatherAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Information
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, "weather adapter connected");
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        info!(id = %self.id, "weather adapter disconnected");
        self.connected = false;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(if self.config.api_key.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        })
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "get_weather".into(),
                description: "Get the current weather for a city.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "city": {
                            "type": "string",
                            "description": "City name"
                        }
                    },
                    "required": ["city"]
                }),
            },
            ToolDefinition {
                name: "get_forecast".into(),
                description: "Get a 1-7 day weather forecast for a city.".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "city": {
                            "type": "string",
                            "description": "City name"
                        },
                        "days": {
                            "type": "integer",
                            "description": "Forecast length in days, 1-7 (default: 3)"
                        }
                    },
                    "required": ["city"]
                }),
            },
        ]
    }

    async fn execute_tool(&self, name: &str, params: Value) -> Result<Value> {
        if !self.connected {
            return Err(AdapterError::NotConnected {
                adapter_id: self.id.clone(),
            });
        }
        match name {
            "get_weather" => self.tool_get_weather(params).await,
            "get_forecast" => self.tool_get_forecast(params).await,
            _ => Err(AdapterError::ToolNotFound {
                adapter_id: self.id.clone(),
                tool_name: name.to_string(),
            }),
        }
    }

    fn required_config(&self) -> &'static [&'static str] {
        &[ENV_WEATHER_API_KEY]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

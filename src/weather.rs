//! Weather service: fetches current conditions and a short forecast from
//! Open-Meteo and derives a one-line farming advisory.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rand::Rng;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::{debug, instrument};

use crate::cache::PersistentCache;
use crate::config::WeatherConfig;
use crate::models::{CurrentConditions, DailyOutlook, Location, WeatherReport};

/// Wind speed above which loose equipment should be secured, in km/h.
const HIGH_WIND_KMH: f32 = 20.0;
/// Temperature above which irrigation scheduling matters, in Celsius.
const HIGH_TEMPERATURE_C: f32 = 35.0;
/// Humidity above which fungal diseases become likely, in percent.
const HIGH_HUMIDITY_PCT: u8 = 80;

pub struct WeatherService {
    client: ClientWithMiddleware,
    base_url: String,
    forecast_days: u32,
    cache: Option<Arc<PersistentCache>>,
    cache_ttl: Duration,
}

impl WeatherService {
    /// Build a service from configuration. The cache is optional; without it
    /// every report hits the upstream API.
    pub fn new(config: &WeatherConfig, cache: Option<Arc<PersistentCache>>, cache_ttl_hours: u32) -> Result<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .context("Failed to build HTTP client")?;
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            forecast_days: config.forecast_days,
            cache,
            cache_ttl: Duration::from_secs(u64::from(cache_ttl_hours) * 3600),
        })
    }

    /// Current conditions, a daily outlook and an advisory for a location.
    ///
    /// Reports are cached per rounded coordinate pair per day.
    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn report(&self, location: &Location) -> Result<WeatherReport> {
        let key = location.cache_key(&Utc::now().date_naive().to_string());

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<WeatherReport>(&key).await? {
                debug!("Serving weather report from cache");
                return Ok(cached);
            }
        }

        let report = self.fetch_report(location).await?;

        if let Some(cache) = &self.cache {
            // Jitter spreads out expiry so entries do not all refresh at once.
            let jitter: f64 = rand::rng().random_range(0.9..1.1);
            let ttl = Duration::from_secs((self.cache_ttl.as_secs_f64() * jitter) as u64);
            cache.put(&key, report.clone(), ttl).await?;
        }
        Ok(report)
    }

    async fn fetch_report(&self, location: &Location) -> Result<WeatherReport> {
        debug!("Calling the forecast API");
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code&daily=temperature_2m_max,temperature_2m_min,precipitation_probability_max,weather_code&timezone=auto&forecast_days={}",
            self.base_url, location.latitude, location.longitude, self.forecast_days
        );

        let response = self.client.get(url).send().await?;
        let forecast: open_meteo::ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse forecast response")?;

        let Some(current) = forecast.current else {
            bail!("Incomplete weather data: current conditions missing");
        };

        let current = CurrentConditions {
            temperature_c: current.temperature,
            humidity_pct: current.humidity,
            wind_speed_kmh: current.wind_speed,
            description: open_meteo::weather_code_to_description(current.weather_code).to_string(),
        };

        let outlook = forecast
            .daily
            .as_ref()
            .map(open_meteo::daily_outlook)
            .unwrap_or_default();

        let advisory = farming_advisory(&current).to_string();

        Ok(WeatherReport {
            location: location.clone(),
            fetched_at: Utc::now(),
            current,
            outlook,
            advisory,
        })
    }
}

/// One-line advisory derived from current conditions. Rules are checked in
/// order of urgency; the first match wins.
#[must_use]
pub fn farming_advisory(current: &CurrentConditions) -> &'static str {
    let description = current.description.to_lowercase();
    if description.contains("rain") || description.contains("drizzle") {
        return "Rain expected. Ensure proper drainage in fields and postpone spraying.";
    }
    if current.temperature_c > HIGH_TEMPERATURE_C {
        return "High temperature alert. Increase irrigation frequency and avoid midday field work.";
    }
    if current.humidity_pct > HIGH_HUMIDITY_PCT {
        return "High humidity. Watch for fungal diseases and inspect crops closely.";
    }
    if current.wind_speed_kmh > HIGH_WIND_KMH {
        return "Strong winds. Secure loose equipment and delay pesticide application.";
    }
    "Favorable conditions for regular farming activities."
}

/// `OpenMeteo` API response structures and conversion utilities
mod open_meteo {
    use chrono::NaiveDate;
    use serde::Deserialize;

    use crate::models::DailyOutlook;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub latitude: f64,
        pub longitude: f64,
        pub current: Option<CurrentData>,
        pub daily: Option<DailyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        #[serde(rename = "temperature_2m")]
        pub temperature: f32,
        #[serde(rename = "relative_humidity_2m")]
        pub humidity: u8,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: f32,
        pub weather_code: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f32>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f32>>>,
        #[serde(rename = "precipitation_probability_max")]
        pub precipitation_probability: Option<Vec<Option<u8>>>,
        pub weather_code: Option<Vec<Option<u8>>>,
    }

    /// Convert daily arrays into per-day outlook entries, skipping days with
    /// unparsable dates.
    #[must_use]
    pub fn daily_outlook(daily: &DailyData) -> Vec<DailyOutlook> {
        let mut outlook = Vec::new();
        for (i, day) in daily.time.iter().enumerate() {
            let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
                continue;
            };

            let max_temp_c = *daily
                .temperature_max
                .as_ref()
                .and_then(|v| v.get(i))
                .and_then(|v| v.as_ref())
                .unwrap_or(&0.0);
            let min_temp_c = *daily
                .temperature_min
                .as_ref()
                .and_then(|v| v.get(i))
                .and_then(|v| v.as_ref())
                .unwrap_or(&0.0);
            let precipitation_chance_pct = *daily
                .precipitation_probability
                .as_ref()
                .and_then(|v| v.get(i))
                .and_then(|v| v.as_ref())
                .unwrap_or(&0);
            let code = *daily
                .weather_code
                .as_ref()
                .and_then(|v| v.get(i))
                .and_then(|v| v.as_ref())
                .unwrap_or(&0);

            outlook.push(DailyOutlook {
                date,
                min_temp_c,
                max_temp_c,
                precipitation_chance_pct,
                description: weather_code_to_description(code).to_string(),
            });
        }
        outlook
    }

    /// Convert `OpenMeteo` weather code to human-readable description
    #[must_use]
    pub fn weather_code_to_description(code: u8) -> &'static str {
        match code {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Fog",
            48 => "Depositing rime fog",
            51 => "Light drizzle",
            53 => "Moderate drizzle",
            55 => "Dense drizzle",
            61 => "Slight rain",
            63 => "Moderate rain",
            65 => "Heavy rain",
            71 => "Slight snow fall",
            73 => "Moderate snow fall",
            75 => "Heavy snow fall",
            80 => "Slight rain showers",
            81 => "Moderate rain showers",
            82 => "Violent rain showers",
            95 => "Thunderstorm",
            96 => "Thunderstorm with slight hail",
            99 => "Thunderstorm with heavy hail",
            _ => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(temperature_c: f32, humidity_pct: u8, wind: f32, description: &str) -> CurrentConditions {
        CurrentConditions {
            temperature_c,
            humidity_pct,
            wind_speed_kmh: wind,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_advisory_rain_takes_precedence() {
        let current = conditions(38.0, 85, 25.0, "Moderate rain");
        assert!(farming_advisory(&current).contains("drainage"));
    }

    #[test]
    fn test_advisory_drizzle_counts_as_rain() {
        let current = conditions(20.0, 60, 5.0, "Light drizzle");
        assert!(farming_advisory(&current).contains("drainage"));
    }

    #[test]
    fn test_advisory_heat() {
        let current = conditions(38.0, 60, 5.0, "Clear sky");
        assert!(farming_advisory(&current).contains("irrigation"));
    }

    #[test]
    fn test_advisory_humidity() {
        let current = conditions(30.0, 85, 5.0, "Overcast");
        assert!(farming_advisory(&current).contains("fungal"));
    }

    #[test]
    fn test_advisory_wind() {
        let current = conditions(30.0, 60, 25.0, "Partly cloudy");
        assert!(farming_advisory(&current).contains("Secure"));
    }

    #[test]
    fn test_advisory_favorable() {
        let current = conditions(28.0, 60, 10.0, "Clear sky");
        assert!(farming_advisory(&current).contains("Favorable"));
    }

    #[test]
    fn test_forecast_response_parsing() {
        let body = r#"{
            "latitude": 31.0,
            "longitude": 75.4,
            "current": {
                "temperature_2m": 31.5,
                "relative_humidity_2m": 62,
                "wind_speed_10m": 8.4,
                "weather_code": 2
            },
            "daily": {
                "time": ["2026-06-01", "2026-06-02"],
                "temperature_2m_max": [38.1, 36.4],
                "temperature_2m_min": [26.0, 25.2],
                "precipitation_probability_max": [10, 55],
                "weather_code": [1, 61]
            }
        }"#;
        let parsed: open_meteo::ForecastResponse = serde_json::from_str(body).unwrap();
        let current = parsed.current.unwrap();
        assert_eq!(current.humidity, 62);
        let outlook = open_meteo::daily_outlook(parsed.daily.as_ref().unwrap());
        assert_eq!(outlook.len(), 2);
        assert_eq!(outlook[1].precipitation_chance_pct, 55);
        assert_eq!(outlook[1].description, "Slight rain");
    }
}

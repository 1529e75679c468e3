//! Current-conditions lookup. The user's position is approximated from the
//! IANA timezone via a fixed table; the temperature comes from the public
//! Open-Meteo endpoint. Fetches run on a background thread and deposit the
//! result here, so the tick loop never blocks on the network.

use crate::config::Config;
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use log::{error, info, warn};
use serde::Deserialize;
use std::{
    sync::{Arc, LazyLock, RwLock},
    thread,
    time::{Duration, Instant},
};

/// Shown whenever we have no usable reading
pub const FALLBACK_TEMP_C: i32 = 22;

const API_HOST: &str = "https://api.open-meteo.com";
/// How long a reading stays fresh before the next scheduled refresh
const READING_TTL: Duration = Duration::from_secs(10 * 60);

/// Approximate coordinates for a timezone's principal city
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub city: &'static str,
}

const fn place(latitude: f64, longitude: f64, city: &'static str) -> Place {
    Place {
        latitude,
        longitude,
        city,
    }
}

/// Fallback coordinates for timezones the table doesn't know
const LONDON: Place = place(51.5074, -0.1278, "London");

/// Fixed timezone→place table. Static configuration, not extended at
/// runtime.
static PLACES: LazyLock<IndexMap<&'static str, Place>> = LazyLock::new(|| {
    IndexMap::from([
        ("America/New_York", place(40.7128, -74.0060, "New York")),
        ("America/Chicago", place(41.8781, -87.6298, "Chicago")),
        ("America/Denver", place(39.7392, -104.9903, "Denver")),
        ("America/Los_Angeles", place(34.0522, -118.2437, "Los Angeles")),
        ("America/Toronto", place(43.6532, -79.3832, "Toronto")),
        ("America/Vancouver", place(49.2827, -123.1207, "Vancouver")),
        ("Europe/London", LONDON),
        ("Europe/Paris", place(48.8566, 2.3522, "Paris")),
        ("Europe/Berlin", place(52.5200, 13.4050, "Berlin")),
        ("Europe/Rome", place(41.9028, 12.4964, "Rome")),
        ("Europe/Madrid", place(40.4168, -3.7038, "Madrid")),
        ("Europe/Amsterdam", place(52.3676, 4.9041, "Amsterdam")),
        ("Europe/Stockholm", place(59.3293, 18.0686, "Stockholm")),
        ("Europe/Moscow", place(55.7558, 37.6176, "Moscow")),
        ("Asia/Tokyo", place(35.6762, 139.6503, "Tokyo")),
        ("Asia/Shanghai", place(31.2304, 121.4737, "Shanghai")),
        ("Asia/Hong_Kong", place(22.3193, 114.1694, "Hong Kong")),
        ("Asia/Singapore", place(1.3521, 103.8198, "Singapore")),
        ("Asia/Dubai", place(25.2048, 55.2708, "Dubai")),
        ("Asia/Kolkata", place(28.7041, 77.1025, "Delhi")),
        ("Asia/Seoul", place(37.5665, 126.9780, "Seoul")),
        ("Australia/Sydney", place(-33.8688, 151.2093, "Sydney")),
        ("Australia/Melbourne", place(-37.8136, 144.9631, "Melbourne")),
        ("Pacific/Auckland", place(-36.8485, 174.7633, "Auckland")),
        ("America/Sao_Paulo", place(-23.5505, -46.6333, "São Paulo")),
        ("America/Buenos_Aires", place(-34.6118, -58.3960, "Buenos Aires")),
        ("Africa/Cairo", place(30.0444, 31.2357, "Cairo")),
        ("Africa/Johannesburg", place(-26.2041, 28.0473, "Johannesburg")),
    ])
});

/// Where we think the user is
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
}

impl From<Place> for ResolvedPlace {
    fn from(place: Place) -> Self {
        Self {
            latitude: place.latitude,
            longitude: place.longitude,
            city: place.city.to_owned(),
        }
    }
}

/// Map a timezone name to coordinates. Unknown timezones keep their last
/// path segment as the city name but borrow London's coordinates.
fn lookup(timezone: &str) -> ResolvedPlace {
    match PLACES.get(timezone) {
        Some(place) => (*place).into(),
        None => ResolvedPlace {
            city: fallback_city(timezone),
            ..LONDON.into()
        },
    }
}

fn fallback_city(timezone: &str) -> String {
    timezone
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace('_', " "))
        .unwrap_or_else(|| "Unknown".to_owned())
}

/// Figure out where the user is, preferring the configured override
pub fn resolve_place(config: &Config) -> ResolvedPlace {
    let timezone = match &config.timezone {
        Some(timezone) => timezone.clone(),
        None => match iana_time_zone::get_timezone() {
            Ok(timezone) => timezone,
            Err(err) => {
                error!("Timezone detection failed: {err}");
                return LONDON.into();
            }
        },
    };
    info!("Resolved timezone {timezone}");
    lookup(&timezone)
}

/// The state the weather box renders from
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reading {
    pub temperature_c: i32,
    pub error: bool,
    pub loading: bool,
    fetched_at: Option<Instant>,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            temperature_c: FALLBACK_TEMP_C,
            error: false,
            loading: false,
            fetched_at: None,
        }
    }
}

impl Reading {
    /// Fold a completed fetch into the reading. A failure pins the fallback
    /// temperature and raises the error flag; a later success clears it.
    fn apply(&mut self, result: anyhow::Result<i32>, now: Instant) {
        match result {
            Ok(temperature) => {
                self.temperature_c = temperature;
                self.error = false;
            }
            Err(err) => {
                error!("Error fetching weather: {err:?}");
                self.temperature_c = FALLBACK_TEMP_C;
                self.error = true;
            }
        }
        self.loading = false;
        self.fetched_at = Some(now);
    }

    fn stale(&self, now: Instant) -> bool {
        if self.loading {
            return false;
        }
        match self.fetched_at {
            Some(fetched_at) => fetched_at + READING_TTL < now,
            None => true,
        }
    }
}

/// Gotta know weather or not to grab a jacket
#[derive(Debug)]
pub struct Weather {
    url: String,
    city: String,
    reading: Arc<RwLock<Reading>>,
}

impl Weather {
    pub fn new(place: &ResolvedPlace) -> Self {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current_weather=true&timezone=auto",
            API_HOST, place.latitude, place.longitude
        );
        Self {
            url,
            city: place.city.clone(),
            reading: Default::default(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Get the latest reading. If it's missing or past its TTL, kick off a
    /// background refresh; the old value keeps showing in the meantime.
    pub fn reading(&self) -> Reading {
        let Ok(guard) = self.reading.try_read() else {
            // Contention is so low that we don't ever expect to hit this
            warn!("Failed to grab weather read lock");
            return Reading::default();
        };
        let reading = *guard;
        drop(guard);

        if reading.stale(Instant::now()) {
            self.refresh();
        }
        reading
    }

    /// Fetch now, regardless of freshness. Also the tap-to-refresh path.
    /// No-op if a fetch is already in flight.
    pub fn refresh(&self) {
        {
            let Ok(mut guard) = self.reading.try_write() else {
                warn!("Failed to grab weather write lock");
                return;
            };
            if guard.loading {
                return;
            }
            guard.loading = true;
        }

        let lock = Arc::clone(&self.reading);
        let request = ureq::get(&self.url);
        thread::spawn(move || {
            info!("Fetching current weather");
            let result = (|| {
                let response = request.call().with_context(|| {
                    format!("Error fetching weather from {API_HOST}")
                })?;
                let forecast: Forecast = response
                    .into_json()
                    .context("Error parsing weather response as JSON")?;
                Ok(forecast.temperature_c())
            })();

            // Stringify the error to dump the lifetime
            match lock.write().map_err(|err| anyhow!("{err}")) {
                Ok(mut guard) => guard.apply(result, Instant::now()),
                Err(err) => error!("Error saving weather reading: {err}"),
            }
        });
    }
}

/// https://open-meteo.com/en/docs
#[derive(Clone, Debug, Deserialize)]
struct Forecast {
    current_weather: CurrentWeather,
}

#[derive(Clone, Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
}

impl Forecast {
    /// Current temperature, rounded to the nearest degree
    fn temperature_c(&self) -> i32 {
        self.current_weather.temperature.round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forecast() {
        let forecast: Forecast = serde_json::from_str(
            r#"{"current_weather": {"temperature": 18.6, "windspeed": 9.0}}"#,
        )
        .unwrap();
        assert_eq!(forecast.temperature_c(), 19);

        let malformed = serde_json::from_str::<Forecast>(
            r#"{"current_weather": {"windspeed": 9.0}}"#,
        );
        assert!(malformed.is_err());
    }

    #[test]
    fn test_lookup_known_timezone() {
        let place = lookup("Asia/Tokyo");
        assert_eq!(place.city, "Tokyo");
        assert_eq!(place.latitude, 35.6762);
        assert_eq!(place.longitude, 139.6503);
    }

    #[test]
    fn test_lookup_unknown_timezone() {
        let place = lookup("Antarctica/South_Pole");
        assert_eq!(place.city, "South Pole");
        // Unknown timezones borrow London's coordinates
        assert_eq!(place.latitude, LONDON.latitude);
        assert_eq!(place.longitude, LONDON.longitude);
    }

    #[test]
    fn test_reading_error_then_recovery() {
        let now = Instant::now();
        let mut reading = Reading::default();

        reading.apply(Err(anyhow!("HTTP 500")), now);
        assert_eq!(reading.temperature_c, FALLBACK_TEMP_C);
        assert!(reading.error);
        assert!(!reading.loading);

        reading.apply(Ok(31), now);
        assert_eq!(reading.temperature_c, 31);
        assert!(!reading.error);
    }

    #[test]
    fn test_reading_staleness() {
        let now = Instant::now();
        let mut reading = Reading::default();
        assert!(reading.stale(now), "empty reading should refresh");

        reading.apply(Ok(20), now);
        assert!(!reading.stale(now + Duration::from_secs(60)));
        assert!(reading.stale(now + READING_TTL + Duration::from_secs(1)));

        reading.loading = true;
        assert!(
            !reading.stale(now + READING_TTL + Duration::from_secs(1)),
            "in-flight fetch should suppress refresh"
        );
    }
}

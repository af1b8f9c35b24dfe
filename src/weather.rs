use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

static FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Describes a WMO weather interpretation code
pub(crate) fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Icy fog",
        51 => "Light drizzle",
        53 => "Drizzle",
        55 => "Heavy drizzle",
        61 => "Light rain",
        63 => "Rain",
        65 => "Heavy rain",
        71 => "Light snow",
        73 => "Snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Light showers",
        81 => "Showers",
        82 => "Heavy showers",
        85 => "Light snow showers",
        86 => "Snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm w/ hail",
        99 => "Severe thunderstorm",
        _ => "Unknown",
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Location {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid location {0:?}: expected LAT,LON")]
pub(crate) struct LocationError(String);

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Location, LocationError> {
        let err = || LocationError(s.to_owned());
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| err())?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| err())?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(err());
        }
        Ok(Location {
            latitude,
            longitude,
        })
    }
}

pub(crate) fn forecast_url(location: Location) -> String {
    format!(
        "{FORECAST_ENDPOINT}?latitude={}&longitude={}&current_weather=true&temperature_unit=fahrenheit",
        location.latitude, location.longitude
    )
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub(crate) struct CurrentWeather {
    /// Degrees Fahrenheit
    pub(crate) temperature: f64,
    pub(crate) weathercode: u16,
}

impl CurrentWeather {
    pub(crate) fn summary(&self) -> String {
        // Halves round up
        let degrees = (self.temperature + 0.5).floor();
        format!(
            "{degrees}\u{b0}F, {}",
            describe_weather_code(self.weathercode)
        )
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

pub(crate) fn parse_forecast(body: &str) -> Result<CurrentWeather, WeatherError> {
    let response = serde_json::from_str::<ForecastResponse>(body)?;
    Ok(response.current_weather)
}

#[derive(Debug, Error)]
pub(crate) enum WeatherError {
    #[error("weather request failed")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse weather response")]
    Parse(#[from] serde_json::Error),
}

pub(crate) trait WeatherSource {
    fn current(&self, location: Location) -> Result<CurrentWeather, WeatherError>;
}

#[derive(Clone, Debug, Default)]
pub(crate) struct OpenMeteo {
    client: reqwest::blocking::Client,
}

impl OpenMeteo {
    pub(crate) fn new() -> OpenMeteo {
        OpenMeteo::default()
    }
}

impl WeatherSource for OpenMeteo {
    fn current(&self, location: Location) -> Result<CurrentWeather, WeatherError> {
        let url = forecast_url(location);
        debug!(%url, "fetching current weather");
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        parse_forecast(&body)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum WeatherStatus {
    Loading,
    Ready(String),
    Unavailable(&'static str),
}

impl WeatherStatus {
    pub(crate) fn text(&self) -> &str {
        match self {
            WeatherStatus::Loading => "Loading...",
            WeatherStatus::Ready(s) => s.as_str(),
            WeatherStatus::Unavailable(s) => *s,
        }
    }
}

/// A weather lookup running on its own thread
#[derive(Debug)]
pub(crate) struct WeatherLookup {
    status: WeatherStatus,
    rx: Option<Receiver<WeatherStatus>>,
}

impl WeatherLookup {
    /// Starts looking up the weather at `location`.  Without a location the
    /// lookup is immediately unavailable.
    pub(crate) fn start<W>(source: W, location: Option<Location>) -> WeatherLookup
    where
        W: WeatherSource + Send + 'static,
    {
        let Some(location) = location else {
            return WeatherLookup {
                status: WeatherStatus::Unavailable("Location unavailable"),
                rx: None,
            };
        };
        let (tx, rx) = channel();
        thread::spawn(move || {
            let status = match source.current(location) {
                Ok(w) => WeatherStatus::Ready(w.summary()),
                Err(e) => {
                    warn!(error = %e, %location, "weather lookup failed");
                    WeatherStatus::Unavailable("Unavailable")
                }
            };
            // The receiver is gone if the panel was dismissed
            let _ = tx.send(status);
        });
        WeatherLookup {
            status: WeatherStatus::Loading,
            rx: Some(rx),
        }
    }

    /// Picks up the result if the lookup has finished
    pub(crate) fn poll(&mut self) -> &WeatherStatus {
        if let Some(rx) = self.rx.as_ref() {
            match rx.try_recv() {
                Ok(status) => {
                    self.status = status;
                    self.rx = None;
                }
                Err(TryRecvError::Empty) => (),
                Err(TryRecvError::Disconnected) => {
                    self.status = WeatherStatus::Unavailable("Unavailable");
                    self.rx = None;
                }
            }
        }
        &self.status
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Fixed(Option<CurrentWeather>);

    impl WeatherSource for Fixed {
        fn current(&self, _location: Location) -> Result<CurrentWeather, WeatherError> {
            match self.0 {
                Some(w) => Ok(w),
                None => Err(serde_json::from_str::<CurrentWeather>("null")
                    .unwrap_err()
                    .into()),
            }
        }
    }

    fn wait(lookup: &mut WeatherLookup) -> WeatherStatus {
        for _ in 0..500 {
            if !lookup.is_pending() {
                break;
            }
            lookup.poll();
            thread::sleep(Duration::from_millis(10));
        }
        lookup.poll().clone()
    }

    const BERLIN: Location = Location {
        latitude: 52.52,
        longitude: 13.41,
    };

    #[test]
    fn test_describe_codes() {
        assert_eq!(describe_weather_code(0), "Clear sky");
        assert_eq!(describe_weather_code(48), "Icy fog");
        assert_eq!(describe_weather_code(96), "Thunderstorm w/ hail");
        assert_eq!(describe_weather_code(4), "Unknown");
        assert_eq!(describe_weather_code(100), "Unknown");
    }

    #[test]
    fn test_parse_location() {
        assert_eq!("52.52, 13.41".parse::<Location>(), Ok(BERLIN));
        assert!("52.52".parse::<Location>().is_err());
        assert!("north,south".parse::<Location>().is_err());
        assert!("91,0".parse::<Location>().is_err());
    }

    #[test]
    fn test_forecast_url() {
        assert_eq!(
            forecast_url(BERLIN),
            "https://api.open-meteo.com/v1/forecast?latitude=52.52&longitude=13.41&current_weather=true&temperature_unit=fahrenheit"
        );
    }

    #[test]
    fn test_parse_forecast() {
        let body = r#"{
            "latitude": 52.52,
            "longitude": 13.419998,
            "current_weather": {
                "time": "2026-10-19T09:00",
                "temperature": 54.6,
                "windspeed": 11.2,
                "winddirection": 250,
                "weathercode": 61
            }
        }"#;
        let w = parse_forecast(body).unwrap();
        assert_eq!(w.weathercode, 61);
        assert_eq!(w.summary(), "55\u{b0}F, Light rain");
    }

    #[test]
    fn test_parse_forecast_garbage() {
        assert!(parse_forecast("<html>").is_err());
        assert!(parse_forecast(r#"{"current_weather": {}}"#).is_err());
    }

    #[test]
    fn test_summary_rounding() {
        let w = CurrentWeather {
            temperature: -2.5,
            weathercode: 3,
        };
        assert_eq!(w.summary(), "-2\u{b0}F, Overcast");
        let w = CurrentWeather {
            temperature: 71.5,
            weathercode: 42,
        };
        assert_eq!(w.summary(), "72\u{b0}F, Unknown");
    }

    #[test]
    fn test_lookup_without_location() {
        let mut lookup = WeatherLookup::start(Fixed(None), None);
        assert!(!lookup.is_pending());
        assert_eq!(
            lookup.poll(),
            &WeatherStatus::Unavailable("Location unavailable")
        );
    }

    #[test]
    fn test_lookup_success() {
        let weather = CurrentWeather {
            temperature: 68.2,
            weathercode: 1,
        };
        let mut lookup = WeatherLookup::start(Fixed(Some(weather)), Some(BERLIN));
        assert_eq!(
            wait(&mut lookup),
            WeatherStatus::Ready(String::from("68\u{b0}F, Mainly clear"))
        );
    }

    #[test]
    fn test_lookup_failure_degrades() {
        let mut lookup = WeatherLookup::start(Fixed(None), Some(BERLIN));
        let status = wait(&mut lookup);
        assert_eq!(status, WeatherStatus::Unavailable("Unavailable"));
        assert_eq!(status.text(), "Unavailable");
    }
}

// src/config.rs
use log::warn;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_MAP_CITY: &str = "New York";

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub model_path: PathBuf,
    pub csv_delimiter: u8,
    pub map_city: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("data"),
            model_path: PathBuf::from("data/price_model.json"),
            csv_delimiter: b',',
            map_city: DEFAULT_MAP_CITY.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();

        let port = match env::var("PORT") {
            Ok(s) => s
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a number, got '{}'", s))?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                defaults.port
            }
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let csv_delimiter = match env::var("CSV_DELIMITER") {
            Ok(s) => parse_delimiter(&s)?,
            Err(_) => defaults.csv_delimiter,
        };

        let map_city = env::var("MAP_CITY").unwrap_or(defaults.map_city);

        Ok(Config {
            port,
            data_dir,
            model_path,
            csv_delimiter,
            map_city,
        })
    }
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] => Ok(*b),
        _ if s == "\\t" => Ok(b'\t'),
        _ => Err(format!("CSV_DELIMITER must be a single byte, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3030);
        assert_eq!(config.csv_delimiter, b',');
        assert_eq!(config.map_city, "New York");
    }
}

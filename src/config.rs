use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("{name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub generative_model: String,
    pub embedding_model: String,
    pub qdrant_url: String,
    pub collection: String,
    pub tesseract_language: String,
    pub tesseract_datapath: Option<String>,
    pub jpeg_enabled: bool,
    pub render_width: i32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::MissingVar("GEMINI_API_KEY"))?;

        Ok(Self {
            gemini_api_key,
            gemini_api_url: or(
                "GEMINI_API_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            generative_model: or("GEMINI_MODEL", "gemini-1.5-flash"),
            embedding_model: or("GEMINI_EMBEDDING_MODEL", "text-embedding-004"),
            qdrant_url: or("QDRANT_URL", "http://localhost:6334"),
            collection: or("RESUME_COLLECTION", "Document"),
            tesseract_language: or("TESSERACT_LANG", "eng"),
            tesseract_datapath: get("TESSDATA_PREFIX"),
            jpeg_enabled: parse_var("RESUME_JPEG_ENABLED", get("RESUME_JPEG_ENABLED"), true)?,
            render_width: parse_var("PDF_RENDER_WIDTH", get("PDF_RENDER_WIDTH"), 2000)?,
        })
    }
}

fn parse_var<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Gemini,
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "gemini" => Ok(Mode::Gemini),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'gemini'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub gemini_api_key: String,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mode: Mode = env::var("MODE")
            .unwrap_or_else(|_| "mock".to_string())
            .parse()?;

        let gemini_api_key = match mode {
            Mode::Gemini => env::var("GEMINI_API_KEY")
                .context("GEMINI_API_KEY must be set when MODE=gemini")?,
            Mode::Mock => env::var("GEMINI_API_KEY").unwrap_or_default(),
        };

        let gemini_model = env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| crate::infrastructure::gemini::DEFAULT_MODEL.to_string());

        Ok(Self {
            mode,
            gemini_api_key,
            gemini_model,
        })
    }
}

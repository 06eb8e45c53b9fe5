// ABOUTME: API key discovery with precedence chain
// ABOUTME: CLI flag → API_KEY env var (populated from .env by main)

use crate::{Error, Result};
use std::env;

pub const API_KEY_VAR: &str = "API_KEY";

pub fn resolve_api_key(cli_key: Option<String>) -> Result<String> {
    // 1. CLI flag
    if let Some(key) = cli_key.filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    // 2. Environment variable
    key_from_env(API_KEY_VAR).ok_or_else(|| {
        Error::Config(format!(
            "No API key found. Provide via --api-key, {} env var, or a .env file",
            API_KEY_VAR
        ))
    })
}

fn key_from_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

use crate::app_config::{AppConfig, Environment, RequestHeader};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_endpoint = parse_api_endpoint(&require("STOCKVIEW_API_ENDPOINT")?)?;
    let headers = parse_headers(&or_default("STOCKVIEW_HEADERS", ""))?;

    let env = parse_environment(&or_default("STOCKVIEW_ENV", "development"))?;
    let log_level = or_default("STOCKVIEW_LOG_LEVEL", "info");

    let page_size = parse_usize("STOCKVIEW_PAGE_SIZE", "20")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOCKVIEW_PAGE_SIZE".to_string(),
            reason: "page size must be at least 1".to_string(),
        });
    }
    let freshness_window_minutes = parse_u32("STOCKVIEW_FRESHNESS_WINDOW_MINUTES", "5")?;

    let request_timeout_secs = parse_u64("STOCKVIEW_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("STOCKVIEW_USER_AGENT", "stockview/0.1 (catalog-reconciler)");
    let max_retries = parse_u32("STOCKVIEW_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("STOCKVIEW_RETRY_BACKOFF_BASE_SECS", "1")?;

    Ok(AppConfig {
        env,
        log_level,
        api_endpoint,
        headers,
        page_size,
        freshness_window_minutes,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOCKVIEW_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Validate the upstream base URL and strip trailing slashes so paths can be
/// appended with a single `/`.
fn parse_api_endpoint(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOCKVIEW_API_ENDPOINT".to_string(),
            reason: format!("\"{raw}\" is not an http(s) URL"),
        });
    }
    Ok(trimmed.to_string())
}

/// Parse `Name: value` pairs separated by `;`. Blank segments are skipped.
fn parse_headers(raw: &str) -> Result<Vec<RequestHeader>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = segment
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidEnvVar {
                    var: "STOCKVIEW_HEADERS".to_string(),
                    reason: format!("header \"{segment}\" is missing a ':' separator"),
                })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::InvalidEnvVar {
                    var: "STOCKVIEW_HEADERS".to_string(),
                    reason: format!("header \"{segment}\" has an empty name"),
                });
            }
            Ok(RequestHeader {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value could not be parsed.
    #[error("Invalid value for environment variable {name}: {message}")]
    Invalid {
        /// Name of the offending variable.
        name: String,
        /// Parser message.
        message: String,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    std::env::var(name).map_err(|_| EnvError::Missing(name.to_string()))
}

/// Reads an optional environment variable. Unset and empty values both yield `None`.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads and parses an optional environment variable.
pub fn parse_optional_env_var<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env_var(name)
        .map(|raw| parse_value(name, &raw))
        .transpose()
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| EnvError::Invalid {
        name: name.to_string(),
        message: e.to_string(),
    })
}

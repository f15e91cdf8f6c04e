//! Logging initialization module

use std::fmt;
use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `plandiff=debug`
    Development,
    /// JSON structured output, `plandiff=info`
    Production,
    /// Bare registry; tests install their own capture layer
    Test,
}

impl Profile {
    fn default_filter(self) -> &'static str {
        match self {
            // target prefix: covers plandiff_core, plandiff_engine and the binary
            Profile::Development => "plandiff=debug",
            Profile::Production | Profile::Test => "plandiff=info",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile: {}", other)),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Profile::Development => "development",
            Profile::Production => "production",
            Profile::Test => "test",
        })
    }
}

static INIT_ONCE: Once = Once::new();

fn env_filter(profile: Profile) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(profile.default_filter()))
}

/// Initialize the logging facility
///
/// Only the first call installs a subscriber; later calls are no-ops.
///
/// # Example
///
/// ```
/// use plandiff_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter(profile))
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter(profile))
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}

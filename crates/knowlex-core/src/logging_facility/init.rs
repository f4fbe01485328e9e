//! Logging initialization
//!
//! One subscriber per process; later calls are ignored.

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `knowlex=debug`
    Development,
    /// JSON structured output, `knowlex=info`
    Production,
    /// Bare registry; tests attach the capture layer instead
    Test,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the logging facility
///
/// `RUST_LOG` overrides the profile's default filter.
///
/// ```
/// use knowlex_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(filter_or("knowlex=debug"))
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter_or("knowlex=info"))
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Test => {
            // The capture layer may already own the global slot.
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parse() {
        assert_eq!("production".parse::<Profile>(), Ok(Profile::Production));
        assert_eq!("dev".parse::<Profile>(), Ok(Profile::Development));
        assert!("verbose".parse::<Profile>().is_err());
    }
}

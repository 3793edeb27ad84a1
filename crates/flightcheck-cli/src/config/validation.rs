use crate::error::{ConfigError, Result};
use flightcheck::HarnessConfig;

const SCHEMES: [&str; 3] = ["http://", "https://", "file://"];

/// Validate configuration for values the runner cannot work with.
pub fn validate(config: &HarnessConfig) -> Result<()> {
    if !SCHEMES.iter().any(|s| config.base_url.starts_with(s)) {
        return Err(ConfigError::InvalidValue {
            field: "baseUrl".to_string(),
            value: config.base_url.clone(),
            hint: "Use an http://, https:// or file:// URL".to_string(),
        }
        .into());
    }

    for (field, value) in [
        ("viewport.width", config.viewport.width),
        ("viewport.height", config.viewport.height),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: "0".to_string(),
                hint: "Viewport dimensions must be positive".to_string(),
            }
            .into());
        }
    }

    if config.viewport.device_scale_factor <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "viewport.deviceScaleFactor".to_string(),
            value: config.viewport.device_scale_factor.to_string(),
            hint: "Scale factor must be positive".to_string(),
        }
        .into());
    }

    if config.timings.readiness_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "timings.readinessMs".to_string(),
            value: "0".to_string(),
            hint: "The app needs time to render; 25000 is the default".to_string(),
        }
        .into());
    }

    if config.timings.poll_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "timings.pollMs".to_string(),
            value: "0".to_string(),
            hint: "Poll interval must be at least 1ms".to_string(),
        }
        .into());
    }

    Ok(())
}

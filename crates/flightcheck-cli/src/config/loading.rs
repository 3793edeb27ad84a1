use crate::cli::RunArgs;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use flightcheck::HarnessConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "flightcheck.config.json";

/// Environment variable prefix. Nested fields are separated by `__`, e.g.
/// `FLIGHTCHECK_TIMINGS__READINESS_MS`.
pub const ENV_PREFIX: &str = "FLIGHTCHECK_";

/// Load configuration relative to the current directory.
pub fn load_config(args: &RunArgs) -> Result<HarnessConfig> {
    load_config_in(args, Path::new("."))
}

/// Load configuration, looking for the default config file in `dir`.
pub fn load_config_in(args: &RunArgs, dir: &Path) -> Result<HarnessConfig> {
    let mut figment = Figment::new().merge(Serialized::defaults(HarnessConfig::default()));

    let config_file = match &args.config {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.clone()).into()),
        Some(path) => Some(path.clone()),
        None => {
            let default_path = dir.join(CONFIG_FILE);
            default_path.exists().then_some(default_path)
        }
    };

    if let Some(path) = config_file {
        tracing::debug!("Loading config from {}", path.display());
        figment = figment.merge(Json::file(path));
    }

    figment = figment.merge(
        Env::prefixed(ENV_PREFIX)
            .lowercase(false)
            .split("__")
            .map(|key| camel_case(key.as_str()).into()),
    );

    figment = figment.merge(Serialized::defaults(FlagOverrides::from(args)));

    figment.extract().map_err(|e| {
        let field = if e.path.is_empty() {
            "configuration".to_string()
        } else {
            e.path.join(".")
        };
        ConfigError::Extract {
            field,
            message: e.kind.to_string(),
            hint: format!("Check {CONFIG_FILE} and {ENV_PREFIX}* variables for field types"),
        }
        .into()
    })
}

/// `BASE_URL` or `timings.READINESS_MS` to `baseUrl` / `timings.readinessMs`.
pub(crate) fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

/// Only the flags the user actually passed.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlagOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    screenshot_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chrome_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timings: Option<TimingOverrides>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimingOverrides {
    readiness_ms: u64,
}

impl From<&RunArgs> for FlagOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            base_url: args.url.clone(),
            screenshot_dir: args.screenshot_dir.clone(),
            headless: args.headed.then_some(false),
            chrome_path: args.chrome_path.clone(),
            timings: args
                .readiness_timeout
                .map(|readiness_ms| TimingOverrides { readiness_ms }),
        }
    }
}

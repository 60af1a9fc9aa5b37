//! Portal runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into views and
//! servers. [`ConfigSources::from_env`] is the only place that reads the environment; nothing
//! reads process-wide variables while handling a request.

use crate::constants::{
    DEFAULT_MAP_STYLE, DEFAULT_MAP_ZOOM, DEFAULT_SIGN_IN_PATH, DEFAULT_SYMPTOM_DELAY_MS,
};
use crate::gateway::{Gateway, MemoryGateway, PostgrestConfig, PostgrestGateway};
use crate::geo::Coordinate;
use crate::map::MapConfig;
use crate::{PortalError, PortalResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Which gateway implementation to run against.
#[derive(Clone, Debug)]
pub enum GatewayConfig {
    Memory { seed_file: Option<PathBuf> },
    Postgrest(PostgrestConfig),
}

impl GatewayConfig {
    /// Builds the configured gateway.
    ///
    /// # Errors
    ///
    /// Returns a seed error if the in-memory gateway's seed file cannot be loaded.
    pub fn connect(&self) -> PortalResult<Arc<dyn Gateway>> {
        Ok(match self {
            GatewayConfig::Memory { seed_file: None } => {
                tracing::info!("using in-memory gateway");
                Arc::new(MemoryGateway::new())
            }
            GatewayConfig::Memory {
                seed_file: Some(path),
            } => Arc::new(MemoryGateway::from_clinic_seed(path)?),
            GatewayConfig::Postgrest(cfg) => {
                tracing::info!("using hosted gateway at {}", cfg.base_url);
                Arc::new(PostgrestGateway::new(cfg.clone()))
            }
        })
    }
}

/// Raw configuration values, as found in the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    pub gateway_url: Option<String>,
    pub gateway_key: Option<String>,
    pub access_token: Option<String>,
    pub seed_file: Option<String>,
    pub origin: Option<String>,
    pub map_token: Option<String>,
    pub map_style: Option<String>,
    pub map_zoom: Option<String>,
    pub sign_in_path: Option<String>,
    pub symptom_delay_ms: Option<String>,
}

impl ConfigSources {
    /// Reads every `PORTAL_*` variable. Call once at startup.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            gateway_url: var("PORTAL_GATEWAY_URL"),
            gateway_key: var("PORTAL_GATEWAY_KEY"),
            access_token: var("PORTAL_ACCESS_TOKEN"),
            seed_file: var("PORTAL_SEED_FILE"),
            origin: var("PORTAL_ORIGIN"),
            map_token: var("PORTAL_MAP_TOKEN"),
            map_style: var("PORTAL_MAP_STYLE"),
            map_zoom: var("PORTAL_MAP_ZOOM"),
            sign_in_path: var("PORTAL_SIGN_IN_PATH"),
            symptom_delay_ms: var("PORTAL_SYMPTOM_DELAY_MS"),
        }
    }
}

/// Portal configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    gateway: GatewayConfig,
    origin_override: Option<Coordinate>,
    map: MapConfig,
    sign_in_path: String,
    symptom_delay: Duration,
}

impl PortalConfig {
    /// Create a new `PortalConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` if `sign_in_path` is not an absolute path.
    pub fn new(
        gateway: GatewayConfig,
        origin_override: Option<Coordinate>,
        map: MapConfig,
        sign_in_path: String,
        symptom_delay: Duration,
    ) -> PortalResult<Self> {
        if !sign_in_path.starts_with('/') {
            return Err(PortalError::InvalidConfig(format!(
                "sign-in path must start with '/': {sign_in_path}"
            )));
        }
        Ok(Self {
            gateway,
            origin_override,
            map,
            sign_in_path,
            symptom_delay,
        })
    }

    /// Resolves raw values, applying defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidConfig` or `PortalError::InvalidCoordinate` for values
    /// that are set but malformed.
    pub fn resolve(sources: ConfigSources) -> PortalResult<Self> {
        let gateway = gateway_config_from_values(
            sources.gateway_url,
            sources.gateway_key,
            sources.access_token,
            sources.seed_file,
        )?;
        let origin_override = origin_from_env_value(sources.origin)?;
        let map = MapConfig {
            access_token: non_blank(sources.map_token).unwrap_or_default(),
            style: non_blank(sources.map_style).unwrap_or_else(|| DEFAULT_MAP_STYLE.into()),
            zoom: parse_or(sources.map_zoom, "PORTAL_MAP_ZOOM", DEFAULT_MAP_ZOOM)?,
        };
        let sign_in_path =
            non_blank(sources.sign_in_path).unwrap_or_else(|| DEFAULT_SIGN_IN_PATH.into());
        let symptom_delay = Duration::from_millis(parse_or(
            sources.symptom_delay_ms,
            "PORTAL_SYMPTOM_DELAY_MS",
            DEFAULT_SYMPTOM_DELAY_MS,
        )?);

        Self::new(gateway, origin_override, map, sign_in_path, symptom_delay)
    }

    pub fn gateway(&self) -> &GatewayConfig {
        &self.gateway
    }

    /// Explicit distance origin, if one was configured.
    pub fn origin_override(&self) -> Option<Coordinate> {
        self.origin_override
    }

    pub fn map(&self) -> &MapConfig {
        &self.map
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn symptom_delay(&self) -> Duration {
        self.symptom_delay
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &str, default: T) -> PortalResult<T>
where
    T::Err: std::fmt::Display,
{
    match non_blank(value) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| PortalError::InvalidConfig(format!("{name}={raw:?}: {e}"))),
    }
}

/// Parses the distance origin override (`"lat,lon"`). Unset or blank means no override.
pub fn origin_from_env_value(value: Option<String>) -> PortalResult<Option<Coordinate>> {
    non_blank(value).map(|v| v.parse::<Coordinate>()).transpose()
}

/// Chooses the gateway: the hosted backend when a URL is given, otherwise in-memory.
///
/// # Errors
///
/// Returns `PortalError::InvalidConfig` if a URL is given without an API key or with a
/// scheme other than http(s).
pub fn gateway_config_from_values(
    url: Option<String>,
    key: Option<String>,
    access_token: Option<String>,
    seed_file: Option<String>,
) -> PortalResult<GatewayConfig> {
    let Some(base_url) = non_blank(url) else {
        return Ok(GatewayConfig::Memory {
            seed_file: non_blank(seed_file).map(PathBuf::from),
        });
    };
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(PortalError::InvalidConfig(format!(
            "PORTAL_GATEWAY_URL must be an http(s) URL: {base_url}"
        )));
    }
    let api_key = non_blank(key).ok_or_else(|| {
        PortalError::InvalidConfig("PORTAL_GATEWAY_KEY is required with PORTAL_GATEWAY_URL".into())
    })?;
    Ok(GatewayConfig::Postgrest(PostgrestConfig {
        base_url,
        api_key,
        access_token: non_blank(access_token),
    }))
}

use anyhow::{Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "settings.yml";
const API_BASE_URL_ENV: &str = "API_BASE_URL";
const PAGE_SIZE_ENV: &str = "APP_PAGE_SIZE";

pub struct Settings {
    pub api_base_url: Url,
    pub page_size: u32,
}

#[derive(Deserialize)]
struct DefaultConfig {
    api_base_url: String,
    page_size: u32,
}

fn load_default_config() -> Result<DefaultConfig> {
    let settings = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_PATH))
        .build()
        .map_err(|_| anyhow!("Failed to read config file"))?;

    settings
        .try_deserialize::<DefaultConfig>()
        .map_err(|_| anyhow!("Failed to deserialize config file"))
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &str, f: F) -> Result<Option<T>>
where
    F: FnOnce(String) -> Result<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).map_err(|_| anyhow!("Failed to parse {}", env_var))?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => bail!("Could not read {env_var} from env"),
    }
}

/// Load configuration from env with fallback to default config file. Early returns if everything is set in env.
pub fn load() -> Result<Settings> {
    let base_url_opt: Option<Url> = try_from_env(API_BASE_URL_ENV, |env_str| {
        Url::parse(&env_str).map_err(|e| e.into())
    })?;

    let page_size_opt: Option<u32> = try_from_env(PAGE_SIZE_ENV, |env_str| {
        env_str.parse::<u32>().map_err(|e| e.into())
    })?;

    if let (Some(api_base_url), Some(page_size)) = (base_url_opt.clone(), page_size_opt) {
        return Ok(Settings {
            api_base_url,
            page_size,
        });
    }

    let config = load_default_config()?;

    let api_base_url = match base_url_opt {
        Some(url) => url,
        None => {
            tracing::warn!("{API_BASE_URL_ENV} is not set, using value from {DEFAULT_CONFIG_PATH}");
            Url::parse(&config.api_base_url)?
        }
    };

    let page_size = match page_size_opt {
        Some(val) => val,
        None => {
            tracing::warn!("{PAGE_SIZE_ENV} is not set, using value from {DEFAULT_CONFIG_PATH}");
            config.page_size
        }
    };

    Ok(Settings {
        api_base_url,
        page_size,
    })
}

use crate::adapters::http::{FetchSettings, DEFAULT_USER_AGENT};
use crate::codec::{Code128Options, QrOptions};
use crate::core::{ConfigProvider, OrderSource};
use crate::utils::error::{LabelError, Result};
use crate::utils::validation::{
    validate_color, validate_path, validate_positive_number, validate_range, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub render: RenderConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Saved "my orders" page.
    pub orders_html: Option<String>,
    /// `orders.json` from an earlier run; used when `orders_html` is unset.
    pub orders_json: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub enabled: bool,
    pub concurrent_requests: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub cookie: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrent_requests: 4,
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub code128: Code128Config,
    pub qr: QrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Code128Config {
    pub module_width: f64,
    pub height: f64,
    pub quiet: u32,
}

impl Default for Code128Config {
    fn default() -> Self {
        let d = Code128Options::default();
        Self {
            module_width: d.module_width,
            height: d.height,
            quiet: d.quiet,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    pub module_size: f64,
    pub quiet: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        let d = QrOptions::default();
        Self {
            module_size: d.module_size,
            quiet: d.quiet,
            dark_color: d.dark_color,
            light_color: d.light_color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub bundle: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            bundle: false,
        }
    }
}

impl LabelConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// `${NAME}` is replaced by the environment variable; unknown names are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let name = &caps[1];
                std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
            })
            .into_owned()
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout_seconds: self.fetch.timeout_seconds,
            user_agent: self.fetch.user_agent.clone(),
            cookie: self.fetch.cookie.clone(),
        }
    }
}

fn validate_render(code128: &Code128Options, qr: &QrOptions) -> Result<()> {
    validate_range("render.code128.module_width", code128.module_width, 0.5, 20.0)?;
    validate_range("render.code128.height", code128.height, 1.0, 2000.0)?;
    validate_range("render.code128.quiet", code128.quiet, 0, 100)?;
    validate_range("render.qr.module_size", qr.module_size, 0.5, 50.0)?;
    validate_range("render.qr.quiet", qr.quiet, 0, 16)?;
    validate_color("render.qr.dark_color", &qr.dark_color)?;
    validate_color("render.qr.light_color", &qr.light_color)?;
    Ok(())
}

impl ConfigProvider for LabelConfig {
    fn order_source(&self) -> Option<OrderSource> {
        match (&self.source.orders_html, &self.source.orders_json) {
            (Some(html), _) => Some(OrderSource::ListingHtml(html.clone())),
            (None, Some(json)) => Some(OrderSource::OrdersJson(json.clone())),
            (None, None) => None,
        }
    }

    fn base_url(&self) -> Option<&str> {
        self.source.base_url.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn concurrent_requests(&self) -> usize {
        self.fetch.concurrent_requests
    }

    fn fetch_enabled(&self) -> bool {
        self.fetch.enabled
    }

    fn bundle(&self) -> bool {
        self.load.bundle
    }

    fn code128_options(&self) -> Code128Options {
        Code128Options {
            module_width: self.render.code128.module_width,
            height: self.render.code128.height,
            quiet: self.render.code128.quiet,
            ..Code128Options::default()
        }
    }

    fn qr_options(&self) -> QrOptions {
        QrOptions {
            module_size: self.render.qr.module_size,
            quiet: self.render.qr.quiet,
            dark_color: self.render.qr.dark_color.clone(),
            light_color: self.render.qr.light_color.clone(),
        }
    }
}

impl Validate for LabelConfig {
    fn validate(&self) -> Result<()> {
        if self.order_source().is_none() {
            return Err(LabelError::MissingConfigError {
                field: "source.orders_html or source.orders_json".to_string(),
            });
        }
        if let Some(base) = &self.source.base_url {
            validate_url("source.base_url", base)?;
        }
        validate_path("load.output_path", &self.load.output_path)?;
        validate_positive_number("fetch.concurrent_requests", self.fetch.concurrent_requests, 1)?;
        validate_range("fetch.concurrent_requests", self.fetch.concurrent_requests, 1, 32)?;
        validate_positive_number("fetch.timeout_seconds", self.fetch.timeout_seconds as usize, 1)?;
        validate_render(&self.code128_options(), &self.qr_options())
    }
}

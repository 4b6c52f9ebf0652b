pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::config::toml_config::LabelConfig;
    use crate::utils::error::{LabelError, Result};
    use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "order-labels")]
    #[command(about = "Print-ready shipping labels for pending marketplace orders")]
    pub struct CliConfig {
        #[arg(long, help = "Saved \"my orders\" listing page")]
        pub orders_html: Option<String>,

        #[arg(long, conflicts_with = "orders_html", help = "orders.json from an earlier run")]
        pub orders_json: Option<String>,

        #[arg(long, help = "Base URL for relative order links")]
        pub base_url: Option<String>,

        #[arg(long)]
        pub output_path: Option<String>,

        #[arg(long)]
        pub concurrent_requests: Option<usize>,

        #[arg(long, help = "Do not visit order detail pages")]
        pub no_fetch: bool,

        #[arg(long, help = "Also write labels.zip")]
        pub bundle: bool,

        #[arg(long, help = "TOML configuration file; flags override its values")]
        pub config: Option<String>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log as JSON lines")]
        pub log_json: bool,
    }

    impl CliConfig {
        /// File settings with every flag given on the command line applied
        /// on top. Without `--config` the flags are applied to the defaults.
        pub fn to_label_config(&self) -> Result<LabelConfig> {
            let mut config = match &self.config {
                Some(path) => LabelConfig::from_file(path)?,
                None => LabelConfig::default(),
            };

            if let Some(html) = &self.orders_html {
                config.source.orders_html = Some(html.clone());
                config.source.orders_json = None;
            }
            if let Some(json) = &self.orders_json {
                config.source.orders_json = Some(json.clone());
                config.source.orders_html = None;
            }
            if let Some(base) = &self.base_url {
                config.source.base_url = Some(base.clone());
            }
            if let Some(output) = &self.output_path {
                config.load.output_path = output.clone();
            }
            if let Some(n) = self.concurrent_requests {
                config.fetch.concurrent_requests = n;
            }
            if self.no_fetch {
                config.fetch.enabled = false;
            }
            if self.bundle {
                config.load.bundle = true;
            }
            Ok(config)
        }
    }

    impl Validate for CliConfig {
        /// Flag-level checks only; the merged [`LabelConfig`] validates the rest.
        fn validate(&self) -> Result<()> {
            if self.config.is_none() && self.orders_html.is_none() && self.orders_json.is_none() {
                return Err(LabelError::MissingConfigError {
                    field: "--orders-html or --orders-json".to_string(),
                });
            }
            if let Some(base) = &self.base_url {
                validate_url("base_url", base)?;
            }
            if let Some(output) = &self.output_path {
                validate_path("output_path", output)?;
            }
            if let Some(n) = self.concurrent_requests {
                validate_range("concurrent_requests", n, 1, 32)?;
            }
            Ok(())
        }
    }

}

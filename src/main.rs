use clap::Parser;
use order_labels::utils::{logger, validation::Validate};
use order_labels::{CliConfig, HttpPageFetcher, LabelEngine, LabelError, LabelPipeline, LocalStorage};

fn fail(e: &LabelError) -> ! {
    tracing::error!("Label run failed: {} (severity: {:?})", e, e.severity());
    eprintln!("error: {}", e);
    eprintln!("hint: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    if let Err(e) = cli.validate() {
        fail(&e);
    }

    let config = match cli.to_label_config() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if let Err(e) = config.validate() {
        fail(&e);
    }

    let fetcher = match HttpPageFetcher::new(&config.fetch_settings()) {
        Ok(fetcher) => fetcher,
        Err(e) => fail(&e),
    };
    let storage = LocalStorage::new(config.load.output_path.clone());
    let engine = LabelEngine::new(LabelPipeline::new(storage, config, fetcher));

    match engine.run().await {
        Ok(output_path) => {
            println!("Labels saved to: {}", output_path);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

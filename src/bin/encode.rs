use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use order_labels::codec::{code128, qr, Code128Options, QrOptions, SvgDocument};
use order_labels::core::extract::extract;
use order_labels::core::page::{HtmlPage, TextPage};
use order_labels::domain::model::Carrier;
use order_labels::utils::logger;

#[derive(Parser)]
#[command(name = "encode")]
#[command(about = "Single-shot tracking extraction and symbol rendering")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tracking code found on a saved order page
    Extract {
        file: String,
        #[arg(long, value_enum)]
        carrier: Option<CarrierArg>,
        /// Treat the file as plain text instead of HTML
        #[arg(long)]
        text: bool,
    },
    /// Render a Code 128 barcode as SVG
    Code128 {
        payload: String,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long, default_value_t = 3.0)]
        module_width: f64,
        #[arg(long, default_value_t = 84.0)]
        height: f64,
        #[arg(long, default_value_t = 16)]
        quiet: u32,
    },
    /// Render a numeric QR code as SVG
    Qr {
        payload: String,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long, default_value_t = 7.0)]
        module_size: f64,
        #[arg(long, default_value_t = 4)]
        quiet: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CarrierArg {
    Avito,
    #[value(name = "5post")]
    FivePost,
}

impl From<CarrierArg> for Carrier {
    fn from(arg: CarrierArg) -> Self {
        match arg {
            CarrierArg::Avito => Carrier::Avito,
            CarrierArg::FivePost => Carrier::FivePost,
        }
    }
}

fn write_svg(doc: &SvgDocument, output: Option<&str>) -> anyhow::Result<()> {
    let svg = doc.to_svg_string();
    match output {
        Some(path) => {
            std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path))?;
            tracing::info!("SVG saved to: {}", path);
        }
        None => println!("{}", svg),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match args.command {
        Command::Extract {
            file,
            carrier,
            text,
        } => {
            let content =
                std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file))?;
            let hint = carrier.map(Carrier::from);
            let code = if text {
                extract(&TextPage::new(content), hint)
            } else {
                extract(&HtmlPage::parse(&content), hint)
            };
            if code.is_empty() {
                anyhow::bail!("No tracking number found in {}", file);
            }
            println!("{}", code);
        }
        Command::Code128 {
            payload,
            output,
            module_width,
            height,
            quiet,
        } => {
            let symbol = code128::encode(&payload)
                .with_context(|| format!("Cannot encode {:?} as Code 128", payload))?;
            let options = Code128Options {
                module_width,
                height,
                quiet,
                ..Code128Options::default()
            };
            let mut doc = SvgDocument::new();
            code128::draw(&mut doc, &symbol, &options);
            write_svg(&doc, output.as_deref())?;
        }
        Command::Qr {
            payload,
            output,
            module_size,
            quiet,
        } => {
            let matrix =
                qr::encode(&payload).with_context(|| format!("Cannot encode {:?} as QR", payload))?;
            let options = QrOptions {
                module_size,
                quiet,
                ..QrOptions::default()
            };
            let mut doc = SvgDocument::new();
            qr::draw(&mut doc, &matrix, &options);
            write_svg(&doc, output.as_deref())?;
        }
    }

    Ok(())
}

//! RateBridge CLI
//!
//! One-shot currency conversion and rate lookups from the terminal.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratebridge_common::{involves_domestic, Currency};
use ratebridge_fx::{Converter, ConverterConfig, FxError};

mod format;

use format::{format_amount, format_rate};

/// Well-known currencies shown by `popular`.
const POPULAR_CURRENCIES: &[(&str, &str)] = &[
    ("USD", "US Dollar"),
    ("EUR", "Euro"),
    ("GBP", "Pound Sterling"),
    ("JPY", "Japanese Yen"),
    ("CNY", "Chinese Yuan"),
    ("RUB", "Russian Ruble"),
    ("INR", "Indian Rupee"),
    ("BRL", "Brazilian Real"),
    ("CAD", "Canadian Dollar"),
    ("AUD", "Australian Dollar"),
    ("CHF", "Swiss Franc"),
    ("KRW", "South Korean Won"),
    ("MXN", "Mexican Peso"),
    ("SGD", "Singapore Dollar"),
    ("HKD", "Hong Kong Dollar"),
];

/// RateBridge CLI
#[derive(Parser, Debug)]
#[command(name = "ratebridge")]
#[command(about = "Currency conversion backed by a public rate API and the central bank feed")]
struct Args {
    /// Rate API endpoint (overrides RATEBRIDGE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an amount between two currencies
    Convert {
        amount: Decimal,
        from: String,
        to: String,
        /// Ignore cached rates
        #[arg(long)]
        force: bool,
    },
    /// Show the exchange rate between two currencies
    Rate {
        from: String,
        to: String,
        /// Ignore cached rates
        #[arg(long)]
        force: bool,
    },
    /// List currencies quoted against a base
    Currencies {
        #[arg(default_value = "USD")]
        base: String,
    },
    /// List popular currency codes
    Popular,
}

#[derive(Serialize)]
struct ConversionOutput {
    amount: Decimal,
    from: Currency,
    to: Currency,
    result: Decimal,
    rate: Decimal,
}

#[derive(Serialize)]
struct RateOutput {
    from: Currency,
    to: Currency,
    rate: Decimal,
    inverse: Option<Decimal>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ConverterConfig::from_env();
    if let Some(url) = args.api_url.clone() {
        config = config.with_api_url(url);
    }
    let converter = Converter::from_config(config)?;
    debug!(api_url = %converter.config().api_url, "Using rate API");

    match args.command {
        Command::Convert {
            amount,
            from,
            to,
            force,
        } => convert(&converter, amount, &from, &to, force, args.json).await,
        Command::Rate { from, to, force } => rate(&converter, &from, &to, force, args.json).await,
        Command::Currencies { base } => currencies(&converter, &base, args.json).await,
        Command::Popular => popular(args.json),
    }
}

/// Tell unreachable sources apart from unknown currency codes.
fn describe_failure(operation: &str, err: &FxError) -> anyhow::Error {
    if err.is_fetch_failure() {
        anyhow::anyhow!("{operation} failed, rates could not be fetched: {err}")
    } else {
        anyhow::anyhow!("{operation} failed, check the currency codes: {err}")
    }
}

async fn convert(
    converter: &Converter,
    amount: Decimal,
    from: &str,
    to: &str,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (from, to) = (Currency::new(from), Currency::new(to));
    if !json && involves_domestic(&from, &to) {
        eprintln!("Refreshing current rates...");
    }

    let result = converter
        .convert(amount, from.code(), to.code(), force)
        .await
        .map_err(|e| describe_failure("Conversion", &e))?;
    let rate = converter.get_rate(from.code(), to.code(), false).await?;

    if json {
        let output = ConversionOutput {
            amount,
            from,
            to,
            result,
            rate,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} = {} {}",
        format_amount(amount),
        from,
        format_amount(result),
        to
    );
    println!("  Rate: 1 {} = {} {}", from, format_rate(rate), to);
    if involves_domestic(&from, &to) {
        println!("  (domestic rate from the central bank when available)");
    }

    Ok(())
}

async fn rate(
    converter: &Converter,
    from: &str,
    to: &str,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (from, to) = (Currency::new(from), Currency::new(to));
    if !json && involves_domestic(&from, &to) {
        eprintln!("Refreshing current rates...");
    }

    let rate = converter
        .get_rate(from.code(), to.code(), force)
        .await
        .map_err(|e| describe_failure("Rate lookup", &e))?;
    let inverse = Decimal::ONE.checked_div(rate);

    if json {
        let output = RateOutput {
            from,
            to,
            rate,
            inverse,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Rate: 1 {} = {} {}", from, format_rate(rate), to);
    if let Some(inverse) = inverse {
        println!("  Inverse: 1 {} = {} {}", to, format_rate(inverse), from);
    }
    if involves_domestic(&from, &to) {
        println!("  (domestic rate from the central bank when available)");
    }

    Ok(())
}

async fn currencies(converter: &Converter, base: &str, json: bool) -> anyhow::Result<()> {
    let codes = converter.get_available_currencies(base).await;
    if codes.is_empty() {
        anyhow::bail!("No rates available for {}", Currency::new(base));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&codes)?);
    } else {
        for code in codes {
            println!("{code}");
        }
    }

    Ok(())
}

fn popular(json: bool) -> anyhow::Result<()> {
    if json {
        let map: Vec<_> = POPULAR_CURRENCIES
            .iter()
            .map(|(code, name)| serde_json::json!({ "code": code, "name": name }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!("Popular currencies:");
    println!("{}", "-".repeat(50));
    for (code, name) in POPULAR_CURRENCIES {
        println!("{code:5} - {name}");
    }

    Ok(())
}

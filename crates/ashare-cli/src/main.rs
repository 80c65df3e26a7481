//! Command-line interface for the ashare analysis pipeline

use anyhow::Context;
use ashare_analyst::{AnalystConfig, StockDataLoader};
use ashare_utils::LogFormat;
use clap::{Parser, Subcommand};
use regex::Regex;
use std::process::ExitCode;
use std::sync::LazyLock;
use tracing::info;

/// Six digits plus the listing exchange
static TICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{6}\.(SH|SZ|BJ)$").unwrap_or_else(|e| panic!("invalid ticker pattern: {e}"))
});

#[derive(Parser, Debug)]
#[command(name = "ashare")]
#[command(about = "A-share data loader and indicator pipeline", long_about = None)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load data and indicators for one ticker
    Analyze {
        /// Tushare code, e.g. 600519.SH
        #[arg(value_parser = parse_ticker)]
        ts_code: String,

        /// Print the section map embedded in prompts instead of the raw payload
        #[arg(long)]
        sections: bool,
    },
}

fn parse_ticker(value: &str) -> Result<String, String> {
    let ts_code = value.trim().to_uppercase();
    if TICKER.is_match(&ts_code) {
        Ok(ts_code)
    } else {
        Err(format!(
            "'{value}' is not a valid A-share code (expected e.g. 600519.SH, 000001.SZ, 830799.BJ)"
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    ashare_utils::init_tracing_with(format, "info");

    match args.command {
        Command::Analyze { ts_code, sections } => analyze(&ts_code, sections).await,
    }
}

async fn analyze(ts_code: &str, sections: bool) -> anyhow::Result<ExitCode> {
    let config = AnalystConfig::builder()
        .with_env()
        .build()
        .context("invalid configuration")?;
    let loader = StockDataLoader::from_config(&config)?;

    info!("Analyzing {}", ts_code);

    let payload = match loader.load(ts_code).await {
        Ok(payload) => payload,
        Err(e) => {
            println!("**分析错误**: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let output = if sections {
        payload.to_pretty_json()?
    } else {
        serde_json::to_string_pretty(&payload)?
    };
    println!("{output}");

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_validation() {
        assert_eq!(parse_ticker("600519.SH").unwrap(), "600519.SH");
        assert_eq!(parse_ticker(" 000001.sz ").unwrap(), "000001.SZ");
        assert_eq!(parse_ticker("830799.BJ").unwrap(), "830799.BJ");
        assert!(parse_ticker("60051.SH").is_err());
        assert!(parse_ticker("600519.HK").is_err());
        assert!(parse_ticker("AAPL").is_err());
    }

    #[test]
    fn test_parse_analyze_command() {
        let args = Args::try_parse_from(["ashare", "--json-logs", "analyze", "600519.SH", "--sections"])
            .unwrap();
        assert!(args.json_logs);
        match args.command {
            Command::Analyze { ts_code, sections } => {
                assert_eq!(ts_code, "600519.SH");
                assert!(sections);
            }
        }
    }

    #[test]
    fn test_rejects_bad_ticker() {
        assert!(Args::try_parse_from(["ashare", "analyze", "12345"]).is_err());
    }
}

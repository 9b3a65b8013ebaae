use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use cloudnative_app::datastore::ConnectionStatus;
use cloudnative_app::http::HealthReport;

#[derive(Parser)]
#[command(name = "cloudnative-probe")]
#[command(about = "Check a running cloudnative-app instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Request timeout in seconds.
    #[arg(short, long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request the root route and print its body
    Ping,
    /// Print the health report
    Health {
        /// Fail unless the datastore connection succeeded
        #[arg(long)]
        require_datastore: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/", base)).send().await?.error_for_status()?;
            println!("{}", res.text().await?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health { require_datastore } => {
            let report: HealthReport = client
                .get(format!("{}/health", base))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if require_datastore && report.datastore != ConnectionStatus::Connected {
                eprintln!("Datastore is {}", report.datastore);
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

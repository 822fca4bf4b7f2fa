use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ad-cli")]
#[command(about = "Management CLI for the ad service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// List the static ad catalog
    Ads,
    /// Request an ad for a user
    Request {
        #[arg(long)]
        user_id: String,
        #[arg(long, default_value = "banner")]
        ad_type: String,
    },
    /// Run the trace propagation check against the analytics service
    TraceTest,
    /// Dump the Prometheus metrics snapshot
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            print_response(res).await?;
        }
        Commands::Ads => {
            let res = client.get(format!("{base}/ads")).send().await?;
            print_response(res).await?;
        }
        Commands::Request { user_id, ad_type } => {
            let timestamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_secs()
                .to_string();
            let res = client
                .post(format!("{base}/ads/request"))
                .json(&json!({
                    "user_id": user_id,
                    "ad_type": ad_type,
                    "timestamp": timestamp,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::TraceTest => {
            let res = client
                .get(format!("{base}/test/trace_propagation"))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{base}/metrics")).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                print!("{text}");
            } else {
                eprintln!("Error: ad service returned status {}", status);
                eprintln!("Response: {}", text);
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: ad service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

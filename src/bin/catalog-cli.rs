use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Client for the catalog service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8082")]
    url: String,

    /// W3C traceparent to send, linking the call into an existing trace.
    #[arg(long)]
    traceparent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report service version and name
    Liveness,
    /// List every product
    List,
    /// Fetch one product by id
    Get { id: String },
    /// Create a product from a JSON file
    Create { file: PathBuf },
    /// Show or change the injected read latency (milliseconds)
    Latency { millis: Option<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(tp) = &cli.traceparent {
        headers.insert("traceparent", HeaderValue::from_str(tp)?);
    }

    let request = match cli.command {
        Commands::Liveness => client.get(format!("{}/liveness", cli.url)),
        Commands::List => client.get(format!("{}/products", cli.url)),
        Commands::Get { id } => client.get(format!("{}/products/{}", cli.url, id)),
        Commands::Create { file } => {
            let body = std::fs::read(&file)?;
            client
                .post(format!("{}/products", cli.url))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
        }
        Commands::Latency { millis: None } => client.get(format!("{}/latency", cli.url)),
        Commands::Latency { millis: Some(ms) } => {
            client.put(format!("{}/latency/{}", cli.url, ms))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Error: catalog returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}

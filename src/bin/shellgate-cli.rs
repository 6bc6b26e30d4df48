use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use shellgate::routing::Route;
use shellgate::worker::{DATA_URL_ENV, HANDLER_ID_ENV};

#[derive(Parser)]
#[command(name = "shellgate-cli")]
#[command(about = "Manage shellgate routes and talk to the data plane from a worker", long_about = None)]
struct Cli {
    /// Control plane URL.
    #[arg(long, env = "SHELLGATE_CONTROL_URL", default_value = "http://127.0.0.1:8081")]
    control_url: String,

    /// Bearer key for the control plane.
    #[arg(short, long, env = "SHELLGATE_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage routes
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },
    /// Print a request resource of the current handler (e.g. `body`, `params/q`)
    Get { resource: String },
    /// Write a response resource of the current handler (e.g. `status`, `headers/Content-Type`)
    Set {
        resource: String,
        /// Value to write; stdin is read when omitted.
        value: Option<String>,
    },
}

#[derive(Subcommand)]
enum RouteAction {
    /// List all routes in order
    List,
    /// Add a route
    Add {
        pattern: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        #[arg(short, long, default_value = "")]
        entrypoint: String,
        #[arg(short, long, default_value = "")]
        command: String,
    },
    /// Show one route
    Get { id: String },
    /// Remove a route
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Route { action } => {
            let mut headers = HeaderMap::new();
            if let Some(key) = &cli.key {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", key))?,
                );
            }
            let routes_url = format!("{}/routes", cli.control_url.trim_end_matches('/'));

            let res = match action {
                RouteAction::List => client.get(&routes_url).headers(headers).send().await?,
                RouteAction::Add {
                    pattern,
                    method,
                    entrypoint,
                    command,
                } => {
                    let route = Route {
                        entrypoint,
                        ..Route::new(method, pattern, command)
                    };
                    client
                        .post(&routes_url)
                        .headers(headers)
                        .json(&route)
                        .send()
                        .await?
                }
                RouteAction::Get { id } => {
                    client
                        .get(format!("{}/{}", routes_url, id))
                        .headers(headers)
                        .send()
                        .await?
                }
                RouteAction::Remove { id } => {
                    client
                        .delete(format!("{}/{}", routes_url, id))
                        .headers(headers)
                        .send()
                        .await?
                }
            };
            print_response(res).await?;
        }
        Commands::Get { resource } => {
            let url = format!("{}/request/{}", handler_url()?, resource);
            let mut res = client.get(url).send().await?;
            if !res.status().is_success() {
                return Err(format!("data plane returned status {}", res.status()).into());
            }

            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = res.chunk().await? {
                stdout.write_all(&chunk).await?;
            }
            stdout.flush().await?;
        }
        Commands::Set { resource, value } => {
            let body = match value {
                Some(value) => value.into_bytes(),
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin().read_to_end(&mut buf).await?;
                    buf
                }
            };

            let url = format!("{}/response/{}", handler_url()?, resource);
            let res = client.put(url).body(body).send().await?;
            if !res.status().is_success() {
                let status = res.status();
                let text = res.text().await.unwrap_or_default();
                return Err(format!("data plane returned status {}: {}", status, text).into());
            }
        }
    }

    Ok(())
}

/// `<data url>/handlers/<id>` for the handler this worker serves.
fn handler_url() -> Result<String, Box<dyn std::error::Error>> {
    let id = std::env::var(HANDLER_ID_ENV).map_err(|_| format!("{} is not set", HANDLER_ID_ENV))?;
    let data_url = std::env::var(DATA_URL_ENV).map_err(|_| format!("{} is not set", DATA_URL_ENV))?;
    Ok(format!("{}/handlers/{}", data_url.trim_end_matches('/'), id))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Err(format!("control plane returned status {}", status).into());
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use std::collections::BTreeSet;

use clap::{Parser, Subcommand};
use service_gateway::registry::Route;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect the routes published by a running service gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "https://localhost")]
    url: String,

    /// Accept self-signed gateway certificates
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every published route
    Routes {
        /// Only routes of this service
        #[arg(short, long)]
        service: Option<String>,
    },
    /// List registered services
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(cli.insecure)
        .build()?;

    let res = client
        .get(format!("{}/help", cli.url.trim_end_matches('/')))
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }
    let routes: Vec<Route> = res.json().await?;

    match cli.command {
        Commands::Routes { service } => {
            for route in routes
                .iter()
                .filter(|r| service.as_deref().map_or(true, |s| service_of(&r.path) == Some(s)))
            {
                println!("{:<7} {}", route.method, route.path);
            }
        }
        Commands::Services => {
            for service in services(&routes) {
                println!("{}", service);
            }
        }
    }

    Ok(())
}

/// Service segment of a mounted route path (`/api/{service}/...`).
fn service_of(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/api/")?;
    let service = rest.split('/').next().unwrap_or(rest);
    (!service.is_empty()).then_some(service)
}

fn services(routes: &[Route]) -> BTreeSet<&str> {
    routes
        .iter()
        .filter(|r| r.path != "/api/session")
        .filter_map(|r| service_of(&r.path))
        .collect()
}

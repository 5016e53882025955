// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;

use portal::session::{SessionEffect, SessionEffects};
use portal::{AuthenticatedClient, ClientConfig, ClientError, RequestDescriptor};

/// Command-line client for the logistics portal backend.
#[derive(Debug, Parser)]
#[command(name = "portal", version)]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    /// Log filter directive.
    #[arg(long, default_value = "warn", env = "PORTAL_LOG_LEVEL")]
    log_level: String,

    /// Log output format: `text` or `json`.
    #[arg(long, default_value = "text", env = "PORTAL_LOG_FORMAT")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and store the session.
    Login {
        #[arg(long, env = "PORTAL_EMAIL")]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// GET a backend path and print the JSON body.
    Get { path: String },
    /// POST a JSON body to a backend path and print the JSON response.
    Post {
        path: String,
        /// Request body as JSON.
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// Print the logged-in user.
    Whoami,
    /// Log out and remove the stored session.
    Logout,
}

/// Session effects for a terminal: notices go to stderr, and a redirect to
/// the login surface becomes a hint to run `portal login`.
struct ConsoleEffects;

impl SessionEffects for ConsoleEffects {
    fn apply(&self, effect: SessionEffect) {
        match effect {
            SessionEffect::ClearCredential => {}
            SessionEffect::Notify(message) => eprintln!("{message}"),
            SessionEffect::Redirect(_) => eprintln!("run `portal login` to sign in"),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.client.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&cli);
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match cli.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = AuthenticatedClient::new(&cli.client, Arc::new(ConsoleEffects))?;

    match cli.command {
        Command::Login { email, password } => {
            let payload = client.login(&email, &password).await?;
            print_json(&payload.user)?;
        }
        Command::Get { path } => {
            let body: serde_json::Value = client.get_json(&path).await.map_err(hint)?;
            print_json(&body)?;
        }
        Command::Post { path, data } => {
            let data: serde_json::Value = serde_json::from_str(&data)
                .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {e}"))?;
            let resp = client.send(&RequestDescriptor::post(path).json(&data)).await.map_err(hint)?;
            let body: serde_json::Value =
                resp.json().map_err(|e| ClientError::Decode(e.to_string()))?;
            print_json(&body)?;
        }
        Command::Whoami => {
            if !client.store().is_authenticated() {
                anyhow::bail!("not logged in");
            }
            print_json(&client.store().user())?;
        }
        Command::Logout => client.logout().await,
    }
    Ok(())
}

fn hint(e: ClientError) -> anyhow::Error {
    match e {
        ClientError::SessionTerminated => anyhow::anyhow!("{e} (run `portal login`)"),
        other => other.into(),
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Operator CLI for the API gateway.
//!
//! Mints development tokens, inspects tokens the way the gateway would, and
//! checks route files before deployment.
//!
//! # Usage
//!
//! ```bash
//! # Sign a token for local testing (uses JWT_SECRET)
//! cargo run --bin gatewayctl -- token mint --sub u-42 --role admin --ttl 3600
//!
//! # Verify a token and print its claims
//! cargo run --bin gatewayctl -- token inspect eyJhbGciOi...
//!
//! # Validate the route table
//! cargo run --bin gatewayctl -- routes check --file routes.json
//! ```
//!
//! # Environment Variables
//!
//! - `JWT_SECRET` (required for `token` commands)
//! - `ROUTES_FILE`, `PUBLIC_PATHS` (optional for `routes check`)

use api_gateway::application::services::TokenVerifier;
use api_gateway::config::{self, load_route_table};
use api_gateway::domain::{Claims, PathPattern, RouteTable};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::path::PathBuf;

/// CLI tool for operating the API gateway.
#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Mint and inspect bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Route table tools
    Routes {
        #[command(subcommand)]
        action: RoutesAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Sign a development token with JWT_SECRET
    Mint {
        /// Subject (user id)
        #[arg(long)]
        sub: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        role: Option<String>,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
    },

    /// Verify a token and print its claims
    Inspect {
        token: String,
    },
}

#[derive(Subcommand)]
enum RoutesAction {
    /// Load the route table and print every rule
    Check {
        /// Routes file (defaults to ROUTES_FILE or routes.json)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action),
        Commands::Routes { action } => handle_routes_action(action),
    }
}

fn jwt_secret() -> Result<String> {
    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    if secret.is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }
    Ok(secret)
}

fn handle_token_action(action: TokenAction) -> Result<()> {
    let secret = jwt_secret()?;

    match action {
        TokenAction::Mint {
            sub,
            email,
            name,
            role,
            ttl,
        } => {
            if ttl <= 0 {
                anyhow::bail!("--ttl must be positive, got {ttl}");
            }

            let now = Utc::now().timestamp();
            let claims = Claims {
                sub,
                name,
                email,
                role,
                exp: now + ttl,
                iat: Some(now),
            };

            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(secret.as_bytes()),
            )
            .context("Failed to sign token")?;

            println!("{}", "🔑 Token minted".bright_blue().bold());
            println!("  Subject: {}", claims.sub.cyan());
            if let Some(expires) = claims.expires_at() {
                println!("  Expires: {}", expires.to_rfc3339().cyan());
            }
            println!();
            println!("{}", token.bright_yellow());
            println!();
            println!("{}", "Add this to your requests:".bright_white());
            println!(
                "  {}: Bearer {}",
                "Authorization".bright_cyan(),
                token.bright_yellow()
            );
        }
        TokenAction::Inspect { token } => {
            let verifier = TokenVerifier::new(&secret);
            match verifier.verify(&token) {
                Ok(claims) => {
                    println!("{}", "✅ Token is valid".green().bold());
                    println!("  sub:   {}", claims.sub.cyan());
                    print_optional("email", claims.email.as_deref());
                    print_optional("name", claims.name.as_deref());
                    print_optional("role", claims.role.as_deref());
                    if let Some(expires) = claims.expires_at() {
                        println!("  exp:   {}", expires.to_rfc3339().cyan());
                    }
                }
                Err(e) => {
                    println!("{} {}", "❌ Token rejected:".red().bold(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_optional(label: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {label:<6} {}", v.cyan()),
        None => println!("  {label:<6} {}", "-".dimmed()),
    }
}

fn handle_routes_action(action: RoutesAction) -> Result<()> {
    match action {
        RoutesAction::Check { file } => {
            let path = file
                .or_else(|| std::env::var("ROUTES_FILE").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("routes.json"));

            let public_paths = config::parse_public_paths(&config::public_paths_from_env());

            let table = load_route_table(&path, public_paths)?;

            println!(
                "{} {}",
                "✅ Route table OK:".green().bold(),
                path.display().to_string().cyan()
            );
            print_table(&table);
        }
    }

    Ok(())
}

fn print_table(table: &RouteTable) {
    println!();
    println!("{}", "Routes (match order):".bright_white().bold());
    for rule in table.rules() {
        let access = if rule.public {
            "public".green()
        } else {
            "protected".yellow()
        };

        println!(
            "  {:<16} {:<24} → {}  [{}]",
            rule.name.bright_white(),
            rule.prefix,
            rule.target.as_str().cyan(),
            access
        );

        if let Some(rewrite) = &rule.rewrite {
            println!(
                "  {:<16} rewrite {} → {}",
                "",
                rewrite.pattern().dimmed(),
                rewrite.replacement().dimmed()
            );
        }
        if let Some(timeout) = rule.timeout {
            println!("  {:<16} timeout {}s", "", timeout.as_secs());
        }
    }

    println!();
    println!("{}", "Public paths:".bright_white().bold());
    for pattern in table.public_paths() {
        match pattern {
            PathPattern::Exact(path) => println!("  {path}"),
            PathPattern::Prefix(prefix) => println!("  {prefix}/*"),
        }
    }
}

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::clients::random_org::RandomOrgClient;
use crate::domain::{FlipRequest, FlipResult};
use crate::infra::config::Config;
use crate::tools::coin_flip::CoinFlipResolver;

#[derive(Parser)]
#[command(name = "coin-flip-mcp")]
#[command(about = "MCP server flipping n-sided coins with random.org")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the MCP server (default)
    Serve,
    /// Flip once against the configured random source and print the outcome
    Flip {
        /// Number of sides (defaults to the configured default)
        #[arg(short, long, allow_negative_numbers = true)]
        sides: Option<i64>,
        /// Side name; repeat once per side
        #[arg(short, long = "name")]
        names: Vec<String>,
    },
    /// Load and validate configuration without starting the service
    Config,
    /// Health check a server-mode instance
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            let cfg = match Config::load() {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!(error = %e, "configuration error");
                    return ExitCode::FAILURE;
                }
            };
            match crate::infra::boot::run_server(cfg).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "Server error");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Flip { sides, names } => match flip_once(sides, names).await {
            Ok(result) if !result.is_error => {
                println!("{}", result.text);
                ExitCode::SUCCESS
            }
            Ok(result) => {
                eprintln!("❌ {}", result.text);
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("❌ Flip failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn flip_once(sides: Option<i64>, names: Vec<String>) -> anyhow::Result<FlipResult> {
    let cfg = Config::load()?;
    cfg.validate()?;
    let client = RandomOrgClient::from_config(&cfg.random)?;
    let resolver = CoinFlipResolver::new(Arc::new(client));
    let sides = sides.unwrap_or(cfg.default_sides);
    let request = if names.is_empty() {
        FlipRequest::new(sides)
    } else {
        FlipRequest::with_names(sides, names)
    };
    Ok(resolver.resolve(&request).await)
}

fn validate_config() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    cfg.validate()?;
    Ok(())
}

async fn health_check(url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url.trim_end_matches('/')))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("HTTP {}", response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serial_test::serial;
    use crate::infra::config::clear_env;
    use std::env;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["coin-flip-mcp"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn flip_parses_repeated_names_and_negative_sides() {
        let cli = Cli::try_parse_from(["coin-flip-mcp", "flip", "-s", "2", "--name", "Yes", "--name", "No"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Flip { sides: Some(2), names: vec!["Yes".into(), "No".into()] })
        );
        let cli = Cli::try_parse_from(["coin-flip-mcp", "flip", "--sides", "-4"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Flip { sides: Some(-4), names: vec![] }));
    }

    #[tokio::test]
    #[serial]
    async fn flip_once_uses_configured_source() {
        clear_env();
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/integers/").query_param("max", "2");
            then.status(200).body("1\n");
        });
        env::set_var("RANDOM_ORG_BASE_URL", server.base_url());
        env::set_var("FLIP_DEFAULT_SIDES", "2");

        let out = flip_once(None, vec![]).await.unwrap();
        m.assert();
        assert_eq!(out, FlipResult::ok("heads"));
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn flip_once_degenerate_needs_no_network() {
        clear_env();
        env::set_var("RANDOM_ORG_BASE_URL", "http://127.0.0.1:9");
        let out = flip_once(Some(0), vec![]).await.unwrap();
        assert_eq!(out.text, crate::tools::coin_flip::VANISHED);
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_flip_failure_exits_nonzero() {
        clear_env();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/integers/");
            then.status(500).body("boom");
        });
        env::set_var("RANDOM_ORG_BASE_URL", server.base_url());
        let code = run_commands(Commands::Flip { sides: Some(2), names: vec![] }).await;
        assert_eq!(code, ExitCode::FAILURE);

        let code = run_commands(Commands::Flip { sides: Some(2), names: vec!["only-one".into()] }).await;
        assert_eq!(code, ExitCode::FAILURE);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_config_valid() {
        clear_env();
        env::set_var("MODE", "server");
        env::set_var("PORT", "8080");
        assert!(validate_config().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_config_invalid_mode() {
        clear_env();
        env::set_var("MODE", "invalid");
        let result = validate_config();
        assert!(result.unwrap_err().to_string().contains("Invalid MODE"));
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_config_success_and_failure() {
        clear_env();
        assert_eq!(run_commands(Commands::Config).await, ExitCode::SUCCESS);
        env::set_var("MODE", "nope");
        assert_eq!(run_commands(Commands::Config).await, ExitCode::FAILURE);
        clear_env();
    }

    #[test]
    fn config_subcommand_takes_no_flags() {
        let cli = Cli::try_parse_from(["coin-flip-mcp", "config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Config));
        assert!(Cli::try_parse_from(["coin-flip-mcp", "config", "--validate"]).is_err());
    }

    #[test]
    #[serial]
    fn stray_timeout_env_does_not_leak_between_tests() {
        env::set_var("RANDOM_ORG_TIMEOUT_MS", "0");
        env::set_var("RANDOM_ORG_CONNECT_TIMEOUT_MS", "0");
        assert!(validate_config().is_err());
        clear_env();
        assert!(validate_config().is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_serve_with_bad_mode_fails() {
        clear_env();
        env::set_var("MODE", "nope");
        assert_eq!(run_commands(Commands::Serve).await, ExitCode::FAILURE);
        clear_env();
    }

    #[tokio::test]
    async fn health_check_ok_and_error_paths() {
        let server = MockServer::start();
        server.mock(|when, then| { when.method(GET).path("/healthz"); then.status(200).body("ok"); });
        assert!(health_check(&server.base_url()).await.is_ok());

        let bad = MockServer::start();
        bad.mock(|when, then| { when.method(GET).path("/healthz"); then.status(500); });
        assert!(health_check(&bad.base_url()).await.is_err());
    }

    #[tokio::test]
    async fn run_commands_health_against_nothing_fails() {
        let code = run_commands(Commands::Health { url: "http://localhost:9".into() }).await;
        assert_eq!(code, ExitCode::FAILURE);
    }
}

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    coin_flip_mcp::infra::logging::init();

    coin_flip_mcp::cli::run().await
}

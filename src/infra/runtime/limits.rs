use std::time::Duration;

use crate::infra::config::RandomSourceConfig;

/// Build a reqwest client with the configured timeouts and redirects disabled.
pub fn make_http_client(cfg: &RandomSourceConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

use reqwest::Client;
use serde::Serialize;
use std::time::Instant;

use crate::domain::{RandomIntegerSource, SourceError};
use crate::infra::config::RandomSourceConfig;
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::logging::log_metric;
use crate::infra::runtime::limits::make_http_client;

/// random.org integer generator (`/integers/`), plain-text flavour.
#[derive(Clone)]
pub struct RandomOrgClient {
    base: String,
    http: Client,
}

impl RandomOrgClient {
    pub fn new(base: impl Into<String>) -> reqwest::Result<Self> {
        Self::from_config(&RandomSourceConfig {
            base_url: base.into(),
            ..RandomSourceConfig::default()
        })
    }

    pub fn from_config(cfg: &RandomSourceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            base: cfg.base_url.clone(),
            http: make_http_client(cfg)?,
        })
    }

    pub async fn integer(&self, min: i64, max: i64) -> Result<i64, SourceError> {
        let url = format!("{}/integers/", self.base.trim_end_matches('/'));
        let req_id = generate_request_id();
        tracing::debug!(endpoint = %url, min, max, request_id = %req_id, "random_org.integer request");

        let start = Instant::now();
        let res = self.fetch(&url, min, max, req_id).await;
        match &res {
            Ok(value) => {
                let elapsed_ms = start.elapsed().as_millis() as f64;
                log_metric("flip_coin", "remote_latency_ms", elapsed_ms);
                tracing::trace!(value, "random_org.integer response");
            }
            Err(e) => {
                metrics::counter!("remote_error_total", "tool" => "flip_coin").increment(1);
                tracing::warn!(error = %e, "random_org.integer failed");
            }
        }
        res
    }

    async fn fetch(&self, url: &str, min: i64, max: i64, req_id: String) -> Result<i64, SourceError> {
        let (builder, _rid) = add_standard_headers(self.http.get(url), Some(req_id));
        let resp = builder
            .query(&IntegersQuery::single(min, max))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status()));
        }
        let body = resp.text().await?;
        parse_plain_integer(&body)
    }
}

#[async_trait::async_trait]
impl RandomIntegerSource for RandomOrgClient {
    async fn fetch_integer(&self, min: i64, max: i64) -> Result<i64, SourceError> {
        self.integer(min, max).await
    }
}

#[derive(Serialize)]
struct IntegersQuery {
    num: u32,
    min: i64,
    max: i64,
    col: u32,
    base: u32,
    format: &'static str,
    rnd: &'static str,
}

impl IntegersQuery {
    fn single(min: i64, max: i64) -> Self {
        Self { num: 1, min, max, col: 1, base: 10, format: "plain", rnd: "new" }
    }
}

/// `format=plain` answers one integer per line.
fn parse_plain_integer(body: &str) -> Result<i64, SourceError> {
    let trimmed = body.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| SourceError::Parse(trimmed.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn mock_integers<'a>(server: &'a MockServer, max: &str, status: u16, body: &str) -> httpmock::Mock<'a> {
        server.mock(|when, then| {
            when.method(GET)
                .path("/integers/")
                .query_param("num", "1")
                .query_param("min", "1")
                .query_param("max", max)
                .query_param("col", "1")
                .query_param("base", "10")
                .query_param("format", "plain")
                .query_param("rnd", "new");
            then.status(status).body(body);
        })
    }

    #[tokio::test]
    async fn it_requests_one_plain_integer() {
        let server = MockServer::start();
        let m = mock_integers(&server, "6", 200, "4\n");

        let cli = RandomOrgClient::new(server.base_url()).unwrap();
        let out = cli.fetch_integer(1, 6).await.unwrap();
        m.assert();
        assert_eq!(out, 4);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_is_tolerated() {
        let server = MockServer::start();
        let m = mock_integers(&server, "2", 200, "1");
        let cli = RandomOrgClient::new(format!("{}/", server.base_url())).unwrap();
        assert_eq!(cli.fetch_integer(1, 2).await.unwrap(), 1);
        m.assert();
    }

    #[tokio::test]
    async fn non_integer_body_is_a_parse_error() {
        let server = MockServer::start();
        mock_integers(&server, "3", 200, "Error: You have used your quota");
        let cli = RandomOrgClient::new(server.base_url()).unwrap();
        let err = cli.fetch_integer(1, 3).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn it_returns_upstream_status_without_retrying() {
        let server = MockServer::start();
        let m = mock_integers(&server, "2", 503, "busy");
        let cli = RandomOrgClient::new(server.base_url()).unwrap();
        let err = cli.fetch_integer(1, 2).await.unwrap_err();
        assert!(err.to_string().contains("upstream status 503"));
        m.assert_hits(1);
    }

    #[tokio::test]
    async fn it_sets_request_id_and_user_agent() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/integers/")
                .header_exists("x-request-id")
                .header("user-agent", crate::infra::http::headers::USER_AGENT);
            then.status(200).body("2");
        });
        let cli = RandomOrgClient::new(server.base_url()).unwrap();
        let _ = cli.fetch_integer(1, 2).await.unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn connection_failure_is_an_http_error() {
        let cli = RandomOrgClient::new("http://127.0.0.1:9").unwrap();
        let err = cli.fetch_integer(1, 2).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
    }

    #[test]
    fn parses_plain_integer_bodies() {
        assert_eq!(parse_plain_integer(" 17\n").unwrap(), 17);
        assert!(parse_plain_integer("").is_err());
        assert!(parse_plain_integer("1.5").is_err());
    }
}

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Number;

use crate::domain::{FlipError, FlipRequest, FlipResult, RandomIntegerSource};
use crate::infra::runtime::mcp_transport::ServerHandler;
use crate::tools::coin_flip::CoinFlipResolver;

pub const SERVER_NAME: &str = "coin-flip-server";
pub const TOOL_NAME: &str = "flip_coin";

/// Arguments of `flip_coin` as they arrive on the wire.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct FlipArgs {
    /// Number of sides (default: 3)
    #[serde(default)]
    pub sides: Option<Number>,
    /// Optional custom names for sides (must match number of sides)
    #[serde(default, rename = "sideNames")]
    pub side_names: Option<Vec<String>>,
}

impl FlipArgs {
    pub fn into_request(self, default_sides: i64) -> Result<FlipRequest, FlipError> {
        let sides = match &self.sides {
            Some(n) => sides_from_number(n)?,
            None => default_sides,
        };
        Ok(match self.side_names {
            Some(names) => FlipRequest::with_names(sides, names),
            None => FlipRequest::new(sides),
        })
    }
}

/// Whole JSON numbers (`2`, `2.0`) become a side count. Any negative count
/// lands on the negative-sides outcome; positive fractions and counts past
/// `i64::MAX` cannot be flipped.
fn sides_from_number(n: &Number) -> Result<i64, FlipError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f < 0.0 {
        return Ok(f.floor() as i64);
    }
    if f.fract() == 0.0 && f < i64::MAX as f64 {
        return Ok(f as i64);
    }
    Err(FlipError::UnsupportedSides(n.to_string()))
}

impl From<FlipResult> for CallToolResult {
    fn from(r: FlipResult) -> Self {
        let content = vec![Content::text(r.text)];
        if r.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

#[derive(Clone)]
pub struct CoinFlipSvc {
    resolver: CoinFlipResolver,
    default_sides: i64,
}

impl CoinFlipSvc {
    pub fn new(source: Arc<dyn RandomIntegerSource>, default_sides: i64) -> Self {
        Self { resolver: CoinFlipResolver::new(source), default_sides }
    }
}

impl ServerHandler for CoinFlipSvc {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.into();
        info.server_info.version = env!("CARGO_PKG_VERSION").into();
        info.instructions = Some(
            "Call flip_coin to draw a truly random outcome from random.org. \
             Omit sides for a ternary -/0/+ flip."
                .into(),
        );
        info
    }
}

#[rmcp::tool_router]
impl CoinFlipSvc {
    #[rmcp::tool(
        name = "flip_coin",
        description = "Flip a coin with n sides using true randomness from random.org. For 3-sided coins, try creative side names like:\n- past/present/future (temporal analysis)\n- true/unknown/false (epistemic states)\n- win/draw/lose (outcome evaluation)\n- rock/paper/scissors (cyclic relationships)\n- less/same/more (abstraction levels)\n- below/within/above (hierarchical positioning)\n- predecessor/current/successor (ordinal progression)\n\nMeta-usage patterns:\n1. Use less/same/more to guide abstraction level of discourse\n2. Use past/present/future to determine temporal focus\n3. Chain multiple flips to create decision trees\n4. Use predecessor/current/successor for ordinal analysis\n\nOrdinal Meta-patterns:\n- Use predecessor to refine previous concepts\n- Use current to stabilize existing patterns\n- Use successor to evolve into new forms\n\nDefault ternary values are -/0/+"
    )]
    async fn flip_coin(
        &self,
        params: Parameters<FlipArgs>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let Parameters(args) = params;
        let request = match args.into_request(self.default_sides) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "flip_coin rejected arguments");
                return Ok(FlipResult::error(e.to_string()).into());
            }
        };
        tracing::debug!(sides = request.sides, named = request.side_names.is_some(), "flip_coin invoked");
        let result = self.resolver.resolve(&request).await;
        tracing::trace!(text = %result.text, is_error = result.is_error, "flip_coin result");
        Ok(result.into())
    }
}

pub type CoinFlipRouter = ToolRouter<CoinFlipSvc>;

impl CoinFlipSvc {
    pub fn router() -> CoinFlipRouter {
        // Wrapper to expose the macro-generated private tool_router
        Self::tool_router()
    }
}

/// Factory required by rmcp Streamable HTTP & stdio transports:
/// must return a `(handler, ToolRouter<handler>)` pair.
pub fn factory_with_source(
    source: Arc<dyn RandomIntegerSource>,
    default_sides: i64,
) -> impl Fn() -> (CoinFlipSvc, CoinFlipRouter) + Clone + Send + Sync + 'static {
    move || (CoinFlipSvc::new(source.clone(), default_sides), CoinFlipSvc::router())
}

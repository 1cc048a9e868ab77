use std::sync::Arc;

use crate::domain::{FlipError, FlipRequest, FlipResult, RandomIntegerSource, SourceError};

pub const VANISHED: &str = "The coin vanished into another dimension! 🌀";
pub const SINGLE_SIDE: &str = "_";
pub const NEGATIVE_SIDES: &str = "Cannot flip a coin with negative sides!";

/// Turns a [`FlipRequest`] into a [`FlipResult`], asking the random source
/// only when more than one outcome is possible.
#[derive(Clone)]
pub struct CoinFlipResolver {
    source: Arc<dyn RandomIntegerSource>,
}

impl CoinFlipResolver {
    pub fn new(source: Arc<dyn RandomIntegerSource>) -> Self {
        Self { source }
    }

    pub async fn resolve(&self, request: &FlipRequest) -> FlipResult {
        match self.try_resolve(request).await {
            Ok(text) => FlipResult::ok(text),
            Err(e) => {
                tracing::warn!(sides = request.sides, error = %e, "flip_coin failed");
                FlipResult::error(e.to_string())
            }
        }
    }

    async fn try_resolve(&self, request: &FlipRequest) -> Result<String, FlipError> {
        let sides = request.sides;
        if let Some(names) = &request.side_names {
            if usize::try_from(sides).ok() != Some(names.len()) {
                return Err(FlipError::SideNameMismatch { names: names.len(), sides });
            }
        }

        match sides {
            0 => return Ok(VANISHED.to_owned()),
            1 => return Ok(SINGLE_SIDE.to_owned()),
            s if s < 0 => return Ok(NEGATIVE_SIDES.to_owned()),
            _ => {}
        }

        let roll = self.source.fetch_integer(1, sides).await?;
        if !(1..=sides).contains(&roll) {
            return Err(SourceError::OutOfRange { value: roll, min: 1, max: sides }.into());
        }
        tracing::debug!(sides, roll, "flip_coin rolled");
        Ok(label_for(sides, roll, request.side_names.as_deref()))
    }
}

/// Maps an in-range roll to its label. `roll` is 1-based.
fn label_for(sides: i64, roll: i64, names: Option<&[String]>) -> String {
    if let Some(names) = names {
        // in range and names.len() == sides, checked by the caller
        return names[(roll - 1) as usize].to_lowercase();
    }
    match (sides, roll) {
        (2, 1) => "heads".to_owned(),
        (2, _) => "tails".to_owned(),
        (3, 1) => "-".to_owned(),
        (3, 2) => "0".to_owned(),
        (3, _) => "+".to_owned(),
        _ => format!("side {roll}"),
    }
}

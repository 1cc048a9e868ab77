pub mod coin_flip;
pub mod tool_router;

//! MCP server exposing a single `flip_coin` tool backed by random.org.

pub mod cli;
pub mod clients;
pub mod domain;
pub mod infra;
pub mod tools;

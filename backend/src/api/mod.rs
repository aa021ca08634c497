//! HTTP API module.
//!
//! This module provides the offers API server, its token handling and the
//! log broadcaster shared with the conversion pipeline.

pub mod auth;
pub mod logs;
pub mod offers;
pub mod server;

pub use auth::{bearer_token, Claims, TokenIssuer};
pub use logs::*;
pub use offers::{filter_offers, load_offers, matches_filters, parse_filters, OffersResponse};
pub use server::{router, start_server, AppState, ServerConfig};

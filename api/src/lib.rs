//! Faucet HTTP API.
//!
//! Exposes the faucet service over JSON:
//! - `POST /api/verify-post` issues an attestation token
//! - `POST /api/claim` redeems one for a transfer
//! - `GET /api/eligibility/{wallet}` and `GET /api/history/{wallet}`
//! - `POST /api/verify-transaction`, `GET /api/status`
//! - `GET /health`, `GET /metrics`, `DELETE /admin/posts/{post_id}`

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, serve};

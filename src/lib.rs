//! Task Manager API Library
//!
//! A REST service storing task documents, plus the client-side task board
//! that talks to it.
//!
//! - [`domain`]: task records, identifiers and partial updates
//! - [`infrastructure`]: storage backends and the repository factory
//! - [`api`]: axum handlers, request/response bodies and error mapping
//! - [`client`]: HTTP client, optimistic board state and its view

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;

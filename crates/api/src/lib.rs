//! HTTP API: server wiring, the request pipeline and route handlers.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;

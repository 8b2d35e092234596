//! HTTP middleware stack for the server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (answers preflight, decorates every response)
//! 5. Routing, where unregistered methods become 405
//! 6. Extractors: [`RequireAuth`] / [`RequireAdmin`], then the JSON body

pub mod auth;
pub mod cors;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use cors::cors_middleware;
pub use request_id::request_id_middleware;

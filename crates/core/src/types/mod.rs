//! Core types for the food ordering backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod queue;
pub mod status;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use queue::{QueueNumber, ZeroQueueNumber};
pub use status::OrderStatus;

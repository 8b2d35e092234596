//! Business logic services.
//!
//! # Services
//!
//! - `identity` - Bearer token verification against the identity provider
//! - `sequencer` - Queue number assignment for new orders
//! - `orders` - Order validation, placement and listing
//! - `menu` - Menu listing, built-in defaults and seeding
//! - `profiles` - User profile upsert and lookup

pub mod identity;
pub mod menu;
pub mod orders;
pub mod profiles;
pub mod sequencer;

pub use identity::{AccountLookupVerifier, IdentityError, IdentityVerifier, StaticIdentityVerifier};
pub use sequencer::{OrderSequencer, QueueSequencer, SequencerError};

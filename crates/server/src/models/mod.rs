//! Domain models exchanged with clients and stored as documents.
//!
//! Field names are camelCase on the wire and in the store, matching what the
//! mobile client reads.

pub mod identity;
pub mod menu;
pub mod order;
pub mod profile;

pub use identity::Identity;
pub use menu::MenuItem;
pub use order::{NewOrder, Order, OrderReceipt};
pub use profile::UserProfile;

//! Types library for the RiseFi yield vault
//!
//! Primitives shared by the vault core and the simulation harness.
//!
//! # Modules
//! - `ids`: Addresses, the dead-share sink, redemption identifiers
//! - `numeric`: 256-bit rounding arithmetic and decimal rendering
//! - `interfaces`: Traits for the base asset token and the external yield protocol
//! - `errors`: Error taxonomy of the external collaborators

pub mod ids;
pub mod numeric;
pub mod interfaces;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::interfaces::*;
    pub use crate::errors::*;
}

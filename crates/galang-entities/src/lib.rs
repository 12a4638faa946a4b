//! sea-orm entities for the Galang donation platform.
//!
//! One module per table. Balances and amounts are whole Rupiah (`i64`).

pub mod prelude;

pub mod campaigns;
pub mod donations;
pub mod proofs;
pub mod sessions;
pub mod users;
pub mod withdrawals;

mod enums;

pub use enums::{DonationStatus, Role, WithdrawalStatus};

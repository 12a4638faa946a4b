pub use super::campaigns::Entity as Campaigns;
pub use super::donations::Entity as Donations;
pub use super::proofs::Entity as Proofs;
pub use super::sessions::Entity as Sessions;
pub use super::users::Entity as Users;
pub use super::withdrawals::Entity as Withdrawals;

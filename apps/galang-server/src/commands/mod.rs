pub mod create_admin;
pub mod export_donations;
pub mod migrate;
pub mod poll_once;
pub mod recompute;

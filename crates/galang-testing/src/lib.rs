mod fake_gateway;
mod fixture_stage;
mod ledger_snapshot;
mod test_fixture;

pub use fake_gateway::{FakeGateway, GatewayCall};
pub use fixture_stage::FixtureStage;
pub use ledger_snapshot::LedgerSnapshot;
pub use test_fixture::TestFixture;

/// Standard test constants
pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_PLATFORM_CALLBACK_TOKEN: &str = "platform-callback-token";
pub const TEST_DONATION_AMOUNT: i64 = 50_000; // Rp 50.000
pub const TEST_GOAL_AMOUNT: i64 = 10_000_000; // Rp 10 juta

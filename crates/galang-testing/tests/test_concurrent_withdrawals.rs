use galang_core::{Error, NewWithdrawal};
use galang_testing::{FixtureStage, LedgerSnapshot, TestFixture, TEST_DONATION_AMOUNT};

const REQUESTS: usize = 8;
const REQUEST_AMOUNT: i64 = 40_000;

/// Test that simultaneous withdrawal requests cannot overdraw the owner
///
/// **Test flow:**
/// 1. Ended campaign credited one donation to the owner
/// 2. Fire several withdrawals at once, each larger than half the balance
/// 3. Verify exactly one was accepted and the rest were refused for insufficient funds
/// 4. Verify withdrawable reflects one reservation and never went negative
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals() {
    let mut test = TestFixture::new().await;

    // 1. Owner holds one donation
    test.jump_to(FixtureStage::CampaignEnded).await;
    let before = LedgerSnapshot::capture(&test).await;
    assert_eq!(before.owner_withdrawable, TEST_DONATION_AMOUNT);

    // 2. Race
    let handles: Vec<_> = (0..REQUESTS)
        .map(|i| {
            let funds = test.platform.funds.clone();
            let creator = test.creator;
            tokio::spawn(async move {
                funds
                    .request_withdrawal(
                        &creator,
                        NewWithdrawal {
                            amount: REQUEST_AMOUNT,
                            bank_name: "BCA".to_string(),
                            account_number: format!("12345678{i:02}"),
                            account_holder: "creator".to_string(),
                            campaign_id: None,
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(Error::InsufficientFunds { requested, .. }) => {
                assert_eq!(requested, REQUEST_AMOUNT)
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // 3. One winner
    assert_eq!(accepted, 1);
    assert_eq!(
        test.platform
            .funds
            .list_withdrawals(&test.creator)
            .await
            .unwrap()
            .len(),
        1
    );

    // 4. Balances
    let after = LedgerSnapshot::capture(&test).await;
    assert_eq!(after.owner_current, TEST_DONATION_AMOUNT);
    assert_eq!(after.owner_withdrawable, TEST_DONATION_AMOUNT - REQUEST_AMOUNT);
    after.assert_balances_sane();
}

use galang_core::{InvoiceOutcome, NewWithdrawal};
use galang_testing::{
    FixtureStage, LedgerSnapshot, TestFixture, TEST_DONATION_AMOUNT,
    TEST_PLATFORM_CALLBACK_TOKEN,
};
use galang_xendit::InvoiceStatus;

const ROUNDS: usize = 5;
const WITHDRAWALS: i64 = 4;
const WITHDRAWAL_AMOUNT: i64 = 5_000;

/// Test that rebuilding a user's balances does not erase reservations made meanwhile
///
/// **Test flow:**
/// 1. Owner of an ended campaign holds one donation
/// 2. Request several withdrawals while an admin recomputes the owner's balances
/// 3. Verify every reservation is reflected in withdrawable funds
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recompute_user_races_withdrawals() {
    for round in 0..ROUNDS {
        // 1. Funds available
        let mut test = TestFixture::new().await;
        test.jump_to(FixtureStage::CampaignEnded).await;

        // 2. Race
        let mut handles = Vec::new();
        for i in 0..WITHDRAWALS {
            let funds = test.platform.funds.clone();
            let creator = test.creator;
            handles.push(tokio::spawn(async move {
                funds
                    .request_withdrawal(
                        &creator,
                        NewWithdrawal {
                            amount: WITHDRAWAL_AMOUNT,
                            bank_name: "Mandiri".to_string(),
                            account_number: format!("13700000{i:02}"),
                            account_holder: "creator".to_string(),
                            campaign_id: None,
                        },
                    )
                    .await
                    .map(|_| ())
            }));
        }
        let funds = test.platform.funds.clone();
        let (admin, owner_id) = (test.admin, test.creator.user_id);
        let recompute =
            tokio::spawn(async move { funds.recompute_user(&admin, owner_id).await });

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        recompute.await.unwrap().unwrap();

        // 3. Nothing lost
        let snapshot = LedgerSnapshot::capture(&test).await;
        assert_eq!(snapshot.owner_current, TEST_DONATION_AMOUNT, "round {round}");
        assert_eq!(
            snapshot.owner_withdrawable,
            TEST_DONATION_AMOUNT - WITHDRAWALS * WITHDRAWAL_AMOUNT,
            "round {round}"
        );
        snapshot.assert_balances_sane();
    }
}

/// Test that rebuilding a campaign's total does not erase a payment credited meanwhile
///
/// **Test flow:**
/// 1. Pending donation whose invoice has just been paid
/// 2. Deliver the callback while an admin recomputes the campaign
/// 3. Verify collected includes the payment
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recompute_campaign_races_payment() {
    for round in 0..ROUNDS {
        // 1. Paid at the gateway
        let mut test = TestFixture::new().await;
        test.jump_to(FixtureStage::DonationPending).await;
        let donation = test.donation().await;
        let callback = test.invoice_becomes(&donation, InvoiceStatus::Paid);

        // 2. Race
        let donations = test.platform.donations.clone();
        let pay = tokio::spawn(async move {
            donations
                .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &callback)
                .await
        });
        let funds = test.platform.funds.clone();
        let (admin, campaign_id) = (test.admin, test.campaign_id());
        let recompute =
            tokio::spawn(async move { funds.recompute_campaign(&admin, campaign_id).await });

        assert_eq!(pay.await.unwrap().unwrap(), InvoiceOutcome::Credited);
        recompute.await.unwrap().unwrap();

        // 3. Counted once
        let snapshot = LedgerSnapshot::capture(&test).await;
        assert_eq!(snapshot.paid_donations, 1, "round {round}");
        assert_eq!(snapshot.collected, TEST_DONATION_AMOUNT, "round {round}");
    }
}

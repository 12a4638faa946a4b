use galang_core::InvoiceOutcome;
use galang_testing::{
    FixtureStage, LedgerSnapshot, TestFixture, TEST_DONATION_AMOUNT,
    TEST_PLATFORM_CALLBACK_TOKEN,
};
use galang_xendit::InvoiceStatus;

const ROUNDS: usize = 5;

/// Test that a payment landing while the campaign is being ended reaches the owner once
///
/// **Test flow:**
/// 1. Pending donation whose invoice has just been paid
/// 2. Deliver the callback and end the campaign at the same time
/// 3. Verify the donation was credited and the campaign ended
/// 4. Verify the owner received the amount exactly once, whichever side won
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_races_payment() {
    for round in 0..ROUNDS {
        // 1. Paid at the gateway, not yet seen by us
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
        let campaigns = test.platform.campaigns.clone();
        let (creator, campaign_id) = (test.creator, test.campaign_id());
        let end = tokio::spawn(async move { campaigns.end(&creator, campaign_id).await });

        // 3. Both sides succeed
        assert_eq!(pay.await.unwrap().unwrap(), InvoiceOutcome::Credited);
        end.await.unwrap().unwrap();

        // 4. Credited exactly once
        let snapshot = LedgerSnapshot::capture(&test).await;
        assert!(snapshot.is_ended, "round {round}");
        assert_eq!(snapshot.paid_donations, 1, "round {round}");
        assert_eq!(snapshot.collected, TEST_DONATION_AMOUNT, "round {round}");
        assert_eq!(snapshot.owner_current, TEST_DONATION_AMOUNT, "round {round}");
        assert_eq!(snapshot.owner_withdrawable, TEST_DONATION_AMOUNT, "round {round}");
    }
}

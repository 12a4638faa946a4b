use galang_core::{Error, NewDonation};
use galang_testing::{FixtureStage, TestFixture, TEST_DONATION_AMOUNT};

/// Test the rules a donation must pass before any invoice is created
///
/// **Test flow:**
/// 1. Donation below the minimum → InvalidAmount
/// 2. Donation to an unknown campaign → NotFound
/// 3. Donation to an ended campaign → CampaignEnded
/// 4. Verify the gateway was never called
#[tokio::test]
async fn test_donation_validation() {
    let mut test = TestFixture::new().await;
    test.jump_to(FixtureStage::CampaignOpen).await;
    let minimum = TestFixture::settings().min_donation;

    // 1. Below minimum
    let err = test.try_donate(test.donor, minimum - 1).await.unwrap_err();
    assert!(matches!(err, Error::InvalidAmount(_)), "got {err:?}");

    // 2. Unknown campaign
    let err = test
        .platform
        .donations
        .create(
            &test.donor,
            NewDonation {
                campaign_id: 9_999,
                amount: TEST_DONATION_AMOUNT,
                message: None,
                is_anonymous: false,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");

    // 3. Ended campaign
    test.platform
        .campaigns
        .end(&test.creator, test.campaign_id())
        .await
        .unwrap();
    let err = test
        .try_donate(test.donor, TEST_DONATION_AMOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CampaignEnded(_)), "got {err:?}");

    // 4. No invoices were attempted
    assert!(test.gateway.calls().is_empty());
}

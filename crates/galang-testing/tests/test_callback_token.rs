use galang_core::{Error, XenditKeys};
use galang_testing::{
    FixtureStage, LedgerSnapshot, TestFixture, TEST_DONATION_AMOUNT,
    TEST_PLATFORM_CALLBACK_TOKEN,
};
use galang_xendit::InvoiceStatus;

/// Test callback authentication and lookup
///
/// **Test flow:**
/// 1. Callback with a wrong token → Unauthenticated, nothing credited
/// 2. Callback for an unknown external id → NotFound
/// 3. Owner connects their own account → the platform token is refused for invoices issued on it
/// 4. Owner's token is accepted
#[tokio::test]
async fn test_callback_token() {
    let mut test = TestFixture::new().await;
    test.jump_to(FixtureStage::DonationPending).await;
    let donation = test.donation().await;
    let callback = test.invoice_becomes(&donation, InvoiceStatus::Paid);
    let before = LedgerSnapshot::capture(&test).await;

    // 1. Wrong token
    for token in ["", "not-the-token"] {
        let err = test
            .platform
            .donations
            .handle_callback(token, &callback)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated), "got {err:?}");
    }
    assert_eq!(LedgerSnapshot::capture(&test).await, before);

    // 2. Unknown external id
    let mut unknown = callback.clone();
    unknown.external_id = "donation-0-deadbeef".to_string();
    let err = test
        .platform
        .donations
        .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");

    // 3. Owner connects their own account; new invoices are issued on it
    test.platform
        .accounts
        .set_xendit_keys(
            &test.creator,
            XenditKeys {
                secret_key: Some("xnd_development_creator".to_string()),
                callback_token: Some("creator-callback-token".to_string()),
            },
        )
        .await
        .unwrap();
    let merchant_donation = test
        .try_donate(test.donor, TEST_DONATION_AMOUNT)
        .await
        .unwrap();
    assert!(merchant_donation.merchant_owned);
    let merchant_callback = test.invoice_becomes(&merchant_donation, InvoiceStatus::Paid);
    let err = test
        .platform
        .donations
        .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &merchant_callback)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated), "got {err:?}");

    // 4. Accepted with the owner's token
    test.platform
        .donations
        .handle_callback("creator-callback-token", &merchant_callback)
        .await
        .unwrap();
    assert_eq!(LedgerSnapshot::capture(&test).await.paid_donations, 1);
}

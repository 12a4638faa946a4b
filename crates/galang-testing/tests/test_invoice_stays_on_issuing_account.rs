use galang_core::{Error, InvoiceOutcome, XenditKeys};
use galang_testing::{
    FixtureStage, GatewayCall, LedgerSnapshot, TestFixture, TEST_DONATION_AMOUNT,
    TEST_PLATFORM_CALLBACK_TOKEN,
};
use galang_xendit::InvoiceStatus;

/// Test that a donation keeps talking to the Xendit account its invoice was issued on,
/// even after the campaign owner changes their keys
///
/// **Test flow:**
/// 1. Donation is created while the owner has no keys (platform invoice)
/// 2. Owner connects their own account
/// 3. Polling the platform invoice still looks it up with the platform key
/// 4. Its callback is refused with the owner's token and accepted with the platform token
/// 5. A second donation is issued on the owner's account
/// 6. Owner disconnects; that invoice can no longer be polled or called back
#[tokio::test]
async fn test_invoice_stays_on_issuing_account() {
    let mut test = TestFixture::new().await;
    test.jump_to(FixtureStage::DonationPending).await;

    // 1. Platform invoice
    let donation = test.donation().await;
    assert!(!donation.merchant_owned);
    let invoice_id = donation.invoice_id.clone().unwrap();

    // 2. Owner connects
    let owner_keys = XenditKeys {
        secret_key: Some("xnd_owner".to_string()),
        callback_token: Some("owner-tok".to_string()),
    };
    test.platform
        .accounts
        .set_xendit_keys(&test.creator, owner_keys)
        .await
        .unwrap();

    // 3. Poll uses the platform key
    let report = test.platform.donations.poll_pending(10).await.unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(
        test.gateway.calls().last(),
        Some(&GatewayCall::GetInvoice {
            merchant_key: None,
            invoice_id: invoice_id.clone(),
        })
    );

    // 4. Callback authenticated against the platform token
    let callback = test.invoice_becomes(&donation, InvoiceStatus::Paid);
    let err = test
        .platform
        .donations
        .handle_callback("owner-tok", &callback)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated), "got {err:?}");

    let outcome = test
        .platform
        .donations
        .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &callback)
        .await
        .unwrap();
    assert_eq!(outcome, InvoiceOutcome::Credited);
    assert_eq!(test.campaign().await.collected, TEST_DONATION_AMOUNT);

    // 5. Owner-issued invoice
    let merchant_donation = test
        .try_donate(test.donor, TEST_DONATION_AMOUNT)
        .await
        .unwrap();
    assert!(merchant_donation.merchant_owned);

    // 6. Owner disconnects
    test.platform
        .accounts
        .set_xendit_keys(&test.creator, XenditKeys::default())
        .await
        .unwrap();
    let lookups_before = test.gateway.lookups();
    let report = test.platform.donations.poll_pending(10).await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(test.gateway.lookups(), lookups_before);

    let callback = test.invoice_becomes(&merchant_donation, InvoiceStatus::Paid);
    let err = test
        .platform
        .donations
        .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &callback)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthenticated), "got {err:?}");

    let snapshot = LedgerSnapshot::capture(&test).await;
    assert_eq!(snapshot.paid_donations, 1);
    snapshot.assert_balances_sane();
}

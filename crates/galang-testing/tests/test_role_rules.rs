use galang_core::{Error, PageRequest};
use galang_entities::Role;
use galang_testing::{FixtureStage, TestFixture};

/// Test who may do what
///
/// **Test flow:**
/// 1. A USER cannot create campaigns
/// 2. A non-owner creator cannot end or edit someone else's campaign
/// 3. Only admins reach admin operations
/// 4. After promotion the user can create campaigns
#[tokio::test]
async fn test_role_rules() {
    let mut test = TestFixture::new().await;
    test.jump_to(FixtureStage::CampaignOpen).await;
    let rival = test.register("rival@galang.test", Role::Creator).await;

    // 1. USER cannot create
    let err = test
        .platform
        .campaigns
        .create(
            &test.donor,
            galang_core::NewCampaign {
                title: "Not allowed".to_string(),
                description: String::new(),
                image_url: None,
                goal_amount: 1_000,
                deadline: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)), "got {err:?}");

    // 2. Not the owner
    let err = test
        .platform
        .campaigns
        .end(&rival, test.campaign_id())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)), "got {err:?}");
    let err = test
        .platform
        .campaigns
        .delete(&rival, test.campaign_id())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)), "got {err:?}");

    // 3. Admin-only operations
    for actor in [test.donor, test.creator, rival] {
        assert!(matches!(
            test.platform
                .accounts
                .list_users(&actor, PageRequest::default())
                .await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            test.platform.reports.stats(&actor).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            test.platform.funds.list_all_withdrawals(&actor, None).await,
            Err(Error::Forbidden(_))
        ));
    }
    let users = test
        .platform
        .accounts
        .list_users(&test.admin, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(users.total, 4);

    // 4. Promotion
    test.platform
        .accounts
        .set_role(&test.admin, test.donor.user_id, Role::Creator)
        .await
        .unwrap();
    let promoted = test
        .platform
        .accounts
        .login("donor@galang.test", galang_testing::TEST_PASSWORD)
        .await
        .unwrap();
    let actor = test
        .platform
        .accounts
        .authenticate(&promoted.token)
        .await
        .unwrap();
    assert_eq!(actor.role, Role::Creator);
    let campaign = test
        .platform
        .campaigns
        .create(
            &actor,
            galang_core::NewCampaign {
                title: "Now allowed".to_string(),
                description: String::new(),
                image_url: None,
                goal_amount: 1_000,
                deadline: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(campaign.owner_id, test.donor.user_id);
}

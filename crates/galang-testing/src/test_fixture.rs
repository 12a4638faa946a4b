use galang_core::{
    new_scratch_db, Actor, NewCampaign, NewDonation, Platform, Registration, Result, Settings,
};
use galang_entities::{campaigns, donations, users, Role};
use galang_xendit::{Invoice, InvoiceStatus};
use sea_orm::{DatabaseConnection, EntityTrait as _};
use std::sync::Arc;

use crate::{
    FakeGateway, FixtureStage, TEST_DONATION_AMOUNT, TEST_GOAL_AMOUNT, TEST_PASSWORD,
    TEST_PLATFORM_CALLBACK_TOKEN,
};

pub struct TestFixture {
    pub db: DatabaseConnection,
    pub gateway: Arc<FakeGateway>,
    pub platform: Platform,
    pub stage: FixtureStage,

    pub admin: Actor,
    pub creator: Actor,
    pub donor: Actor,

    campaign_id: Option<i32>,
    donation_id: Option<i32>,
}

impl TestFixture {
    /// Scratch database, fake gateway and three registered accounts.
    pub async fn new() -> Self {
        let db = new_scratch_db().await.expect("Failed to create scratch db");
        let gateway = Arc::new(FakeGateway::new(Some(TEST_PLATFORM_CALLBACK_TOKEN)));
        let platform = Platform::new(db.clone(), gateway.clone(), Self::settings());

        let admin = platform
            .accounts
            .create_admin("Admin", "admin@galang.test", TEST_PASSWORD)
            .await
            .expect("Failed to create admin");

        let mut test = Self {
            db,
            gateway,
            platform,
            stage: FixtureStage::UsersRegistered,
            admin: Actor::new(admin.id, admin.role),
            creator: Actor::new(0, Role::Creator),
            donor: Actor::new(0, Role::User),
            campaign_id: None,
            donation_id: None,
        };
        test.creator = test.register("creator@galang.test", Role::Creator).await;
        test.donor = test.register("donor@galang.test", Role::User).await;
        test
    }

    /// Cheap password hashing; everything else at production defaults.
    pub fn settings() -> Settings {
        Settings {
            password_rounds: 1,
            ..Settings::default()
        }
    }

    pub async fn register(&self, email: &str, role: Role) -> Actor {
        let user = self
            .platform
            .accounts
            .register(Registration {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password: TEST_PASSWORD.to_string(),
                role: Some(role),
            })
            .await
            .unwrap_or_else(|e| panic!("Failed to register {email}: {e:?}"));
        Actor::new(user.id, user.role)
    }

    pub async fn jump_to(&mut self, target_stage: FixtureStage) {
        let stages_to_step = FixtureStage::all()
            .iter()
            .copied()
            .filter(|s| *s > self.stage && *s <= target_stage)
            .collect::<Vec<_>>();

        for stage in stages_to_step {
            self.step_to(stage).await;
        }
    }

    pub async fn step_to(&mut self, stage: FixtureStage) {
        match stage {
            FixtureStage::UsersRegistered => {}
            FixtureStage::CampaignOpen => {
                let campaign = self
                    .try_create_campaign()
                    .await
                    .unwrap_or_else(|e| panic!("Failed to advance to {stage:?}: {e:?}"));
                self.campaign_id = Some(campaign.id);
            }
            FixtureStage::DonationPending => {
                let donation = self
                    .try_donate(self.donor, TEST_DONATION_AMOUNT)
                    .await
                    .unwrap_or_else(|e| panic!("Failed to advance to {stage:?}: {e:?}"));
                self.donation_id = Some(donation.id);
            }
            FixtureStage::DonationPaid => {
                let donation = self.donation().await;
                let callback = self.invoice_becomes(&donation, InvoiceStatus::Paid);
                self.platform
                    .donations
                    .handle_callback(TEST_PLATFORM_CALLBACK_TOKEN, &callback)
                    .await
                    .unwrap_or_else(|e| panic!("Failed to advance to {stage:?}: {e:?}"));
            }
            FixtureStage::CampaignEnded => {
                self.platform
                    .campaigns
                    .end(&self.creator, self.campaign_id())
                    .await
                    .unwrap_or_else(|e| panic!("Failed to advance to {stage:?}: {e:?}"));
            }
        }

        self.stage = stage;
    }

    pub async fn try_create_campaign(&self) -> Result<campaigns::Model> {
        self.platform
            .campaigns
            .create(
                &self.creator,
                NewCampaign {
                    title: "Clean water for Sumba".to_string(),
                    description: "Wells for three villages in East Sumba".to_string(),
                    image_url: Some("https://cdn.galang.test/sumba.jpg".to_string()),
                    goal_amount: TEST_GOAL_AMOUNT,
                    deadline: None,
                },
            )
            .await
    }

    /// Donate to the fixture campaign.
    pub async fn try_donate(&self, donor: Actor, amount: i64) -> Result<donations::Model> {
        self.platform
            .donations
            .create(
                &donor,
                NewDonation {
                    campaign_id: self.campaign_id(),
                    amount,
                    message: Some("Semoga bermanfaat".to_string()),
                    is_anonymous: false,
                },
            )
            .await
    }

    /// Move the donation's invoice to `status` at the gateway and return the callback body.
    pub fn invoice_becomes(&self, donation: &donations::Model, status: InvoiceStatus) -> Invoice {
        let invoice_id = donation
            .invoice_id
            .as_deref()
            .expect("Donation has no invoice");
        self.gateway.set_status(invoice_id, status)
    }

    pub fn campaign_id(&self) -> i32 {
        self.campaign_id
            .expect("Fixture has no campaign yet; jump_to(CampaignOpen) first")
    }

    pub async fn campaign(&self) -> campaigns::Model {
        campaigns::Entity::find_by_id(self.campaign_id())
            .one(&self.db)
            .await
            .unwrap()
            .expect("Fixture campaign disappeared")
    }

    /// The donation made by `jump_to(DonationPending)`, as currently stored.
    pub async fn donation(&self) -> donations::Model {
        let id = self
            .donation_id
            .expect("Fixture has no donation yet; jump_to(DonationPending) first");
        self.reload_donation(id).await
    }

    pub async fn reload_donation(&self, id: i32) -> donations::Model {
        donations::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("Donation {id} not found"))
    }

    pub async fn user(&self, user_id: i32) -> users::Model {
        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("User {user_id} not found"))
    }
}

//! Row seeding for unit tests inside this crate.

use chrono::Utc;
use galang_entities::{campaigns, users, Role};
use sea_orm::{ActiveModelTrait as _, ActiveValue::Set, DatabaseConnection};

pub(crate) async fn seed_user(db: &DatabaseConnection, email: &str, role: Role) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        password_hash: Set(crate::password::hash_password("password123", 1)),
        role: Set(role),
        current_funds: Set(0),
        withdrawable_funds: Set(0),
        xendit_secret_key: Set(None),
        xendit_callback_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) async fn seed_campaign(
    db: &DatabaseConnection,
    owner_id: i32,
    goal_amount: i64,
) -> campaigns::Model {
    let now = Utc::now();
    campaigns::ActiveModel {
        owner_id: Set(owner_id),
        title: Set("Clean water for Sumba".to_string()),
        description: Set("Wells for three villages".to_string()),
        image_url: Set(None),
        goal_amount: Set(goal_amount),
        collected: Set(0),
        is_ended: Set(false),
        is_implemented: Set(false),
        deadline: Set(None),
        ended_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub(crate) async fn seed_donation(
    db: &DatabaseConnection,
    campaign_id: i32,
    user_id: i32,
    amount: i64,
    status: galang_entities::DonationStatus,
) -> galang_entities::donations::Model {
    use galang_entities::donations;

    let now = Utc::now();
    donations::ActiveModel {
        campaign_id: Set(campaign_id),
        user_id: Set(user_id),
        amount: Set(amount),
        method: Set(donations::METHOD_INVOICE.to_string()),
        status: Set(status),
        external_id: Set(format!(
            "donation-{campaign_id}-{}",
            crate::password::new_reference()
        )),
        invoice_id: Set(None),
        invoice_url: Set(None),
        message: Set(None),
        is_anonymous: Set(false),
        merchant_owned: Set(false),
        paid_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

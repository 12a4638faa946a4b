use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string_uniq(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Role, 16))
                    .col(big_integer(Users::CurrentFunds).default(0i64))
                    .col(big_integer(Users::WithdrawableFunds).default(0i64))
                    .col(string_null(Users::XenditSecretKey))
                    .col(string_null(Users::XenditCallbackToken))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(pk_auto(Sessions::Id))
                    .col(integer(Sessions::UserId))
                    .col(string_uniq(Sessions::TokenHash))
                    .col(timestamp_with_time_zone(Sessions::ExpiresAt))
                    .col(timestamp_with_time_zone(Sessions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(pk_auto(Campaigns::Id))
                    .col(integer(Campaigns::OwnerId))
                    .col(string(Campaigns::Title))
                    .col(text(Campaigns::Description))
                    .col(string_null(Campaigns::ImageUrl))
                    .col(big_integer(Campaigns::GoalAmount))
                    .col(big_integer(Campaigns::Collected).default(0i64))
                    .col(boolean(Campaigns::IsEnded).default(false))
                    .col(boolean(Campaigns::IsImplemented).default(false))
                    .col(timestamp_with_time_zone_null(Campaigns::Deadline))
                    .col(timestamp_with_time_zone_null(Campaigns::EndedAt))
                    .col(timestamp_with_time_zone(Campaigns::CreatedAt))
                    .col(timestamp_with_time_zone(Campaigns::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Campaigns::Table, Campaigns::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donations::Table)
                    .if_not_exists()
                    .col(pk_auto(Donations::Id))
                    .col(integer(Donations::CampaignId))
                    .col(integer(Donations::UserId))
                    .col(big_integer(Donations::Amount))
                    .col(string(Donations::Method))
                    .col(string_len(Donations::Status, 16))
                    .col(string_uniq(Donations::ExternalId))
                    .col(string_null(Donations::InvoiceId))
                    .col(string_null(Donations::InvoiceUrl))
                    .col(text_null(Donations::Message))
                    .col(boolean(Donations::IsAnonymous).default(false))
                    .col(boolean(Donations::MerchantOwned).default(false))
                    .col(timestamp_with_time_zone_null(Donations::PaidAt))
                    .col(timestamp_with_time_zone(Donations::CreatedAt))
                    .col(timestamp_with_time_zone(Donations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Donations::Table, Donations::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Donations::Table, Donations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The poller scans pending donations; campaign pages list paid ones.
        manager
            .create_index(
                Index::create()
                    .name("idx_donations_campaign_status")
                    .table(Donations::Table)
                    .col(Donations::CampaignId)
                    .col(Donations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(pk_auto(Withdrawals::Id))
                    .col(integer(Withdrawals::UserId))
                    .col(integer_null(Withdrawals::CampaignId))
                    .col(big_integer(Withdrawals::Amount))
                    .col(string_len(Withdrawals::Status, 16))
                    .col(string(Withdrawals::BankName))
                    .col(string(Withdrawals::AccountNumber))
                    .col(string(Withdrawals::AccountHolder))
                    .col(text_null(Withdrawals::Note))
                    .col(timestamp_with_time_zone_null(Withdrawals::ProcessedAt))
                    .col(timestamp_with_time_zone(Withdrawals::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Withdrawals::Table, Withdrawals::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Withdrawals::Table, Withdrawals::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Proofs::Table)
                    .if_not_exists()
                    .col(pk_auto(Proofs::Id))
                    .col(integer(Proofs::CampaignId))
                    .col(integer(Proofs::UploadedBy))
                    .col(string(Proofs::ImageUrl))
                    .col(text_null(Proofs::Caption))
                    .col(timestamp_with_time_zone(Proofs::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Proofs::Table, Proofs::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Proofs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Withdrawals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Donations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,        // stored lower-cased
    PasswordHash, // sha256$rounds$salt$digest
    Role,         // USER | CREATOR | ADMIN
    CurrentFunds,
    WithdrawableFunds, // <= current_funds
    XenditSecretKey,
    XenditCallbackToken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    UserId, // foreign key to users.id
    TokenHash,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    OwnerId, // foreign key to users.id
    Title,
    Description,
    ImageUrl,
    GoalAmount,
    Collected, // sum of paid donations (Rupiah)
    IsEnded,
    IsImplemented,
    Deadline,
    EndedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
    CampaignId, // foreign key to campaigns.id
    UserId,     // foreign key to users.id
    Amount,
    Method,
    Status, // PENDING | PAID | EXPIRED | FAILED
    ExternalId,
    InvoiceId,
    InvoiceUrl,
    Message,
    IsAnonymous,
    MerchantOwned,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,     // foreign key to users.id
    CampaignId, // optional foreign key to campaigns.id
    Amount,
    Status, // PENDING | APPROVED | REJECTED
    BankName,
    AccountNumber,
    AccountHolder,
    Note,
    ProcessedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Proofs {
    Table,
    Id,
    CampaignId, // foreign key to campaigns.id
    UploadedBy,
    ImageUrl,
    Caption,
    CreatedAt,
}

use chrono::Utc;
use galang_entities::proofs;
use sea_orm::{
    ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, DatabaseConnection,
    EntityTrait as _, ModelTrait as _, QueryFilter as _, QueryOrder as _,
};
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::{campaigns, Actor, Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProof {
    pub campaign_id: i32,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Photos and receipts showing how a campaign spent its money.
#[derive(Clone)]
pub struct Proofs {
    db: DatabaseConnection,
}

impl Proofs {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add(&self, actor: &Actor, new: NewProof) -> Result<proofs::Model> {
        let campaign = campaigns::find(&self.db, new.campaign_id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;
        let image_url = parse_image_url(&new.image_url)?;

        let proof = proofs::ActiveModel {
            campaign_id: Set(campaign.id),
            uploaded_by: Set(actor.user_id),
            image_url: Set(image_url),
            caption: Set(new
                .caption
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(proof_id = proof.id, campaign_id = campaign.id, "Added proof");
        Ok(proof)
    }

    pub async fn list(&self, campaign_id: i32) -> Result<Vec<proofs::Model>> {
        campaigns::find(&self.db, campaign_id).await?;
        Ok(proofs::Entity::find()
            .filter(proofs::Column::CampaignId.eq(campaign_id))
            .order_by_desc(proofs::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn delete(&self, actor: &Actor, id: i32) -> Result<()> {
        let proof = proofs::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("Proof", id))?;
        let campaign = campaigns::find(&self.db, proof.campaign_id).await?;
        actor.require_owner_or_admin(campaign.owner_id)?;

        proof.delete(&self.db).await?;
        info!(proof_id = id, by = actor.user_id, "Deleted proof");
        Ok(())
    }
}

/// Accept absolute http(s) URLs only.
pub(crate) fn parse_image_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|err| Error::validation(format!("image url is invalid: {err}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url.to_string()),
        _ => Err(Error::validation("image url must use http or https")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::new_scratch_db;
    use crate::testing::{seed_campaign, seed_user};
    use galang_entities::Role;

    #[test]
    fn test_parse_image_url() {
        assert_eq!(
            parse_image_url(" https://cdn.example.com/a.jpg ").unwrap(),
            "https://cdn.example.com/a.jpg"
        );
        assert!(parse_image_url("http://example.com/receipt.png").is_ok());
        assert!(parse_image_url("javascript:alert(1)").is_err());
        assert!(parse_image_url("/relative.png").is_err());
        assert!(parse_image_url("file:///etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_owner_adds_and_deletes_proofs() {
        let db = new_scratch_db().await.unwrap();
        let owner = seed_user(&db, "owner@example.com", Role::Creator).await;
        let stranger = seed_user(&db, "stranger@example.com", Role::Creator).await;
        let admin = seed_user(&db, "admin@example.com", Role::Admin).await;
        let campaign = seed_campaign(&db, owner.id, 1_000).await;
        let proofs = Proofs::new(db);

        let new = |caption: Option<&str>| NewProof {
            campaign_id: campaign.id,
            image_url: "https://cdn.example.com/well.jpg".into(),
            caption: caption.map(str::to_string),
        };

        assert!(matches!(
            proofs
                .add(&Actor::new(stranger.id, stranger.role), new(None))
                .await,
            Err(Error::Forbidden(_))
        ));

        let first = proofs
            .add(&Actor::new(owner.id, owner.role), new(Some("Drilling")))
            .await
            .unwrap();
        let second = proofs
            .add(&Actor::new(admin.id, admin.role), new(Some("  ")))
            .await
            .unwrap();
        assert_eq!(second.caption, None);

        let listed = proofs.list(campaign.id).await.unwrap();
        assert_eq!(
            listed.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        assert!(matches!(
            proofs
                .delete(&Actor::new(stranger.id, stranger.role), first.id)
                .await,
            Err(Error::Forbidden(_))
        ));
        proofs
            .delete(&Actor::new(owner.id, owner.role), first.id)
            .await
            .unwrap();
        assert_eq!(proofs.list(campaign.id).await.unwrap().len(), 1);
        assert!(matches!(
            proofs.list(9_999).await,
            Err(Error::NotFound { .. })
        ));
    }
}

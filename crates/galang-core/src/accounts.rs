use chrono::{DateTime, Utc};
use galang_entities::{sessions, users, Role};
use sea_orm::{
    ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, DatabaseConnection,
    EntityTrait as _, IntoActiveModel as _, ModelTrait as _, PaginatorTrait as _,
    QueryFilter as _, QueryOrder as _,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    password::{hash_password, new_session_token, token_hash, verify_password},
    Actor, Error, Page, PageRequest, Result, Settings,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Bearer token handed out by `login`. The token is shown once and only its hash is stored.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: users::Model,
}

/// Per-user Xendit merchant credentials. Empty or missing values clear the stored key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XenditKeys {
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub callback_token: Option<String>,
}

#[derive(Clone)]
pub struct Accounts {
    db: DatabaseConnection,
    settings: Arc<Settings>,
}

impl Accounts {
    pub fn new(db: DatabaseConnection, settings: Arc<Settings>) -> Self {
        Self { db, settings }
    }

    /// Self-service sign-up. Only `USER` and `CREATOR` may be chosen.
    pub async fn register(&self, registration: Registration) -> Result<users::Model> {
        let role = registration.role.unwrap_or_default();
        if role.is_admin() {
            return Err(Error::validation("role must be USER or CREATOR"));
        }

        let user = self
            .insert_user(
                &registration.name,
                &registration.email,
                &registration.password,
                role,
            )
            .await?;
        info!(user_id = user.id, role = ?user.role, "Registered user");
        Ok(user)
    }

    /// Bootstrap an administrator from the command line.
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> Result<users::Model> {
        let user = self.insert_user(name, email, password, Role::Admin).await?;
        info!(user_id = user.id, "Created admin");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession> {
        let email = normalize_email(email);
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            debug!(user_id = user.id, "Password mismatch");
            return Err(Error::InvalidCredentials);
        }

        let token = new_session_token();
        let now = Utc::now();
        let expires_at = now + self.settings.session_ttl;
        sessions::ActiveModel {
            user_id: Set(user.id),
            token_hash: Set(token_hash(&token)),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginSession {
            token,
            expires_at,
            user,
        })
    }

    /// Resolve a bearer token to the user behind it.
    pub async fn authenticate(&self, token: &str) -> Result<Actor> {
        if token.is_empty() {
            return Err(Error::Unauthenticated);
        }

        let session = sessions::Entity::find()
            .filter(sessions::Column::TokenHash.eq(token_hash(token)))
            .one(&self.db)
            .await?
            .ok_or(Error::Unauthenticated)?;

        if session.expires_at <= Utc::now() {
            debug!(session_id = session.id, "Session expired");
            session.delete(&self.db).await?;
            return Err(Error::Unauthenticated);
        }

        let user = users::Entity::find_by_id(session.user_id)
            .one(&self.db)
            .await?
            .ok_or(Error::Unauthenticated)?;

        Ok(Actor::new(user.id, user.role))
    }

    /// Forget a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::TokenHash.eq(token_hash(token)))
            .exec(&self.db)
            .await?;
        debug!(removed = result.rows_affected, "Logged out");
        Ok(())
    }

    pub async fn profile(&self, user_id: i32) -> Result<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::not_found("User", user_id))
    }

    /// Connect (or disconnect) the actor's own Xendit account.
    pub async fn set_xendit_keys(&self, actor: &Actor, keys: XenditKeys) -> Result<users::Model> {
        actor.require_creator()?;

        let mut user = self.profile(actor.user_id).await?.into_active_model();
        user.xendit_secret_key = Set(non_empty(keys.secret_key));
        user.xendit_callback_token = Set(non_empty(keys.callback_token));
        user.updated_at = Set(Utc::now());
        let user = user.update(&self.db).await?;

        info!(
            user_id = user.id,
            own_gateway = user.has_own_gateway(),
            "Updated Xendit keys"
        );
        Ok(user)
    }

    pub async fn list_users(&self, actor: &Actor, page: PageRequest) -> Result<Page<users::Model>> {
        actor.require_admin()?;

        let paginator = users::Entity::find()
            .order_by_desc(users::Column::Id)
            .paginate(&self.db, page.size());
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;

        Ok(Page {
            items,
            page: page.index() + 1,
            per_page: page.size(),
            total,
        })
    }

    pub async fn set_role(&self, actor: &Actor, user_id: i32, role: Role) -> Result<users::Model> {
        actor.require_admin()?;
        if actor.user_id == user_id && !role.is_admin() {
            return Err(Error::forbidden("admins cannot demote themselves"));
        }

        let mut user = self.profile(user_id).await?.into_active_model();
        user.role = Set(role);
        user.updated_at = Set(Utc::now());
        let user = user.update(&self.db).await?;

        info!(user_id, role = ?role, by = actor.user_id, "Changed role");
        Ok(user)
    }

    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<users::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name is required"));
        }
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(Error::validation("email is invalid"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let now = Utc::now();
        users::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.clone()),
            password_hash: Set(hash_password(password, self.settings.password_rounds)),
            role: Set(role),
            current_funds: Set(0),
            withdrawable_funds: Set(0),
            xendit_secret_key: Set(None),
            xendit_callback_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| Error::from_insert(err, || format!("email {email} is already registered")))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::new_scratch_db;

    async fn accounts() -> Accounts {
        let settings = Settings {
            password_rounds: 2,
            ..Settings::default()
        };
        Accounts::new(new_scratch_db().await.unwrap(), Arc::new(settings))
    }

    fn registration(email: &str, role: Option<Role>) -> Registration {
        Registration {
            name: "Sari".into(),
            email: email.into(),
            password: "hunter2hunter2".into(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_defaults_role() {
        let accounts = accounts().await;
        let user = accounts
            .register(registration("  Sari@Example.COM ", None))
            .await
            .unwrap();
        assert_eq!(user.email, "sari@example.com");
        assert_eq!(user.role, Role::User);
        assert!(user.password_hash.starts_with("sha256$2$"));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let accounts = accounts().await;

        let err = accounts
            .register(registration("a@example.com", Some(Role::Admin)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let mut short = registration("b@example.com", None);
        short.password = "short".into();
        assert!(matches!(
            accounts.register(short).await,
            Err(Error::Validation(_))
        ));

        assert!(matches!(
            accounts.register(registration("not-an-email", None)).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let accounts = accounts().await;
        accounts
            .register(registration("dup@example.com", None))
            .await
            .unwrap();
        let err = accounts
            .register(registration("DUP@example.com", Some(Role::Creator)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_login_authenticate_logout() {
        let accounts = accounts().await;
        let user = accounts
            .register(registration("donor@example.com", Some(Role::Creator)))
            .await
            .unwrap();

        let session = accounts
            .login("DONOR@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);

        let actor = accounts.authenticate(&session.token).await.unwrap();
        assert_eq!(actor, Actor::new(user.id, Role::Creator));

        accounts.logout(&session.token).await.unwrap();
        assert!(matches!(
            accounts.authenticate(&session.token).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let accounts = accounts().await;
        accounts
            .register(registration("donor@example.com", None))
            .await
            .unwrap();

        let wrong_password = accounts.login("donor@example.com", "nope-nope").await;
        let wrong_email = accounts.login("nobody@example.com", "hunter2hunter2").await;
        assert!(matches!(wrong_password, Err(Error::InvalidCredentials)));
        assert!(matches!(wrong_email, Err(Error::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let db = new_scratch_db().await.unwrap();
        let settings = Settings {
            password_rounds: 2,
            session_ttl: chrono::Duration::seconds(-1),
            ..Settings::default()
        };
        let accounts = Accounts::new(db, Arc::new(settings));
        accounts
            .register(registration("donor@example.com", None))
            .await
            .unwrap();

        let session = accounts
            .login("donor@example.com", "hunter2hunter2")
            .await
            .unwrap();
        assert!(matches!(
            accounts.authenticate(&session.token).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            accounts.authenticate("garbage").await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_xendit_keys_require_creator() {
        let accounts = accounts().await;
        let donor = accounts
            .register(registration("donor@example.com", None))
            .await
            .unwrap();
        let creator = accounts
            .register(registration("creator@example.com", Some(Role::Creator)))
            .await
            .unwrap();

        let keys = XenditKeys {
            secret_key: Some("xnd_development_abc".into()),
            callback_token: Some(" tok ".into()),
        };
        assert!(matches!(
            accounts
                .set_xendit_keys(&Actor::new(donor.id, donor.role), keys.clone())
                .await,
            Err(Error::Forbidden(_))
        ));

        let updated = accounts
            .set_xendit_keys(&Actor::new(creator.id, creator.role), keys)
            .await
            .unwrap();
        assert!(updated.has_own_gateway());
        assert_eq!(updated.xendit_callback_token.as_deref(), Some("tok"));

        let cleared = accounts
            .set_xendit_keys(&Actor::new(creator.id, creator.role), XenditKeys::default())
            .await
            .unwrap();
        assert!(!cleared.has_own_gateway());
    }

    #[tokio::test]
    async fn test_admin_user_management() {
        let accounts = accounts().await;
        let admin = accounts
            .create_admin("Root", "root@example.com", "rootroot")
            .await
            .unwrap();
        let donor = accounts
            .register(registration("donor@example.com", None))
            .await
            .unwrap();
        let admin_actor = Actor::new(admin.id, Role::Admin);

        let page = accounts
            .list_users(&admin_actor, PageRequest::new(1, 1))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, donor.id);

        let promoted = accounts
            .set_role(&admin_actor, donor.id, Role::Creator)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Creator);

        assert!(matches!(
            accounts.set_role(&admin_actor, admin.id, Role::User).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            accounts
                .list_users(&Actor::new(donor.id, Role::Creator), PageRequest::default())
                .await,
            Err(Error::Forbidden(_))
        ));
    }
}

//! Account repository: authentication and the first admin account.

use lims_core::entities::Document;
use lims_core::enums::{EntityKind, Role};
use lims_core::identity::Actor;
use lims_core::store::{DocumentStore, IndexKey};
use lims_schema::RequestValues;
use lims_schema::kinds::hash_password;

use crate::error::DatabaseError;
use crate::service::LimsService;

impl LimsService {
    /// The actor an account document stands for.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the document is not an account with a valid role.
    pub fn actor_for(doc: &Document) -> Result<Actor, DatabaseError> {
        if doc.entity != EntityKind::Account {
            return Err(DatabaseError::InvalidState(format!("{} is not an account", doc.label())));
        }
        let name = doc
            .name()
            .ok_or_else(|| DatabaseError::InvalidState(format!("account {} has no name", doc.id)))?;
        let role = doc
            .get_str("role")
            .unwrap_or_default()
            .parse::<Role>()
            .map_err(|e| DatabaseError::InvalidState(format!("account {name}: {e}")))?;
        Ok(Actor::new(doc.id.clone(), name, role))
    }

    /// Resolve the actor for an account name and password.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` for an unknown account or a wrong password.
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<Actor, DatabaseError> {
        let Some(doc) = self.db().get_named(EntityKind::Account, name).await? else {
            tracing::debug!(account = name, "unknown account");
            return Err(DatabaseError::AuthenticationFailed);
        };
        if doc.get_str("password") != Some(hash_password(password).as_str()) {
            tracing::debug!(account = name, "password mismatch");
            return Err(DatabaseError::AuthenticationFailed);
        }
        Self::actor_for(&doc)
    }

    /// Whether any account exists.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn has_accounts(&self) -> Result<bool, DatabaseError> {
        let rows = self
            .db()
            .find_by_index(EntityKind::Account, "name", &IndexKey::All)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Create the first admin account, logged as made by the system account.
    ///
    /// # Errors
    ///
    /// `InvalidState` when accounts already exist; validation failures of
    /// the name or password.
    pub async fn bootstrap_admin(&self, name: &str, password: &str) -> Result<Actor, DatabaseError> {
        if self.has_accounts().await? {
            return Err(DatabaseError::InvalidState(String::from(
                "accounts already exist",
            )));
        }
        let values = RequestValues::new()
            .with("name", name)
            .with("new_password", password)
            .with("confirm_password", password)
            .with("role", Role::Admin.as_str())
            .with("description", "Bootstrap administrator.");
        let doc = self
            .create(&Actor::system(), EntityKind::Account, values)
            .await?;
        tracing::info!(account = name, "bootstrapped admin account");
        Self::actor_for(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{account, create, seeded_service, test_service};
    use lims_core::errors::CoreError;

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let svc = test_service().await;
        assert!(!svc.has_accounts().await.unwrap());
        let admin = svc.bootstrap_admin("root", "secret").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.id.starts_with("acc-"));

        let log = svc.log_records(&admin.id).await.unwrap();
        assert_eq!(log[0].account, "system");

        let again = svc.bootstrap_admin("other", "secret").await;
        assert!(matches!(again, Err(DatabaseError::InvalidState(_))));
    }

    #[tokio::test]
    async fn authentication_compares_digests() {
        let (svc, _admin) = seeded_service().await;
        let actor = svc.authenticate("root", "secret").await.unwrap();
        assert_eq!(actor.name, "root");

        let stored = svc.require_named(EntityKind::Account, "root").await.unwrap();
        let digest = stored.get_str("password").unwrap();
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, "secret");

        assert!(matches!(
            svc.authenticate("root", "wrong").await,
            Err(DatabaseError::AuthenticationFailed)
        ));
        assert!(matches!(
            svc.authenticate("nobody", "secret").await,
            Err(DatabaseError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn mismatched_password_is_rejected() {
        let (svc, admin) = seeded_service().await;
        let error = svc
            .create(
                &admin,
                EntityKind::Account,
                RequestValues::new()
                    .with("name", "alice")
                    .with("new_password", "secret1")
                    .with("confirm_password", "secret2"),
            )
            .await
            .unwrap_err();
        let Some(CoreError::InvalidValue { field, reason }) = error.as_core() else {
            panic!("Expected InvalidValue, got {error:?}");
        };
        assert_eq!(field, "password");
        assert!(reason.contains("do not match"));
    }

    #[tokio::test]
    async fn only_admins_assign_roles() {
        let (svc, admin) = seeded_service().await;
        let mona = account(&svc, &admin, "mona", Role::Manager).await;
        let error = svc
            .create(
                &mona,
                EntityKind::Account,
                RequestValues::new()
                    .with("name", "eve")
                    .with("new_password", "pw")
                    .with("confirm_password", "pw")
                    .with("role", "admin"),
            )
            .await
            .unwrap_err();
        assert!(matches!(error.as_core(), Some(CoreError::EditForbidden { .. })));

        let doc = create(
            &svc,
            &mona,
            EntityKind::Account,
            RequestValues::new()
                .with("name", "carl")
                .with("new_password", "pw")
                .with("confirm_password", "pw"),
        )
        .await;
        assert_eq!(LimsService::actor_for(&doc).unwrap().role, Role::Customer);
    }
}

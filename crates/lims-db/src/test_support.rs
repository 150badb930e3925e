pub(crate) mod helpers {
    use lims_config::SiteConfig;
    use lims_core::entities::Document;
    use lims_core::enums::{EntityKind, Role};
    use lims_core::identity::Actor;
    use lims_schema::RequestValues;

    use crate::service::LimsService;

    pub async fn test_service() -> LimsService {
        LimsService::new_local(":memory:", SiteConfig::default())
            .await
            .unwrap()
    }

    /// A service with the bootstrap admin `root` (password `secret`).
    pub async fn seeded_service() -> (LimsService, Actor) {
        let svc = test_service().await;
        let admin = svc.bootstrap_admin("root", "secret").await.unwrap();
        (svc, admin)
    }

    pub async fn create(
        svc: &LimsService,
        actor: &Actor,
        entity: EntityKind,
        values: RequestValues,
    ) -> Document {
        svc.create(actor, entity, values).await.unwrap()
    }

    /// Create an account with the given role; its password is its name.
    pub async fn account(svc: &LimsService, admin: &Actor, name: &str, role: Role) -> Actor {
        let doc = create(
            svc,
            admin,
            EntityKind::Account,
            RequestValues::new()
                .with("name", name)
                .with("new_password", name)
                .with("confirm_password", name)
                .with("role", role.as_str()),
        )
        .await;
        LimsService::actor_for(&doc).unwrap()
    }

    /// Create project `name` owned by `customer`.
    pub async fn project(svc: &LimsService, admin: &Actor, name: &str, customer: &str) -> Document {
        create(
            svc,
            admin,
            EntityKind::Project,
            RequestValues::new()
                .with("name", name)
                .with("customer", customer)
                .with("reference", "hg19"),
        )
        .await
    }
}

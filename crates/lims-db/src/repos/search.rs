//! Search repository: prefix lookup across the name, tag, operator and
//! altname indexes of every entity kind.

use std::collections::BTreeSet;

use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::store::{DocumentStore, IndexKey};
use lims_schema::schema_for;
use serde::Serialize;

use crate::error::DatabaseError;
use crate::service::LimsService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub entity: EntityKind,
    pub name: String,
    pub id: String,
    /// Index the key matched in.
    pub index: &'static str,
    /// Indexed value that matched.
    pub key: String,
    pub url: String,
}

/// Indexes searched for a kind.
fn searched_indexes(kind: EntityKind) -> Vec<&'static str> {
    let schema = schema_for(kind);
    ["name", "tag", "operator", "altname"]
        .into_iter()
        .filter(|index| match *index {
            "altname" => kind == EntityKind::Sample,
            other => schema.index(other).is_some(),
        })
        .collect()
}

impl LimsService {
    /// Documents whose name, tag, operator or sample altname starts with
    /// `key`, sorted by entity kind and name.
    ///
    /// # Errors
    ///
    /// `BadRequest` for a blank key; store failures.
    pub async fn search(&self, actor: &Actor, key: &str) -> Result<Vec<SearchHit>, DatabaseError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::BadRequest(String::from("empty search key")).into());
        }
        let prefix = IndexKey::Prefix(key.to_string());
        let mut seen = BTreeSet::new();
        let mut hits = Vec::new();
        for kind in EntityKind::ALL {
            let schema = schema_for(kind);
            for index in searched_indexes(kind) {
                for row in self.db().find_by_index(kind, index, &prefix).await? {
                    if !seen.insert(row.id.clone()) {
                        continue;
                    }
                    let Some(doc) = self.db().get(&row.id).await? else {
                        continue;
                    };
                    if !schema.is_viewable(self.db(), actor, &doc).await? {
                        continue;
                    }
                    hits.push(SearchHit {
                        entity: kind,
                        url: self.site().entity_url(kind, &row.name),
                        name: row.name,
                        id: row.id,
                        index,
                        key: row.key,
                    });
                }
            }
        }
        hits.sort_by(|a, b| (a.entity, &a.name).cmp(&(b.entity, &b.name)));
        tracing::debug!(key, hits = hits.len(), "search");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::entity::UpdateRequest;
    use crate::test_support::helpers::{account, create, project, seeded_service};
    use lims_core::enums::Role;
    use lims_schema::RequestValues;
    use pretty_assertions::assert_eq;

    #[test]
    fn altname_is_searched_on_samples_only() {
        assert_eq!(searched_indexes(EntityKind::Sample), vec!["name", "tag", "altname"]);
        assert_eq!(
            searched_indexes(EntityKind::Workset),
            vec!["name", "tag", "operator"]
        );
    }

    #[tokio::test]
    async fn matches_are_deduplicated_sorted_and_filtered() {
        let (svc, admin) = seeded_service().await;
        let alice = account(&svc, &admin, "alice", Role::Customer).await;
        account(&svc, &admin, "bob", Role::Customer).await;
        project(&svc, &admin, "al-1", "alice").await;
        project(&svc, &admin, "al-2", "bob").await;
        create(
            &svc,
            &admin,
            EntityKind::Sample,
            RequestValues::new()
                .with("name", "x1")
                .with("project", "al-1")
                .with("altname", "alpha"),
        )
        .await;
        svc.update(
            &admin,
            EntityKind::Project,
            "al-1",
            UpdateRequest::new(RequestValues::new().with("_tags_add", "alt")),
        )
        .await
        .unwrap();

        let hits = svc.search(&admin, "al").await.unwrap();
        let found: Vec<(EntityKind, &str)> =
            hits.iter().map(|hit| (hit.entity, hit.name.as_str())).collect();
        assert_eq!(
            found,
            vec![
                (EntityKind::Account, "alice"),
                (EntityKind::Project, "al-1"),
                (EntityKind::Project, "al-2"),
                (EntityKind::Sample, "x1"),
            ]
        );
        assert_eq!(hits[3].index, "altname");

        let hits = svc.search(&alice, "al").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "al-1", "x1"]);

        assert!(svc.search(&admin, "  ").await.is_err());
    }
}

//! Entity-level access control.
//!
//! Predicates are plain functions attached to the static schemas. Field-level
//! restrictions live on [`crate::field::FieldSpec::editable`].

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::store::DocumentStore;

/// Who may edit an existing document, before the lock check.
pub type EditPolicy = fn(&Actor, &Document) -> bool;

/// Who may create documents of a kind, or run an action.
pub type ActorPolicy = fn(&Actor) -> bool;

/// Where the owning account of a document is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The owner's account name is stored in this field.
    Field(&'static str),
    /// The owner is stored in field `owner` of the `entity` document named by
    /// field `via`.
    Referenced {
        via: &'static str,
        entity: EntityKind,
        owner: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Staff,
    /// Staff, or a customer owning the document.
    StaffOrOwner(Ownership),
}

impl Ownership {
    /// Name of the owning account, if recorded.
    ///
    /// # Errors
    ///
    /// Store failures while resolving a referenced owner.
    pub async fn owner_of<S: DocumentStore>(
        &self,
        store: &S,
        doc: &Document,
    ) -> Result<Option<String>, CoreError> {
        match *self {
            Self::Field(field) => Ok(doc.get_str(field).map(String::from)),
            Self::Referenced { via, entity, owner } => {
                let Some(name) = doc.get_str(via) else {
                    return Ok(None);
                };
                Ok(store
                    .get_named(entity, name)
                    .await?
                    .and_then(|referenced| referenced.get_str(owner).map(String::from)))
            }
        }
    }
}

impl Visibility {
    /// # Errors
    ///
    /// Store failures while resolving ownership.
    pub async fn allows<S: DocumentStore>(
        &self,
        store: &S,
        actor: &Actor,
        doc: &Document,
    ) -> Result<bool, CoreError> {
        if actor.is_staff() {
            return Ok(true);
        }
        match self {
            Self::Staff => Ok(false),
            Self::StaffOrOwner(ownership) => Ok(ownership
                .owner_of(store, doc)
                .await?
                .is_some_and(|owner| owner == actor.name)),
        }
    }
}

#[must_use]
pub const fn staff(actor: &Actor) -> bool {
    actor.role.is_staff()
}

#[must_use]
pub const fn managers(actor: &Actor) -> bool {
    actor.role.is_manager()
}

#[must_use]
pub const fn admins(actor: &Actor) -> bool {
    actor.role.is_admin()
}

#[must_use]
pub const fn staff_edit(actor: &Actor, _doc: &Document) -> bool {
    staff(actor)
}

#[must_use]
pub const fn managers_edit(actor: &Actor, _doc: &Document) -> bool {
    managers(actor)
}

#[must_use]
pub const fn admins_edit(actor: &Actor, _doc: &Document) -> bool {
    admins(actor)
}

/// `ViewForbidden` for the actor and document.
#[must_use]
pub fn view_forbidden(actor: &Actor, doc: &Document) -> CoreError {
    CoreError::ViewForbidden {
        account: actor.name.clone(),
        target: doc.label(),
    }
}

/// `EditForbidden` for the actor and a target label.
#[must_use]
pub fn edit_forbidden(actor: &Actor, target: impl Into<String>) -> CoreError {
    CoreError::EditForbidden {
        account: actor.name.clone(),
        target: target.into(),
    }
}

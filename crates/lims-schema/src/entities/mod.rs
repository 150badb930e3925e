//! Static entity schemas.
//!
//! Every entity kind is a declaration: an ordered field list, secondary
//! indexes, access predicates and optional hooks. Nothing here touches the
//! store except ownership resolution for visibility.

mod account;
mod application;
mod instrument;
mod project;
mod protocol;
mod sample;
mod task;
mod workset;

use lims_core::entities::Document;
use lims_core::enums::EntityKind;
use lims_core::errors::CoreError;
use lims_core::identity::Actor;
use lims_core::store::DocumentStore;

use crate::field::FieldSpec;
use crate::policy::{self, ActorPolicy, EditPolicy, Visibility};

pub use account::ACCOUNT;
pub use application::APPLICATION;
pub use instrument::INSTRUMENT;
pub use project::PROJECT;
pub use protocol::PROTOCOL;
pub use sample::SAMPLE;
pub use task::TASK;
pub use workset::WORKSET;

/// A secondary index: `name` maps every value of `field` to the document.
/// Array fields emit one key per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub field: &'static str,
}

impl IndexSpec {
    pub const fn new(name: &'static str, field: &'static str) -> Self {
        Self { name, field }
    }
}

/// Indexes every kind carries.
pub const NAME_INDEX: IndexSpec = IndexSpec::new("name", "name");
pub const TAG_INDEX: IndexSpec = IndexSpec::new("tag", "tags");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    Lock,
    Unlock,
}

/// A named side effect requested through the `action` input.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub allowed: ActorPolicy,
    pub effect: ActionEffect,
}

pub const STANDARD_ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        name: "lock",
        description: "Freeze the document against any edit.",
        allowed: policy::admins,
        effect: ActionEffect::Lock,
    },
    ActionSpec {
        name: "unlock",
        description: "Allow edits of a locked document again.",
        allowed: policy::admins,
        effect: ActionEffect::Unlock,
    },
];

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    pub indexes: &'static [IndexSpec],
    pub visibility: Visibility,
    pub editable: EditPolicy,
    pub creatable: ActorPolicy,
    /// Applied to a new document after its fields are parsed.
    pub setup: Option<fn(&mut Document)>,
    /// Applied to the merged document before every save of field changes.
    pub before_save: Option<fn(&mut Document)>,
    pub actions: &'static [ActionSpec],
}

impl EntitySchema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&'static IndexSpec> {
        self.indexes.iter().find(|index| index.name == name)
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&'static ActionSpec> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Actor-level edit gate. A locked document is not editable at all.
    #[must_use]
    pub fn is_editable(&self, actor: &Actor, doc: &Document) -> bool {
        !doc.is_locked() && (self.editable)(actor, doc)
    }

    #[must_use]
    pub fn may_create(&self, actor: &Actor) -> bool {
        (self.creatable)(actor)
    }

    /// # Errors
    ///
    /// Store failures while resolving ownership.
    pub async fn is_viewable<S: DocumentStore>(
        &self,
        store: &S,
        actor: &Actor,
        doc: &Document,
    ) -> Result<bool, CoreError> {
        self.visibility.allows(store, actor, doc).await
    }

    /// # Errors
    ///
    /// `ViewForbidden` when the actor may not see the document.
    pub async fn check_viewable<S: DocumentStore>(
        &self,
        store: &S,
        actor: &Actor,
        doc: &Document,
    ) -> Result<(), CoreError> {
        if self.is_viewable(store, actor, doc).await? {
            Ok(())
        } else {
            Err(policy::view_forbidden(actor, doc))
        }
    }

    /// # Errors
    ///
    /// `EditForbidden` when the actor may not edit the document.
    pub fn check_editable(&self, actor: &Actor, doc: &Document) -> Result<(), CoreError> {
        if self.is_editable(actor, doc) {
            Ok(())
        } else {
            Err(policy::edit_forbidden(actor, doc.label()))
        }
    }

    /// # Errors
    ///
    /// `EditForbidden` when the actor may not create documents of this kind.
    pub fn check_creatable(&self, actor: &Actor) -> Result<(), CoreError> {
        if self.may_create(actor) {
            Ok(())
        } else {
            Err(policy::edit_forbidden(actor, format!("new {}", self.kind)))
        }
    }
}

/// The schema of an entity kind.
#[must_use]
pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Account => &ACCOUNT,
        EntityKind::Project => &PROJECT,
        EntityKind::Sample => &SAMPLE,
        EntityKind::Workset => &WORKSET,
        EntityKind::Protocol => &PROTOCOL,
        EntityKind::Task => &TASK,
        EntityKind::Instrument => &INSTRUMENT,
        EntityKind::Application => &APPLICATION,
    }
}

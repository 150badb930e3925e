//! ID prefix constants.
//!
//! Every document ID is `<prefix>-<16 hex chars>`, generated by the store.

use crate::enums::EntityKind;

pub const PREFIX_ACCOUNT: &str = "acc";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_SAMPLE: &str = "smp";
pub const PREFIX_WORKSET: &str = "wks";
pub const PREFIX_PROTOCOL: &str = "prt";
pub const PREFIX_TASK: &str = "tsk";
pub const PREFIX_INSTRUMENT: &str = "ins";
pub const PREFIX_APPLICATION: &str = "app";
pub const PREFIX_LOG: &str = "log";

pub const ALL_PREFIXES: [&str; 9] = [
    PREFIX_ACCOUNT,
    PREFIX_PROJECT,
    PREFIX_SAMPLE,
    PREFIX_WORKSET,
    PREFIX_PROTOCOL,
    PREFIX_TASK,
    PREFIX_INSTRUMENT,
    PREFIX_APPLICATION,
    PREFIX_LOG,
];

/// ID prefix for documents of the given kind.
#[must_use]
pub const fn prefix_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Account => PREFIX_ACCOUNT,
        EntityKind::Project => PREFIX_PROJECT,
        EntityKind::Sample => PREFIX_SAMPLE,
        EntityKind::Workset => PREFIX_WORKSET,
        EntityKind::Protocol => PREFIX_PROTOCOL,
        EntityKind::Task => PREFIX_TASK,
        EntityKind::Instrument => PREFIX_INSTRUMENT,
        EntityKind::Application => PREFIX_APPLICATION,
    }
}

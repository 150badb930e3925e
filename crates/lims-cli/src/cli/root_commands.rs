use clap::{Args, Subcommand};
use lims_core::enums::EntityKind;

use crate::cli::subcommands::{AttachmentCommands, SampleCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the project store and its first admin account.
    Init(InitArgs),
    /// Create a document.
    Create(CreateArgs),
    /// Show a document with its fields, attachments and log.
    Get(EntityArgs),
    /// Edit a document.
    Update(UpdateArgs),
    /// List documents of one kind.
    List(ListArgs),
    /// Show the log of a document.
    Log(EntityArgs),
    /// Prefix search over names, tags, operators and altnames.
    Search(SearchArgs),
    /// Show the edit form of a document, or the create form of a kind.
    Form(FormArgs),
    /// Document attachments.
    Attachment {
        #[command(subcommand)]
        action: AttachmentCommands,
    },
    /// Samples of a project.
    Sample {
        #[command(subcommand)]
        action: SampleCommands,
    },
    /// Show the stored JSON of a document.
    Doc(IdArgs),
    /// Find the kind, name and URL of a document ID.
    Locate(IdArgs),
    /// Print or check JSON Schemas.
    Schema(SchemaArgs),
}

/// Split `key=value` into its parts; the value may be empty.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Name of the admin account.
    #[arg(long, default_value = "admin")]
    pub admin: String,
    /// Password of the admin account (defaults to LIMS_PASSWORD).
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    pub entity: EntityKind,
    /// Field values as key=value; repeat a key for multi-valued fields.
    #[arg(value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,
}

#[derive(Clone, Debug, Args)]
pub struct EntityArgs {
    pub entity: EntityKind,
    pub name: String,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    pub entity: EntityKind,
    pub name: String,
    /// Field values and actions as key=value.
    #[arg(value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,
    /// Revision the edit is based on.
    #[arg(long)]
    pub revision: Option<String>,
    /// File to attach in the same request.
    #[arg(long)]
    pub attach: Option<String>,
    /// Content type of the attached file.
    #[arg(long, requires = "attach")]
    pub content_type: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ListArgs {
    pub entity: EntityKind,
    /// Only documents with this operator.
    #[arg(long)]
    pub operator: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    pub key: String,
}

#[derive(Clone, Debug, Args)]
pub struct FormArgs {
    pub entity: EntityKind,
    /// Document to edit; omit for the create form.
    pub name: Option<String>,
    /// Limit the edit form to one field.
    #[arg(long, requires = "name")]
    pub field: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Schema to print, e.g. `document` or `sample`; omit to list them.
    pub name: Option<String>,
    /// Validate the stored document with this ID instead.
    #[arg(long, conflicts_with = "name")]
    pub check: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::parse_key_value;

    #[test]
    fn splits_on_first_equals() {
        assert_eq!(
            parse_key_value("xref_uri=http://x?a=b").unwrap(),
            ("xref_uri".to_string(), "http://x?a=b".to_string())
        );
        assert_eq!(
            parse_key_value("altname=").unwrap(),
            ("altname".to_string(), String::new())
        );
    }

    #[test]
    fn rejects_missing_key_or_separator() {
        assert!(parse_key_value("amount").is_err());
        assert!(parse_key_value("=3").is_err());
    }
}

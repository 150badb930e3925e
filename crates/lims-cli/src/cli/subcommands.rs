use clap::Subcommand;

/// Attachment commands, addressed by document ID and filename.
#[derive(Clone, Debug, Subcommand)]
pub enum AttachmentCommands {
    /// Write an attachment to a file, or to stdout.
    Get {
        id: String,
        filename: String,
        #[arg(long)]
        output: Option<String>,
    },
    /// Add or replace an attachment from a file.
    Put {
        id: String,
        path: String,
        /// Stored filename (defaults to the file's name).
        #[arg(long)]
        filename: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
        /// Transfer encoding of the file: binary, base64, quoted-printable.
        #[arg(long)]
        encoding: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Remove an attachment.
    Delete {
        id: String,
        filename: String,
        #[arg(long)]
        comment: Option<String>,
    },
}

/// Sample commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SampleCommands {
    /// Define samples in a project.
    Add {
        project: String,
        /// Sample names.
        names: Vec<String>,
        /// JSON file with an array of sample drafts.
        #[arg(long, conflicts_with = "names")]
        json: Option<String>,
    },
}

use std::path::Path;

use anyhow::Context;
use lims_db::repos::attachment::{TransferEncoding, Upload};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Read `path` into an upload, named after the file unless `filename` is given.
pub fn read_upload(
    path: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    encoding: Option<&str>,
) -> anyhow::Result<Upload> {
    let path = Path::new(path);
    let content =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = match filename {
        Some(filename) => filename.to_string(),
        None => path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("no filename in {}", path.display()))?
            .to_string(),
    };
    let encoding = encoding
        .map(str::parse::<TransferEncoding>)
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(TransferEncoding::Binary);
    Ok(Upload::new(
        filename,
        content_type.unwrap_or(DEFAULT_CONTENT_TYPE),
        content,
    )
    .encoded(encoding))
}

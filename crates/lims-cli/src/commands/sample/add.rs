use anyhow::Context;
use lims_db::repos::sample::SampleDraft;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AddedSample {
    name: Option<String>,
    id: String,
}

#[derive(Debug, Serialize)]
struct AddSamplesResponse {
    project: String,
    samples: Vec<AddedSample>,
}

/// Drafts from a JSON file, or one bare draft per name.
fn load_drafts(names: &[String], json: Option<&str>) -> anyhow::Result<Vec<SampleDraft>> {
    let Some(path) = json else {
        return Ok(names.iter().map(SampleDraft::named).collect());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("{path} is not an array of sample drafts"))
}

pub async fn run(
    project: &str,
    names: &[String],
    json: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let drafts = load_drafts(names, json)?;
    if drafts.is_empty() {
        anyhow::bail!("no samples given (pass names or --json)");
    }
    let samples = ctx.service.add_samples(&ctx.actor, project, &drafts).await?;
    output(
        &AddSamplesResponse {
            project: project.to_string(),
            samples: samples
                .into_iter()
                .map(|doc| AddedSample {
                    name: doc.name().map(str::to_string),
                    id: doc.id,
                })
                .collect(),
        },
        flags.format,
    )
}

#[cfg(test)]
mod tests {
    use lims_db::repos::sample::SampleDraft;
    use pretty_assertions::assert_eq;

    use super::load_drafts;

    #[test]
    fn names_become_bare_drafts() {
        let drafts = load_drafts(&["a1".to_string()], None).unwrap();
        assert_eq!(drafts, vec![SampleDraft::named("a1")]);
    }

    #[test]
    fn json_file_holds_full_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.json");
        std::fs::write(&path, r#"[{"name": "a1", "altname": "tube 1", "amount": 2.0}]"#).unwrap();

        let drafts = load_drafts(&[], path.to_str()).unwrap();
        assert_eq!(drafts[0].altname.as_deref(), Some("tube 1"));
        assert_eq!(drafts[0].amount, Some(2.0));
    }
}

//! Configuration and path resolution for the CLI.
//!
//! Output files live under one directory:
//! - `--output-dir <DIR>` when given
//! - otherwise `$PATSIM_OUTPUT_DIR`
//! - otherwise `output/` relative to the working directory

use crate::output::OutputFormat;
use anyhow::{bail, Context, Result};
use patsim_core::{InMemoryRetriever, ResultSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "PATSIM_OUTPUT_DIR";

/// Output directory used when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Resolves the output file path.
///
/// `name` is placed under `dir`. Without a name the default is
/// `<stem>.csv` or `<stem>.jsonl` depending on `format`.
///
/// # Errors
///
/// A CSV output name that does not end in `.csv`.
pub fn output_path(
    dir: &Path,
    name: Option<&str>,
    stem: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let file_name = match name {
        Some(name) => {
            if format == OutputFormat::Csv && !name.ends_with(".csv") {
                bail!("Output file must end with '.csv': {}", name);
            }
            name.to_string()
        }
        None => format!("{}.{}", stem, format.extension()),
    };
    Ok(dir.join(file_name))
}

/// Creates the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Loads canned results for offline runs.
///
/// The file maps each query string to its result set:
///
/// ```json
/// { "dslr camera": { "total_count": 150, "top_identifiers": ["US1", "US2"] } }
/// ```
pub fn load_fixtures(path: &Path, min_total: u64) -> Result<InMemoryRetriever> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures file: {}", path.display()))?;
    let results: HashMap<String, ResultSet> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid fixtures file: {}", path.display()))?;

    Ok(InMemoryRetriever::from_results(results).with_min_total(min_total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        assert_eq!(
            output_path(&dir, None, "output", OutputFormat::Csv).unwrap(),
            PathBuf::from("output/output.csv")
        );
        assert_eq!(
            output_path(&dir, None, "output", OutputFormat::Jsonl).unwrap(),
            PathBuf::from("output/output.jsonl")
        );
        assert_eq!(
            output_path(&dir, None, "uspto_output", OutputFormat::Csv).unwrap(),
            PathBuf::from("output/uspto_output.csv")
        );
    }

    #[test]
    fn test_custom_output_name() {
        let dir = PathBuf::from("/tmp/runs");
        assert_eq!(
            output_path(&dir, Some("cameras.csv"), "output", OutputFormat::Csv).unwrap(),
            PathBuf::from("/tmp/runs/cameras.csv")
        );
    }

    #[test]
    fn test_csv_name_must_end_in_csv() {
        let dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
        let err = output_path(&dir, Some("cameras.txt"), "output", OutputFormat::Csv).unwrap_err();
        assert!(err.to_string().contains(".csv"));

        // JSON Lines output is not restricted
        assert!(output_path(&dir, Some("cameras.ndjson"), "output", OutputFormat::Jsonl).is_ok());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/out.csv");

        ensure_parent_dir(&path).unwrap();
        assert!(tmp.path().join("a/b").is_dir());

        // Bare file names have no parent to create
        ensure_parent_dir(Path::new("out.csv")).unwrap();
    }

    #[tokio::test]
    async fn test_load_fixtures() {
        use patsim_core::Retriever;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"{
                "dslr camera": {"total_count": 150, "top_identifiers": ["US1", "US2"]},
                "rare": {"total_count": 3, "top_identifiers": ["US9"]}
            }"#,
        )
        .unwrap();

        let retriever = load_fixtures(&path, 10).unwrap();
        assert_eq!(retriever.len(), 2);

        let result = retriever.retrieve("dslr camera").await.unwrap();
        assert_eq!(result.top_identifiers, vec!["US1", "US2"]);
        assert!(retriever.retrieve("rare").await.is_err());
    }

    #[test]
    fn test_load_fixtures_rejects_bad_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fixtures.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = load_fixtures(&path, 10).unwrap_err();
        assert!(err.to_string().contains("Invalid fixtures file"));
    }
}

//! Raw page capture.
//!
//! Every fetched page body is handed to a [`DiagnosticSink`]. The default
//! [`NoopSink`] discards it; [`DirectorySink`] writes one file per query page
//! so a surprising result can be checked against what the engine returned.

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Longest query prefix kept in a dump file name.
const MAX_STEM_LEN: usize = 80;

/// Receives the raw body of every fetched result page.
///
/// Sinks must not fail the retrieval; problems are logged and swallowed.
pub trait DiagnosticSink {
    fn record_page(&self, query: &str, page: usize, body: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn record_page(&self, _query: &str, _page: usize, _body: &str) {}
}

/// Writes each page to `<dir>/<query>_page<N>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path the body of `query`'s page `page` is written to.
    pub fn page_path(&self, query: &str, page: usize) -> PathBuf {
        self.dir
            .join(format!("{}_page{}.json", file_stem(query), page))
    }
}

impl DiagnosticSink for DirectorySink {
    fn record_page(&self, query: &str, page: usize, body: &str) {
        let path = self.page_path(query, page);
        match fs::write(&path, body) {
            Ok(()) => debug!("Dumped page {} of '{}' to {}", page, query, path.display()),
            Err(e) => warn!("Failed to dump page to {}: {}", path.display(), e),
        }
    }
}

/// Reduces a query to a filesystem-safe stem.
fn file_stem(query: &str) -> String {
    let stem: String = query
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect();
    if stem.is_empty() {
        "query".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(
            file_stem("(dslr OR digital) AND camera"),
            "_dslr_OR_digital__AND_camera"
        );
        assert_eq!(file_stem(""), "query");
        assert_eq!(file_stem(&"a".repeat(200)).len(), MAX_STEM_LEN);
    }

    #[test]
    fn test_directory_sink_writes_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("dumps")).unwrap();

        sink.record_page("dslr camera", 0, "{\"results\":{}}");
        sink.record_page("dslr camera", 1, "{}");

        let first = fs::read_to_string(tmp.path().join("dumps/dslr_camera_page0.json")).unwrap();
        assert_eq!(first, "{\"results\":{}}");
        assert!(sink.page_path("dslr camera", 1).exists());
    }

    #[test]
    fn test_noop_sink_accepts_anything() {
        NoopSink.record_page("anything", 3, "body");
    }
}

//! Annotation sidecar (SPEC_FULL.md supplemental feature #3): scores and
//! comments keyed to a session, time range, or event, stored independently
//! of the recording they describe — one JSON-lines file per annotation
//! set, loaded and saved without touching the recording itself.

use std::path::Path;

use conductor_domain::error::{Error, Result};
use conductor_domain::recording::Annotation;

/// Append-only load/save for a `.jsonl` file of [`Annotation`] records.
pub struct AnnotationStore;

impl AnnotationStore {
    /// Load every annotation in the file, skipping blank lines. Missing
    /// files are not an error — an unannotated recording yields an empty
    /// set rather than failing the run.
    pub async fn load(path: &Path) -> Result<Vec<Annotation>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<Annotation>(l).map_err(Error::from))
            .collect()
    }

    /// Overwrite `path` with the given annotations, one per line.
    pub async fn save(path: &Path, annotations: &[Annotation]) -> Result<()> {
        let mut out = String::new();
        for a in annotations {
            out.push_str(&serde_json::to_string(a)?);
            out.push('\n');
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        tokio::fs::write(path, out).await.map_err(Error::Io)?;
        Ok(())
    }

    /// Append a single annotation without re-reading and re-writing the
    /// whole file.
    pub async fn append(path: &Path, annotation: &Annotation) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Io)?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(Error::Io)?;
        let mut line = serde_json::to_string(annotation)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await.map_err(Error::Io)?;
        Ok(())
    }

    /// Annotations whose `session_id` matches, in load order.
    pub fn for_session<'a>(annotations: &'a [Annotation], session_id: &str) -> Vec<&'a Annotation> {
        annotations.iter().filter(|a| a.session_id == session_id).collect()
    }

    /// Annotations whose `time_range` overlaps `start_s..end_s`, or that
    /// carry no time range (treated as session-wide).
    pub fn in_range<'a>(annotations: &'a [Annotation], start_s: f64, end_s: f64) -> Vec<&'a Annotation> {
        annotations
            .iter()
            .filter(|a| match a.time_range {
                Some(r) => r.start_s < end_s && r.end_s > start_s,
                None => true,
            })
            .collect()
    }
}

//! Read-only access into `.tgz` subchart packages.
//!
//! Archives are never unpacked to disk: entries are streamed out of the
//! gzipped tar on demand, and archive-internal locations are addressed
//! through `helm-tgz:` locator URIs that the client resolves back through
//! the `chartnav.archive.read` command.

use crate::constants::ARCHIVE_URI_SCHEME;
use compact_str::CompactString;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tower_lsp::lsp_types::Url;

/// Identity of the chart found inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveChart {
    pub name: CompactString,
    /// Leading path component the packaged chart lives under, usually the
    /// chart name; empty when entries sit at the tar root.
    pub inner_root: String,
}

// Chart packages nest everything under a single root directory; an entry's
// chart-relative path is what remains after that first component.
fn chart_relative(entry_path: &str) -> (&str, &str) {
    match entry_path.split_once('/') {
        Some((root, rest)) => (root, rest),
        None => ("", entry_path),
    }
}

/// Scans an archive for its `Chart.yaml` and returns the packaged chart's
/// name and internal root. Unreadable or chart-less archives yield `None`.
pub fn probe_chart_archive(archive_path: &Path) -> Option<ArchiveChart> {
    let (inner_root, yaml) = for_each_entry(archive_path, |entry_path, contents| {
        let (root, rest) = chart_relative(entry_path);
        if rest == "Chart.yaml" {
            contents().map(|yaml| (root.to_string(), yaml))
        } else {
            None
        }
    })?;

    #[derive(serde::Deserialize)]
    struct ChartName {
        name: String,
    }
    match serde_yaml::from_str::<ChartName>(&yaml) {
        Ok(parsed) => Some(ArchiveChart {
            name: CompactString::from(parsed.name),
            inner_root,
        }),
        Err(e) => {
            tracing::debug!("unparsable Chart.yaml in {}: {}", archive_path.display(), e);
            None
        }
    }
}

/// Reads an archive entry addressed by chart-relative path (`values.yaml`,
/// `templates/deployment.yaml`, ...) into a string.
pub fn read_archive_entry(archive_path: &Path, internal_path: &str) -> Option<String> {
    for_each_entry(archive_path, |entry_path, contents| {
        let (_, rest) = chart_relative(entry_path);
        if rest == internal_path || entry_path == internal_path {
            contents()
        } else {
            None
        }
    })
}

// Streams tar entries until `f` produces a result. Any I/O or format error
// ends the scan with `None`; a broken archive contributes nothing.
fn for_each_entry<T>(
    archive_path: &Path,
    mut f: impl FnMut(&str, &mut dyn FnMut() -> Option<String>) -> Option<T>,
) -> Option<T> {
    let file = match std::fs::File::open(archive_path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("cannot open archive {}: {}", archive_path.display(), e);
            return None;
        }
    };
    let mut tar = Archive::new(GzDecoder::new(file));

    for entry in tar.entries().ok()? {
        let mut entry = entry.ok()?;
        let entry_path = entry.path().ok()?.to_string_lossy().into_owned();
        let mut contents = || {
            let mut buf = String::new();
            entry.read_to_string(&mut buf).ok()?;
            Some(buf)
        };
        if let Some(result) = f(&entry_path, &mut contents) {
            return Some(result);
        }
    }
    None
}

/// Builds the opaque locator for a read-only view of an archive entry.
pub fn archive_uri(archive_path: &Path, internal_path: &str) -> Option<Url> {
    let archive = archive_path.to_str()?;
    Url::parse_with_params(
        &format!("{}:chart", ARCHIVE_URI_SCHEME),
        &[("archive", archive), ("path", internal_path)],
    )
    .ok()
}

/// Inverse of [`archive_uri`].
pub fn parse_archive_uri(uri: &Url) -> Option<(PathBuf, String)> {
    if uri.scheme() != ARCHIVE_URI_SCHEME {
        return None;
    }
    let mut archive = None;
    let mut internal = None;
    for (key, value) in uri.query_pairs() {
        match key.as_ref() {
            "archive" => archive = Some(PathBuf::from(value.into_owned())),
            "path" => internal = Some(value.into_owned()),
            _ => {}
        }
    }
    Some((archive?, internal?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_round_trip() {
        let uri = archive_uri(Path::new("/tmp/charts/redis-17.0.0.tgz"), "values.yaml").unwrap();
        assert_eq!(uri.scheme(), ARCHIVE_URI_SCHEME);
        let (archive, internal) = parse_archive_uri(&uri).unwrap();
        assert_eq!(archive, PathBuf::from("/tmp/charts/redis-17.0.0.tgz"));
        assert_eq!(internal, "values.yaml");
    }

    #[test]
    fn locator_encodes_spaces() {
        let uri = archive_uri(Path::new("/tmp/my charts/a b.tgz"), "values.yaml").unwrap();
        let (archive, _) = parse_archive_uri(&uri).unwrap();
        assert_eq!(archive, PathBuf::from("/tmp/my charts/a b.tgz"));
    }

    #[test]
    fn foreign_schemes_do_not_parse() {
        let uri = Url::parse("file:///tmp/chart.tgz").unwrap();
        assert!(parse_archive_uri(&uri).is_none());
    }
}

//! Archive containers
//!
//! A container is a flat set of entries keyed by path. Root documents are
//! stored as `<id>.json`; files live below `<id>-images/` and
//! `<id>-assets/`.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rc_core::config::ExportConfig;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ArchiveError, ArchiveResult};

/// Read access to an archive
pub trait ArchiveReader: Send + Sync {
    /// Content of the entry at `path`
    fn extract_file(&self, path: &str) -> ArchiveResult<Bytes>;

    /// All entry paths in archive order
    fn paths(&self) -> Vec<String>;

    /// Top-level JSON documents, parsed
    fn json_entries(&self) -> ArchiveResult<Vec<(String, Value)>> {
        self.paths()
            .into_iter()
            .filter(|path| path.ends_with(".json") && !path.contains('/'))
            .map(|path| {
                let content = self.extract_file(&path)?;
                let value = serde_json::from_slice(&content).map_err(|e| {
                    ArchiveError::invalid(format!("{} is not valid JSON: {}", path, e))
                })?;
                Ok((path, value))
            })
            .collect()
    }
}

/// Write access to an archive
pub trait ArchiveWriter {
    fn add_entry(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()>;

    fn add_json<T: Serialize>(&mut self, path: &str, document: &T) -> ArchiveResult<()> {
        let data = serde_json::to_vec_pretty(document)?;
        self.add_entry(path, &data)
    }
}

/// Archive held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Bytes>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.insert(path.into(), data.into());
    }

    pub fn insert_json(&mut self, path: impl Into<String>, document: &Value) {
        self.insert(path, Bytes::from(document.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

impl ArchiveReader for MemoryArchive {
    fn extract_file(&self, path: &str) -> ArchiveResult<Bytes> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ArchiveError::MissingEntry(path.to_string()))
    }

    fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl ArchiveWriter for MemoryArchive {
    fn add_entry(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        self.insert(path, Bytes::copy_from_slice(data));
        Ok(())
    }
}

/// gzip compressed tar archive, read fully into memory
#[derive(Debug, Clone, Default)]
pub struct TarArchive {
    entries: MemoryArchive,
}

impl TarArchive {
    pub fn from_reader<R: Read>(reader: R) -> ArchiveResult<Self> {
        let mut archive = tar::Archive::new(GzDecoder::new(reader));
        let mut entries = MemoryArchive::new();

        for entry in archive.entries().map_err(ArchiveError::container)? {
            let mut entry = entry.map_err(ArchiveError::container)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let path = entry
                .path()
                .map_err(ArchiveError::container)?
                .to_string_lossy()
                .into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(ArchiveError::container)?;

            debug!(path = %path, size = data.len(), "Read archive entry");
            entries.insert(path, data);
        }

        Ok(Self { entries })
    }
}

impl ArchiveReader for TarArchive {
    fn extract_file(&self, path: &str) -> ArchiveResult<Bytes> {
        self.entries.extract_file(path)
    }

    fn paths(&self) -> Vec<String> {
        self.entries.paths()
    }
}

/// Writes a gzip compressed tar archive
pub struct TarArchiveWriter<W: Write> {
    builder: tar::Builder<GzEncoder<W>>,
}

impl<W: Write> TarArchiveWriter<W> {
    pub fn new(writer: W, config: &ExportConfig) -> Self {
        let level = Compression::new(config.compression_level.min(9));
        Self {
            builder: tar::Builder::new(GzEncoder::new(writer, level)),
        }
    }

    /// Finish the archive and return the underlying writer
    pub fn finish(self) -> ArchiveResult<W> {
        let encoder = self.builder.into_inner().map_err(ArchiveError::container)?;
        encoder.finish().map_err(ArchiveError::container)
    }
}

impl<W: Write> ArchiveWriter for TarArchiveWriter<W> {
    fn add_entry(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).map_err(ArchiveError::container)?;
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
        header.set_cksum();

        self.builder.append(&header, data).map_err(ArchiveError::container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_archive_missing_entry() {
        let archive = MemoryArchive::new();
        assert!(matches!(
            archive.extract_file("x-images/a.png"),
            Err(ArchiveError::MissingEntry(_))
        ));
    }

    #[test]
    fn test_json_entries_skip_files() {
        let mut archive = MemoryArchive::new();
        archive.insert_json("a.json", &json!({"format": "templates/v1"}));
        archive.insert("a-images/b.json", Bytes::from_static(b"not json"));

        let entries = archive.json_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "a.json");
    }

    #[test]
    fn test_invalid_json_is_validation_error() {
        let mut archive = MemoryArchive::new();
        archive.insert("a.json", Bytes::from_static(b"{"));
        assert!(archive.json_entries().unwrap_err().is_validation());
    }

    #[test]
    fn test_tar_roundtrip() {
        let mut writer = TarArchiveWriter::new(Vec::new(), &ExportConfig::default());
        writer.add_json("p.json", &json!({"name": "Acme"})).unwrap();
        writer.add_entry("p-images/shot.png", b"\x89PNG").unwrap();
        let data = writer.finish().unwrap();

        let archive = TarArchive::from_reader(data.as_slice()).unwrap();
        assert_eq!(archive.paths(), vec!["p-images/shot.png".to_string(), "p.json".to_string()]);
        assert_eq!(archive.extract_file("p-images/shot.png").unwrap(), Bytes::from_static(b"\x89PNG"));
        assert_eq!(archive.json_entries().unwrap()[0].1["name"], json!("Acme"));
    }
}

//! Archive extraction and triad grouping.

use flate2::read::DeflateDecoder;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};
use crate::shapefile::FileTriad;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// High-level ZIP extractor over a random access source.
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive.
    pub fn entries(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_entries()
    }

    /// Extract one entry's data to memory, verifying its checksum.
    pub fn read_entry(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.data_offset(entry)?;
        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_exact_at(data_offset, &mut compressed)?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                let mut decoder = DeflateDecoder::new(compressed.as_slice());
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                decoder.read_to_end(&mut out).map_err(|e| {
                    Error::Extraction(format!("{}: corrupt deflate stream: {e}", entry.file_name))
                })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::Extraction(format!(
                    "{}: unsupported compression method {method}",
                    entry.file_name
                )));
            }
        };

        let mut crc = flate2::Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::Extraction(format!(
                "{}: CRC mismatch",
                entry.file_name
            )));
        }
        Ok(data)
    }

    /// Extract one entry to disk, creating parent directories as needed.
    pub fn extract_entry_to(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = self.read_entry(entry)?;
        fs::write(output_path, data)?;
        Ok(())
    }
}

/// How [`extract_and_group_with`] treats base names that are missing one
/// or more of their three files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingPolicy {
    /// Skip incomplete groups silently. Archives routinely carry stray
    /// files (.prj sidecars, documentation) and partial exports.
    Lenient,
    /// Fail, naming every incomplete base name.
    Strict,
}

/// Extract an archive and group the files inside into shapefile triads,
/// skipping incomplete groups ([`GroupingPolicy::Lenient`]).
pub fn extract_and_group(zip_path: &Path) -> Result<Vec<FileTriad>> {
    extract_and_group_with(zip_path, GroupingPolicy::Lenient)
}

/// Extract an archive into a fresh uniquely-named directory and group the
/// extracted files into triads by base name.
///
/// Extensions match case-insensitively; base names group case-sensitively.
/// The extraction directory is *kept*: entries in the returned triads
/// point into it, and deleting it is the caller's responsibility.
pub fn extract_and_group_with(zip_path: &Path, policy: GroupingPolicy) -> Result<Vec<FileTriad>> {
    if !zip_path.is_file() {
        return Err(Error::ZipNotFound(zip_path.to_path_buf()));
    }

    let reader = LocalFileReader::open(zip_path)?;
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.entries()?;

    // unique per invocation so concurrent extractions never collide
    let dir = tempfile::Builder::new()
        .prefix("shapepack-")
        .tempdir()?
        .keep();
    tracing::debug!(archive = %zip_path.display(), dir = %dir.display(), "extracting archive");

    for entry in entries.iter().filter(|e| !e.is_directory) {
        let relative = sanitize_entry_name(&entry.file_name)?;
        extractor.extract_entry_to(entry, &dir.join(relative))?;
    }

    group_triads(&dir, policy)
}

/// Reject entry names that would escape the extraction directory.
fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(Error::Extraction(format!(
                    "unsafe entry name {name:?} in archive"
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(Error::Extraction(format!("empty entry name {name:?}")));
    }
    Ok(clean)
}

/// Scan a directory tree for triad members and group them by base name.
fn group_triads(root: &Path, policy: GroupingPolicy) -> Result<Vec<FileTriad>> {
    #[derive(Default)]
    struct Group {
        shp: Option<PathBuf>,
        shx: Option<PathBuf>,
        dbf: Option<PathBuf>,
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)?;

    // BTreeMap keeps the returned triads in a stable base-name order
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for path in files {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let group = match ext.to_ascii_lowercase().as_str() {
            "shp" => &mut groups.entry(stem.to_string()).or_default().shp,
            "shx" => &mut groups.entry(stem.to_string()).or_default().shx,
            "dbf" => &mut groups.entry(stem.to_string()).or_default().dbf,
            _ => continue,
        };
        *group = Some(path);
    }

    let mut triads = Vec::new();
    let mut incomplete = Vec::new();
    for (base_name, group) in groups {
        match (group.shp, group.shx, group.dbf) {
            (Some(shp), Some(shx), Some(dbf)) => triads.push(FileTriad {
                base_name,
                shp,
                shx,
                dbf,
            }),
            _ => incomplete.push(base_name),
        }
    }

    if policy == GroupingPolicy::Strict && !incomplete.is_empty() {
        return Err(Error::IncompleteGroups(incomplete));
    }
    if !incomplete.is_empty() {
        tracing::warn!(
            skipped = incomplete.len(),
            "archive contains incomplete shapefile groups"
        );
    }
    if triads.is_empty() {
        return Err(Error::NoValidGroups);
    }
    Ok(triads)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

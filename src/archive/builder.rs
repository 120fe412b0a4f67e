//! ZIP archive creation.

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::Local;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::structures::*;

/// Bundle files into `{output_dir}/{name}.zip`.
///
/// Every input path is checked up front; if any are missing the error
/// names them all and nothing is written. Files land in the archive under
/// their base names — directory structure is deliberately flattened so an
/// unpacked triad always groups, wherever it came from.
pub fn create_archive(output_dir: &Path, name: &str, file_paths: &[PathBuf]) -> Result<PathBuf> {
    let missing: Vec<PathBuf> = file_paths
        .iter()
        .filter(|p| !p.is_file())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingFiles(missing));
    }

    let file_name = if name.ends_with(".zip") {
        name.to_string()
    } else {
        format!("{name}.zip")
    };
    let zip_path = output_dir.join(file_name);

    let now = Local::now().naive_local();
    let (time, date) = (dos_time(now), dos_date(now.date()));

    let mut buf: Vec<u8> = Vec::new();
    let mut directory: Vec<ZipFileEntry> = Vec::new();

    for path in file_paths {
        let data = fs::read(path)
            .map_err(|e| Error::ArchiveCreation(format!("{}: {e}", path.display())))?;
        let uncompressed_size = u32::try_from(data.len()).map_err(|_| {
            Error::ArchiveCreation(format!("{} exceeds 4 GiB", path.display()))
        })?;

        let mut crc = flate2::Crc::new();
        crc.update(&data);

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&data)
            .map_err(|e| Error::ArchiveCreation(format!("{}: {e}", path.display())))?;
        let deflated = encoder
            .finish()
            .map_err(|e| Error::ArchiveCreation(format!("{}: {e}", path.display())))?;

        // store incompressible data as-is
        let (method, payload) = if deflated.len() < data.len() {
            (CompressionMethod::Deflate, deflated)
        } else {
            (CompressionMethod::Stored, data)
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entry = ZipFileEntry {
            file_name: name,
            compression_method: method,
            compressed_size: payload.len() as u32,
            uncompressed_size,
            crc32: crc.sum(),
            lfh_offset: buf.len() as u32,
            last_mod_time: time,
            last_mod_date: date,
            is_directory: false,
        };
        write_lfh(&mut buf, &entry)?;
        buf.extend_from_slice(&payload);
        directory.push(entry);
    }

    let cd_offset = buf.len() as u32;
    for entry in &directory {
        write_cdfh(&mut buf, entry)?;
    }
    let cd_size = buf.len() as u32 - cd_offset;
    write_eocd(&mut buf, directory.len() as u16, cd_size, cd_offset)?;

    fs::create_dir_all(output_dir)?;
    fs::write(&zip_path, &buf)
        .map_err(|e| Error::ArchiveCreation(format!("{}: {e}", zip_path.display())))?;

    tracing::debug!(
        archive = %zip_path.display(),
        files = directory.len(),
        bytes = buf.len(),
        "created archive"
    );
    Ok(zip_path)
}

fn write_lfh(buf: &mut Vec<u8>, entry: &ZipFileEntry) -> std::io::Result<()> {
    let name = entry.file_name.as_bytes();
    buf.extend_from_slice(LFH_SIGNATURE);
    buf.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    buf.write_u16::<LittleEndian>(0)?; // general purpose flags
    buf.write_u16::<LittleEndian>(entry.compression_method.as_u16())?;
    buf.write_u16::<LittleEndian>(entry.last_mod_time)?;
    buf.write_u16::<LittleEndian>(entry.last_mod_date)?;
    buf.write_u32::<LittleEndian>(entry.crc32)?;
    buf.write_u32::<LittleEndian>(entry.compressed_size)?;
    buf.write_u32::<LittleEndian>(entry.uncompressed_size)?;
    buf.write_u16::<LittleEndian>(name.len() as u16)?;
    buf.write_u16::<LittleEndian>(0)?; // extra field length
    buf.extend_from_slice(name);
    Ok(())
}

fn write_cdfh(buf: &mut Vec<u8>, entry: &ZipFileEntry) -> std::io::Result<()> {
    let name = entry.file_name.as_bytes();
    buf.extend_from_slice(CDFH_SIGNATURE);
    buf.write_u16::<LittleEndian>(VERSION_NEEDED)?; // version made by
    buf.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    buf.write_u16::<LittleEndian>(0)?; // general purpose flags
    buf.write_u16::<LittleEndian>(entry.compression_method.as_u16())?;
    buf.write_u16::<LittleEndian>(entry.last_mod_time)?;
    buf.write_u16::<LittleEndian>(entry.last_mod_date)?;
    buf.write_u32::<LittleEndian>(entry.crc32)?;
    buf.write_u32::<LittleEndian>(entry.compressed_size)?;
    buf.write_u32::<LittleEndian>(entry.uncompressed_size)?;
    buf.write_u16::<LittleEndian>(name.len() as u16)?;
    buf.write_u16::<LittleEndian>(0)?; // extra field length
    buf.write_u16::<LittleEndian>(0)?; // comment length
    buf.write_u16::<LittleEndian>(0)?; // disk number start
    buf.write_u16::<LittleEndian>(0)?; // internal attributes
    buf.write_u32::<LittleEndian>(0)?; // external attributes
    buf.write_u32::<LittleEndian>(entry.lfh_offset)?;
    buf.extend_from_slice(name);
    Ok(())
}

fn write_eocd(buf: &mut Vec<u8>, entries: u16, cd_size: u32, cd_offset: u32) -> std::io::Result<()> {
    buf.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
    buf.write_u16::<LittleEndian>(0)?; // disk number
    buf.write_u16::<LittleEndian>(0)?; // disk with central directory
    buf.write_u16::<LittleEndian>(entries)?;
    buf.write_u16::<LittleEndian>(entries)?;
    buf.write_u32::<LittleEndian>(cd_size)?;
    buf.write_u32::<LittleEndian>(cd_offset)?;
    buf.write_u16::<LittleEndian>(0)?; // comment length
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::archive::ZipExtractor;

    #[test]
    fn archive_round_trips_through_the_extractor() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("data.shp");
        // repetitive content so deflate actually kicks in
        let content = b"coordinate coordinate coordinate coordinate".repeat(64);
        fs::write(&input, &content).unwrap();

        let zip = create_archive(dir.path(), "bundle", &[input]).unwrap();
        assert_eq!(zip.file_name().unwrap(), "bundle.zip");

        let extractor = ZipExtractor::new(fs::read(&zip).unwrap());
        let entries = extractor.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "data.shp");
        assert_eq!(
            entries[0].compression_method,
            CompressionMethod::Deflate
        );
        assert!(entries[0].compressed_size < entries[0].uncompressed_size);
        assert_eq!(extractor.read_entry(&entries[0]).unwrap(), content);
    }

    #[test]
    fn incompressible_content_is_stored() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("noise.bin");
        // splitmix64 stream: statistically random bytes deflate cannot shrink
        let mut state = 0x9e3779b97f4a7c15u64;
        let mut content = Vec::with_capacity(4096);
        while content.len() < 4096 {
            state = state.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            z ^= z >> 31;
            content.extend_from_slice(&z.to_le_bytes());
        }
        fs::write(&input, &content).unwrap();

        let zip = create_archive(dir.path(), "noise", &[input]).unwrap();
        let extractor = ZipExtractor::new(fs::read(&zip).unwrap());
        let entries = extractor.entries().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(extractor.read_entry(&entries[0]).unwrap(), content);
    }

    #[test]
    fn missing_inputs_are_all_reported_and_nothing_is_written() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("ok.shp");
        fs::write(&present, b"ok").unwrap();
        let gone1 = dir.path().join("missing.dbf");
        let gone2 = dir.path().join("missing.shx");

        let err = create_archive(
            dir.path(),
            "partial",
            &[present, gone1.clone(), gone2.clone()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingFiles(paths) if paths == vec![gone1, gone2]));
        assert!(!dir.path().join("partial.zip").exists());
    }

    #[test]
    fn output_directory_is_created() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("x.dbf");
        fs::write(&input, b"x").unwrap();

        let out = dir.path().join("nested").join("deeper");
        let zip = create_archive(&out, "arch.zip", &[input]).unwrap();
        assert_eq!(zip, out.join("arch.zip"));
        assert!(zip.is_file());
    }

    #[test]
    fn paths_are_flattened_to_base_names() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("deeply").join("nested");
        fs::create_dir_all(&sub).unwrap();
        let input = sub.join("data.shx");
        fs::write(&input, b"idx").unwrap();

        let zip = create_archive(dir.path(), "flat", &[input]).unwrap();
        let extractor = ZipExtractor::new(fs::read(&zip).unwrap());
        assert_eq!(extractor.entries().unwrap()[0].file_name, "data.shx");
    }
}

//! ROM image assignment
//!
//! ROM dumps are raw and headerless. Each file goes to the first declared
//! region whose `fileMatch` token appears (case-insensitively) in its name.

use crate::bus::ArcadeBus;
use crate::config::RomRegion;
use emu_core::logging::{log, LogCategory, LogLevel};
use std::fs;
use std::path::{Path, PathBuf};

/// One file placed into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRom {
    pub file_name: String,
    pub file_match: String,
    pub start: u16,
    pub bytes_loaded: usize,
    /// Bytes past the region size that were dropped
    pub bytes_ignored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomLoadReport {
    pub loaded: Vec<LoadedRom>,
    /// Files that matched no region
    pub skipped: Vec<String>,
}

impl RomLoadReport {
    /// Regions that did not receive any file
    pub fn missing<'a>(&self, regions: &'a [RomRegion]) -> Vec<&'a RomRegion> {
        regions
            .iter()
            .filter(|region| {
                !self
                    .loaded
                    .iter()
                    .any(|rom| rom.file_match == region.file_match && rom.start == region.start)
            })
            .collect()
    }
}

/// First region whose token matches `file_name`
pub fn match_region<'a>(regions: &'a [RomRegion], file_name: &str) -> Option<&'a RomRegion> {
    regions.iter().find(|region| region.matches(file_name))
}

/// Copy one image into its region, truncating to the region size
pub fn load_into_region(
    bus: &mut ArcadeBus,
    region: &RomRegion,
    file_name: &str,
    data: &[u8],
) -> LoadedRom {
    let bytes_loaded = data.len().min(region.size);
    bus.load(region.start, &data[..bytes_loaded]);
    log(LogCategory::Bus, LogLevel::Info, || {
        format!(
            "Loaded {} at 0x{:04X} ({} bytes)",
            file_name, region.start, bytes_loaded
        )
    });
    LoadedRom {
        file_name: file_name.to_string(),
        file_match: region.file_match.clone(),
        start: region.start,
        bytes_loaded,
        bytes_ignored: data.len() - bytes_loaded,
    }
}

/// Assign every `(file name, bytes)` pair to a region
pub fn load_rom_set<I, N, D>(regions: &[RomRegion], bus: &mut ArcadeBus, files: I) -> RomLoadReport
where
    I: IntoIterator<Item = (N, D)>,
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut report = RomLoadReport::default();
    for (name, data) in files {
        let name = name.as_ref();
        match match_region(regions, name) {
            Some(region) => report
                .loaded
                .push(load_into_region(bus, region, name, data.as_ref())),
            None => {
                log(LogCategory::Bus, LogLevel::Info, || {
                    format!("Skipping {}: no ROM region matches", name)
                });
                report.skipped.push(name.to_string());
            }
        }
    }
    report
}

/// Supplier of `(file name, bytes)` pairs
pub trait RomSource {
    fn rom_files(&self) -> std::io::Result<Vec<(String, Vec<u8>)>>;
}

/// Every regular file in one directory, in file-name order
#[derive(Debug, Clone)]
pub struct DirRomSource {
    dir: PathBuf,
}

impl DirRomSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl RomSource for DirRomSource {
    fn rom_files(&self) -> std::io::Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, fs::read(entry.path())?));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

impl RomSource for Vec<(String, Vec<u8>)> {
    fn rom_files(&self) -> std::io::Result<Vec<(String, Vec<u8>)>> {
        Ok(self.clone())
    }
}

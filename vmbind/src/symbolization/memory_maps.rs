//! Memory mapping utilities for locating the loaded runtime image
//!
//! Parses `/proc/<pid>/maps` to find where the runtime library (usually
//! `libjvm.so`) is mapped. The lowest mapping start is the image's load
//! base, which relocates link-time symbol values to live addresses.

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Address;

/// Memory range of a loaded binary in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// A runtime image: its file on disk and, when mapped, its live range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub range: Option<MemoryRange>,
}

impl LoadedImage {
    /// An image read from disk only; symbols keep their link-time values
    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), range: None }
    }

    /// An image mapped at `base` (e.g. taken from a core dump or `--base`)
    pub fn mapped_at(path: impl Into<PathBuf>, base: u64) -> Self {
        Self { path: path.into(), range: Some(MemoryRange { start: base, end: base }) }
    }

    /// Load base of the image, 0 when not mapped
    #[must_use]
    pub fn base(&self) -> u64 {
        self.range.map_or(0, |r| r.start)
    }

    /// Whether `addr` lies inside the mapped image (false when unmapped)
    #[must_use]
    pub fn contains(&self, addr: Address) -> bool {
        self.range.is_some_and(|r| r.contains(addr.0 as u64))
    }
}

/// Locate `library` in the current process
///
/// # Errors
/// Returns an error if `/proc/self/maps` cannot be read or the library is not mapped
pub fn locate_in_self(library: &str) -> Result<LoadedImage> {
    locate_in_maps(Path::new("/proc/self/maps"), library)
}

/// Locate `library` in process `pid`
///
/// # Errors
/// Returns an error if `/proc/<pid>/maps` cannot be read or the library is not mapped
pub fn locate_in_process(pid: i32, library: &str) -> Result<LoadedImage> {
    locate_in_maps(Path::new(&format!("/proc/{pid}/maps")), library)
}

fn locate_in_maps(maps_path: &Path, library: &str) -> Result<LoadedImage> {
    let maps = fs::read_to_string(maps_path)
        .with_context(|| format!("Failed to read {}", maps_path.display()))?;

    let image = parse_memory_maps(&maps, library)?
        .with_context(|| format!("Could not find {library} in {}", maps_path.display()))?;

    if let Some(range) = image.range {
        info!(
            "{} mapped at 0x{:x} - 0x{:x} (size: {} KB)",
            image.path.display(),
            range.start,
            range.end,
            (range.end - range.start) / 1024
        );
    }
    Ok(image)
}

/// Find all mappings whose file name starts with `library`
///
/// Returns the first matching path and the range from the minimum start
/// address to the maximum end address of that path's mappings.
///
/// # Errors
/// Returns an error if a matching line has a malformed address range
pub fn parse_memory_maps(maps: &str, library: &str) -> Result<Option<LoadedImage>> {
    let mut path: Option<&str> = None;
    let mut start_addr = None;
    let mut end_addr = None;

    for line in maps.lines() {
        let Some((range, pathname)) = split_maps_line(line) else {
            continue;
        };
        let matches = match path {
            Some(p) => p == pathname,
            None => Path::new(pathname)
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(library)),
        };
        if !matches {
            continue;
        }

        let (start, end) = range.split_once('-').context("Malformed address range")?;
        let start = u64::from_str_radix(start, 16).context("Failed to parse range start")?;
        let end = u64::from_str_radix(end, 16).context("Failed to parse range end")?;

        path = Some(pathname);
        start_addr = Some(start_addr.map_or(start, |s: u64| s.min(start)));
        end_addr = Some(end_addr.map_or(end, |e: u64| e.max(end)));
    }

    Ok(match (path, start_addr, end_addr) {
        (Some(path), Some(start), Some(end)) => {
            Some(LoadedImage { path: PathBuf::from(path), range: Some(MemoryRange { start, end }) })
        }
        _ => None,
    })
}

/// Split "start-end perms offset dev inode pathname" into range and pathname
///
/// The pathname is everything after the fifth field, spaces included.
/// Anonymous mappings have no pathname and yield `None`.
fn split_maps_line(line: &str) -> Option<(&str, &str)> {
    let mut rest = line.trim_start();
    let mut range = "";
    for field in 0..5 {
        let end = rest.find(char::is_whitespace)?;
        if field == 0 {
            range = &rest[..end];
        }
        rest = rest[end..].trim_start();
    }
    let pathname = rest.trim_end();
    (!pathname.is_empty()).then_some((range, pathname))
}

//! Pre-flight checks for the vmbind probe
//!
//! Validates that the runtime image and the target process are accessible
//! before scanning. Provides clear, actionable error messages when they are not.

#![allow(unsafe_code)] // geteuid() requires unsafe

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Run the image checks
///
/// # Errors
/// Returns an error if the image does not exist or is not a file
pub fn run_preflight_checks(image_path: &Path, quiet: bool) -> Result<()> {
    check_image_exists(image_path)?;
    check_symbol_tables(image_path, quiet)?;
    Ok(())
}

/// Check if the runtime image exists and is a regular file
fn check_image_exists(image_path: &Path) -> Result<()> {
    if !image_path.exists() {
        bail!(
            "Runtime image not found: {}\n\n\
             Point --image at libjvm.so, e.g. $JAVA_HOME/lib/server/libjvm.so",
            image_path.display()
        );
    }
    if !image_path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --image must point to the runtime library, not a directory.",
            image_path.display()
        );
    }
    Ok(())
}

/// Warn when local symbols (needed for `Unsafe_Park`) cannot be found
fn check_symbol_tables(image_path: &Path, quiet: bool) -> Result<()> {
    if quiet {
        return Ok(());
    }

    let file_data = std::fs::read(image_path)
        .with_context(|| format!("Failed to read runtime image: {}", image_path.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        // Not a valid object file, let the scan report it
        return Ok(());
    };

    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);
    let has_debuglink = obj.section_by_name(".gnu_debuglink").is_some();

    if !has_symtab && !has_debuglink {
        eprintln!("warning: runtime image stripped, local entry points will be unavailable");
    } else if !has_symtab {
        eprintln!("warning: no .symtab, local entry points depend on installed debuginfo");
    }

    Ok(())
}

/// Check that we may read another process's memory maps
///
/// # Errors
/// Returns an error if the process does not exist, its maps are unreadable,
/// or it belongs to another user and we are not root
pub fn check_proc_access(pid: i32) -> Result<()> {
    let proc_path = format!("/proc/{pid}");
    let metadata = std::fs::metadata(&proc_path).with_context(|| {
        format!(
            "Process {pid} not found.\n\n\
             Is the JVM still running? Check with: ps -p {pid}"
        )
    })?;

    let euid = unsafe { libc::geteuid() };
    if euid != 0 && metadata.uid() != euid {
        bail!(
            "Permission denied: process {pid} belongs to uid {}.\n\n\
             Run as that user or with: sudo vmbind --pid {pid}",
            metadata.uid()
        );
    }

    let maps_path = format!("{proc_path}/maps");
    std::fs::read_to_string(&maps_path).with_context(|| {
        format!(
            "Cannot read {maps_path}\n\n\
             This usually means:\n\
             - The process exited (check: ps -p {pid})\n\
             - Permission denied (ptrace scope, run with sudo)\n\
             - /proc is not mounted"
        )
    })?;
    Ok(())
}

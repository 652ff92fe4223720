//! Separate debuginfo lookup for stripped runtime images
//!
//! Distribution builds of `libjvm.so` usually ship without `.symtab`, which
//! holds the local (non-exported) entry points. The `.gnu_debuglink` section
//! names a companion file that does carry them.

use log::debug;
use object::Object;
use std::path::{Path, PathBuf};

/// Global debug directory searched after the image's own directory
const GLOBAL_DEBUG_DIR: &str = "/usr/lib/debug";

/// Locate the debuginfo companion of `image_path`, if one exists on disk
pub fn find_for(image_path: &Path, image_data: &[u8]) -> Option<PathBuf> {
    let file = object::File::parse(image_data).ok()?;
    let (link, _crc) = file.gnu_debuglink().ok()??;
    let link = std::str::from_utf8(link).ok()?;

    candidates(image_path, link).into_iter().find(|candidate| {
        let exists = candidate.is_file();
        debug!("debuginfo candidate {} (exists: {exists})", candidate.display());
        exists
    })
}

/// Search order used by gdb: `<dir>/<link>`, `<dir>/.debug/<link>`,
/// `/usr/lib/debug/<dir>/<link>`
#[must_use]
pub fn candidates(image_path: &Path, link: &str) -> Vec<PathBuf> {
    let dir = image_path.parent().unwrap_or_else(|| Path::new("/"));
    let relative_dir = dir.strip_prefix("/").unwrap_or(dir);

    vec![
        dir.join(link),
        dir.join(".debug").join(link),
        Path::new(GLOBAL_DEBUG_DIR).join(relative_dir).join(link),
    ]
}

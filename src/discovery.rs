use crate::config::CompileOptions;
use crate::error::CompileError;
use crate::ignore::IgnoreSet;
use log::trace;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Lists the resource files under `root`, as sorted `/`-separated paths
/// relative to `root`.
///
/// Entries whose name starts with `.` are skipped, files and directories
/// alike. Symbolic links are not followed into directories, but a link with
/// a resource extension is listed like a file. Directories matched by `ignore` are not entered; files are kept
/// when their extension is one of the configured ones and `ignore` does not
/// match them.
///
/// # Errors
/// Returns `CompileError::Walk` naming the first directory that cannot be
/// read.
pub fn find_resource_files(
    root: &Path,
    ignore: &IgnoreSet,
    options: &CompileOptions,
) -> Result<Vec<String>, CompileError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(root, entry, ignore));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| CompileError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;

        // Symlinks are listed unless they point at a directory; a dangling
        // one then fails when it is read.
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !options.is_candidate(&name) {
            continue;
        }

        let relative = relative_path(root, entry.path());
        if ignore.is_excluded(&relative, false) {
            trace!("ignoring {relative}");
            continue;
        }
        trace!("found resource file {relative}");
        files.push(relative);
    }

    files.sort();
    Ok(files)
}

fn keep_entry(root: &Path, entry: &DirEntry, ignore: &IgnoreSet) -> bool {
    // The root itself may well be "." or a hidden directory.
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return false;
    }
    if entry.file_type().is_dir() {
        let relative = relative_path(root, entry.path());
        if ignore.is_excluded(&relative, true) {
            trace!("ignoring directory {relative}");
            return false;
        }
    }
    true
}

pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

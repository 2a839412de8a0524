use std::io::Write;
use std::fs::Permissions;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub static START_MARKER: &str = "<!-- SPOTIFY_ACTIVITY_START -->";
pub static END_MARKER: &str = "<!-- SPOTIFY_ACTIVITY_END -->";
pub static DEFAULT_ANCHOR: &str = "## 🏃‍♀️ Activities";

/// Where the fragment ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Replaced the content between existing markers
    Replaced,
    /// Inserted before the anchor heading
    BeforeAnchor,
    Appended,
}

/// Splice `fragment` into `content`.
///
/// With both markers present only the text strictly between the first start marker and the
/// first end marker after it is replaced. Otherwise a marked section is inserted right before
/// `anchor`, or appended when the anchor is missing too.
///
/// A start marker without a matching end marker counts as missing. The section inserted on
/// that run then pairs with the stray start marker on the next one, so the text between the
/// two is replaced from then on.
pub fn patch(content: &str, fragment: &str, anchor: &str) -> (String, Placement) {
    if let Some(start) = content.find(START_MARKER) {
        let inner = start + START_MARKER.len();
        if let Some(end) = content[inner..].find(END_MARKER) {
            let end = inner + end;
            let patched = format!("{}\n{fragment}\n{}", &content[..inner], &content[end..]);
            return (patched, Placement::Replaced);
        }
    }

    let section = format!("{START_MARKER}\n{fragment}\n{END_MARKER}");
    match (!anchor.is_empty()).then(|| content.find(anchor)).flatten() {
        Some(position) => (
            format!("{}{section}\n\n{}", &content[..position], &content[position..]),
            Placement::BeforeAnchor,
        ),
        None => (format!("{content}\n\n{section}"), Placement::Appended),
    }
}

/// Patch the README at `path` in place
pub fn update_readme<P: AsRef<Path>>(path: P, fragment: &str, anchor: &str) -> Result<Placement> {
    Readme::read(path)?.update(fragment, anchor)
}

/// A README read into memory, waiting to be patched
#[derive(Debug, Clone)]
pub struct Readme {
    path: PathBuf,
    content: String,
}

impl Readme {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Splice `fragment` in and write the result back
    pub fn update(self, fragment: &str, anchor: &str) -> Result<Placement> {
        let (patched, placement) = patch(&self.content, fragment, anchor);
        write_atomic(&self.path, &patched)?;
        Ok(placement)
    }
}

/// Write `contents` to `path`, creating missing parent directories
pub fn write_side_file<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    write_atomic(path, contents)
}

/// Write through a temp file in the target's directory that is then renamed over the target,
/// so readers only ever see the old or the new file.
///
/// The target keeps its permissions. New files get the usual `0644`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(path)
        .map(|metadata| metadata.permissions())
        .ok()
        .or_else(new_file_permissions);

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|err| Error::io(dir, err))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| match permissions {
            Some(permissions) => file.as_file().set_permissions(permissions),
            None => Ok(()),
        })
        .and_then(|_| file.as_file().sync_all())
        .map_err(|err| Error::io(file.path(), err))?;
    file.persist(path).map_err(|err| Error::io(path, err.error))?;
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

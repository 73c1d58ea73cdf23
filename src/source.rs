//! Access to the examined system
//!
//! Plugins never touch the evidence directly. They go through [`MacInfo`],
//! which knows the users of the system, can tell whether a path exists,
//! reads property lists and exports copies of the files that were parsed.

use crate::diag::Diagnostics;
use crate::errors::Error;
use crate::utils::next_available_file_name;
use std::path::{Path, PathBuf};

const TARGET: &str = "dockitems::source";

/// A user account on the examined system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_name: String,
    /// Home directory as seen from inside the examined system
    pub home_dir: String,
}

impl UserInfo {
    pub fn new(user_name: impl Into<String>, home_dir: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            home_dir: home_dir.into(),
        }
    }
}

/// The examined system, as seen by a plugin.
///
/// Paths are absolute paths inside the examined system (e.g.
/// `/Users/alice/Library/Preferences/com.apple.dock.plist`).
pub trait MacInfo {
    fn users(&self) -> &[UserInfo];

    /// Returns true when `path` names an existing regular file
    fn is_valid_file_path(&self, path: &str) -> bool;

    /// Saves a copy of `path` under the export folder for `tag`.
    ///
    /// Exporting is a side effect; failures are reported, not returned.
    fn export_file(&self, path: &str, tag: &str);

    fn read_plist(&self, path: &str) -> Result<plist::Value, Error>;
}

/// A macOS volume mounted (or copied) into a local directory.
pub struct MountedVolume<D> {
    root: PathBuf,
    export_dir: Option<PathBuf>,
    users: Vec<UserInfo>,
    diag: D,
}

impl<D: Diagnostics> MountedVolume<D> {
    /// Opens the volume rooted at `root`, discovering users from the
    /// directories under `<root>/Users`.
    pub fn open(root: impl AsRef<Path>, diag: D) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        let users = discover_users(&root)?;
        for user in &users {
            diag.debug(
                TARGET,
                format_args!("Found user {} with home {}", user.user_name, user.home_dir),
            );
        }

        Ok(Self {
            root,
            export_dir: None,
            users,
            diag,
        })
    }

    /// Uses an explicit list of users instead of the discovered ones
    #[must_use]
    pub fn with_users(mut self, users: Vec<UserInfo>) -> Self {
        self.users = users;
        self
    }

    /// Enables exporting parsed files into `dir`
    #[must_use]
    pub fn export_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Maps a path inside the examined system onto the local filesystem
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn try_export(&self, path: &str, tag: &str, export_dir: &Path) -> Result<PathBuf, Error> {
        let source = self.resolve(path);
        let folder = export_dir.join(tag);
        std::fs::create_dir_all(&folder)?;

        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("unnamed"));
        let destination = next_available_file_name(&folder.join(file_name));
        std::fs::copy(&source, &destination)?;
        Ok(destination)
    }
}

fn discover_users(root: &Path) -> Result<Vec<UserInfo>, Error> {
    let users_dir = root.join("Users");
    if !users_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut users = Vec::new();
    for entry in std::fs::read_dir(&users_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == "Shared" {
            continue;
        }

        let home_dir = format!("/Users/{}", name);
        users.push(UserInfo::new(name, home_dir));
    }

    users.sort_by(|a, b| a.user_name.cmp(&b.user_name));
    Ok(users)
}

impl<D: Diagnostics> MacInfo for MountedVolume<D> {
    fn users(&self) -> &[UserInfo] {
        &self.users
    }

    fn is_valid_file_path(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn export_file(&self, path: &str, tag: &str) {
        let Some(export_dir) = self.export_dir.as_deref() else {
            return;
        };

        match self.try_export(path, tag, export_dir) {
            Ok(destination) => self.diag.debug(
                TARGET,
                format_args!("Exported {} to {}", path, destination.display()),
            ),
            Err(err) => self
                .diag
                .error(TARGET, format_args!("Failed to export {}: {}", path, err)),
        }
    }

    fn read_plist(&self, path: &str) -> Result<plist::Value, Error> {
        Ok(plist::Value::from_file(self.resolve(path))?)
    }
}

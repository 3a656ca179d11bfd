//! Filesystem-backed resource store
//!
//! Resources live at `<root>/<library>/<name>`; identifiers without a library live directly
//! under the root.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::{ByteStream, ResourceStore, StoredResource, mime_type_for};
use crate::error::{Result, fs};
use crate::resource::ResourceIdentifier;

/// Serves resources from a directory tree
#[derive(Debug, Clone)]
pub struct FsResourceStore {
    root: PathBuf,
}

impl FsResourceStore {
    /// Create a store rooted at `root`, which must be an existing directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(fs::not_found(root.display().to_string()));
        }
        let root = dunce::canonicalize(root)
            .map_err(|e| fs::read_failed(root.display().to_string(), e.to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an identifier to a path under the root
    ///
    /// Returns `None` for names that would escape the root.
    pub fn path_of(&self, id: &ResourceIdentifier) -> Option<PathBuf> {
        let mut path = self.root.clone();
        if let Some(library) = id.library() {
            path.push(normal_relative(library)?);
        }
        path.push(normal_relative(id.name())?);
        Some(path)
    }

    /// All identifiers in the store, sorted by string form
    ///
    /// Files directly under the root have no library; deeper files take their first
    /// directory as library.
    pub fn identifiers(&self) -> Vec<ResourceIdentifier> {
        let mut ids: Vec<ResourceIdentifier> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&self.root).ok()?;
                let relative = relative.to_string_lossy().replace('\\', "/");
                let id = match relative.split_once('/') {
                    Some((library, name)) => ResourceIdentifier::new(Some(library), name),
                    None => ResourceIdentifier::new(None, &relative),
                };
                id.ok()
            })
            .collect();
        ids.sort_by_cached_key(ToString::to_string);
        ids
    }
}

/// Accept only plain relative paths (no `..`, no root, no prefix)
fn normal_relative(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw.trim_start_matches('/'));
    if path
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        Some(path.to_path_buf())
    } else {
        None
    }
}

impl ResourceStore for FsResourceStore {
    fn resolve(&self, id: &ResourceIdentifier) -> Option<StoredResource> {
        if id.is_wildcard() {
            return None;
        }
        let path = self.path_of(id)?;
        let metadata = std::fs::metadata(&path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let last_modified = metadata.modified().ok()?;

        Some(StoredResource {
            identifier: id.clone(),
            content_length: metadata.len(),
            last_modified,
            mime_type: mime_type_for(id.name()),
        })
    }

    fn open(&self, resource: &StoredResource) -> io::Result<Box<dyn ByteStream>> {
        let path = self.path_of(&resource.identifier).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} escapes the resource root", resource.identifier),
            )
        })?;
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, FsResourceStore) {
        let temp = TempDir::new().unwrap();
        for (path, content) in files {
            let file = temp.path().join(path);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, content).unwrap();
        }
        let store = FsResourceStore::new(temp.path()).unwrap();
        (temp, store)
    }

    #[test]
    fn test_resolve_and_open() {
        let (_temp, store) = store_with(&[("lib/a.css", "body{}")]);
        let id = ResourceIdentifier::parse("lib:a.css").unwrap();

        let resource = store.resolve(&id).unwrap();
        assert_eq!(resource.content_length, 6);
        assert_eq!(resource.mime_type, "text/css");

        let mut content = String::new();
        store
            .open(&resource)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "body{}");
    }

    #[test]
    fn test_resolve_missing() {
        let (_temp, store) = store_with(&[("lib/a.css", "x")]);
        assert!(
            store
                .resolve(&ResourceIdentifier::parse("lib:b.css").unwrap())
                .is_none()
        );
        // directories are not resources
        assert!(
            store
                .resolve(&ResourceIdentifier::parse("lib").unwrap())
                .is_none()
        );
    }

    #[test]
    fn test_rejects_traversal() {
        let (_temp, store) = store_with(&[("lib/a.css", "x")]);
        let id = ResourceIdentifier::parse("lib:../../etc/passwd").unwrap();
        assert!(store.path_of(&id).is_none());
        assert!(store.resolve(&id).is_none());
    }

    #[test]
    fn test_identifiers() {
        let (_temp, store) = store_with(&[
            ("lib/sub/b.js", "b"),
            ("lib/a.css", "a"),
            ("root.js", "r"),
        ]);
        let ids: Vec<String> = store.identifiers().iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["lib:a.css", "lib:sub/b.js", "root.js"]);
    }

    #[test]
    fn test_new_requires_directory() {
        assert!(FsResourceStore::new("/nonexistent/combres/root").is_err());
    }
}

//! Content-addressed access to a repository's trees and blobs.
//!
//! Traversal only ever needs two reads: list a tree, read a blob. Keeping that
//! behind [`ObjectStore`] lets the analyzer run against a bare gix clone in
//! production and against an in-memory map in tests.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
    /// Symlinks and submodules are never followed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub id: ObjectId,
    pub kind: EntryKind,
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object {0} not found")]
    Missing(ObjectId),
    #[error("object {id} is not a {expected}")]
    WrongKind { id: ObjectId, expected: &'static str },
    #[error("object database error: {0}")]
    Backend(String),
}

pub trait ObjectStore {
    fn tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, ObjectStoreError>;
    fn blob(&self, id: &ObjectId) -> Result<Vec<u8>, ObjectStoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone)]
enum StoredObject {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
}

/// Object map keyed by a hash of each object's content.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<ObjectId, StoredObject>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_blob(&mut self, content: impl Into<Vec<u8>>) -> ObjectId {
        let content = content.into();
        let id = content_id("blob", &content);
        self.objects.insert(id.clone(), StoredObject::Blob(content));
        id
    }

    pub fn insert_tree(&mut self, mut entries: Vec<TreeEntry>) -> ObjectId {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mut key = Vec::new();
        for entry in &entries {
            key.extend_from_slice(entry.name.as_bytes());
            key.push(0);
            key.extend_from_slice(entry.id.as_str().as_bytes());
            key.push(b'\n');
        }
        let id = content_id("tree", &key);
        self.objects.insert(id.clone(), StoredObject::Tree(entries));
        id
    }

    /// Build a store from `(path, content)` pairs, returning the root tree.
    /// Paths use `/` separators.
    pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> (Self, ObjectId)
    where
        P: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        #[derive(Default)]
        struct Dir {
            files: Vec<(String, Vec<u8>)>,
            dirs: std::collections::BTreeMap<String, Dir>,
        }

        fn write(store: &mut MemoryObjectStore, dir: Dir) -> ObjectId {
            let mut entries = Vec::new();
            for (name, content) in dir.files {
                entries.push(TreeEntry {
                    name,
                    id: store.insert_blob(content),
                    kind: EntryKind::Blob,
                });
            }
            for (name, sub) in dir.dirs {
                entries.push(TreeEntry {
                    name,
                    id: write(store, sub),
                    kind: EntryKind::Tree,
                });
            }
            store.insert_tree(entries)
        }

        let mut root = Dir::default();
        for (path, content) in files {
            let mut parts: Vec<&str> = path.as_ref().split('/').filter(|p| !p.is_empty()).collect();
            let Some(name) = parts.pop() else { continue };
            let mut dir = &mut root;
            for part in parts {
                dir = dir.dirs.entry(part.to_string()).or_default();
            }
            dir.files.push((name.to_string(), content.into()));
        }

        let mut store = Self::new();
        let id = write(&mut store, root);
        (store, id)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, ObjectStoreError> {
        match self.objects.get(id) {
            Some(StoredObject::Tree(entries)) => Ok(entries.clone()),
            Some(StoredObject::Blob(_)) => Err(ObjectStoreError::WrongKind {
                id: id.clone(),
                expected: "tree",
            }),
            None => Err(ObjectStoreError::Missing(id.clone())),
        }
    }

    fn blob(&self, id: &ObjectId) -> Result<Vec<u8>, ObjectStoreError> {
        match self.objects.get(id) {
            Some(StoredObject::Blob(data)) => Ok(data.clone()),
            Some(StoredObject::Tree(_)) => Err(ObjectStoreError::WrongKind {
                id: id.clone(),
                expected: "blob",
            }),
            None => Err(ObjectStoreError::Missing(id.clone())),
        }
    }
}

/// 64-bit FNV-1a over kind and content, hex encoded.
fn content_id(kind: &str, content: &[u8]) -> ObjectId {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in kind.as_bytes().iter().chain([0u8].iter()).chain(content) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    ObjectId(format!("{hash:016x}"))
}

// ============================================================================
// gix-backed store
// ============================================================================

/// Reads objects straight from a (bare) repository's object database.
pub struct GixObjectStore {
    repo: gix::Repository,
}

impl GixObjectStore {
    #[must_use]
    pub fn new(repo: gix::Repository) -> Self {
        Self { repo }
    }

    /// Root tree and id of the commit `HEAD` points at.
    pub fn head_tree(&self) -> Result<(ObjectId, ObjectId), ObjectStoreError> {
        let commit = self
            .repo
            .head_commit()
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        let tree_id = commit
            .tree_id()
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
        Ok((
            ObjectId(tree_id.detach().to_string()),
            ObjectId(commit.id.to_string()),
        ))
    }

    fn object_id(id: &ObjectId) -> Result<gix::ObjectId, ObjectStoreError> {
        gix::ObjectId::from_hex(id.as_str().as_bytes())
            .map_err(|e| ObjectStoreError::Backend(format!("invalid object id {id}: {e}")))
    }

    fn find(&self, id: &ObjectId) -> Result<gix::Object<'_>, ObjectStoreError> {
        let oid = Self::object_id(id)?;
        self.repo
            .find_object(oid)
            .map_err(|_| ObjectStoreError::Missing(id.clone()))
    }
}

impl ObjectStore for GixObjectStore {
    fn tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>, ObjectStoreError> {
        let object = self.find(id)?;
        if object.kind != gix::object::Kind::Tree {
            return Err(ObjectStoreError::WrongKind {
                id: id.clone(),
                expected: "tree",
            });
        }
        let tree = object.into_tree();
        let mut entries = Vec::new();
        for entry in tree.iter() {
            let entry = entry.map_err(|e| ObjectStoreError::Backend(e.to_string()))?;
            let kind = match entry.mode().kind() {
                gix::object::tree::EntryKind::Blob
                | gix::object::tree::EntryKind::BlobExecutable => EntryKind::Blob,
                gix::object::tree::EntryKind::Tree => EntryKind::Tree,
                gix::object::tree::EntryKind::Link | gix::object::tree::EntryKind::Commit => {
                    EntryKind::Other
                }
            };
            entries.push(TreeEntry {
                name: entry.filename().to_string(),
                id: ObjectId(entry.id().to_string()),
                kind,
            });
        }
        Ok(entries)
    }

    fn blob(&self, id: &ObjectId) -> Result<Vec<u8>, ObjectStoreError> {
        let object = self.find(id)?;
        if object.kind != gix::object::Kind::Blob {
            return Err(ObjectStoreError::WrongKind {
                id: id.clone(),
                expected: "blob",
            });
        }
        Ok(object.data.to_vec())
    }
}

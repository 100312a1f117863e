//! Recursive listing of a remote directory tree.
//!
//! A scan lists the root, then every subdirectory, one call at a time. A
//! subdirectory that fails to list is recorded as a [`SubtreeFailure`] so
//! callers can tell "empty" from "unknown"; only a failure to list the root
//! itself fails the scan.

use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::SUBTREE_FAILURES;
use crate::storage::{join_path, split_path, RemoteEntry, Session, SessionError};

/// One listed filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteNode {
    pub path: String,
    pub is_dir: bool,
    pub size_bytes: u64,
}

impl RemoteNode {
    pub fn file(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            size_bytes,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            size_bytes: 0,
        }
    }

    /// Final path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory containing this node.
    pub fn parent(&self) -> String {
        split_path(&self.path).0
    }
}

/// A directory whose contents could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeFailure {
    pub path: String,
    pub reason: String,
}

/// Result of one scan. Nodes are in pre-order: each directory precedes its
/// contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    pub root: String,
    pub nodes: Vec<RemoteNode>,
    pub failures: Vec<SubtreeFailure>,
}

impl TreeSnapshot {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            nodes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether every directory under the root was listed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn files(&self) -> impl DoubleEndedIterator<Item = &RemoteNode> {
        self.nodes.iter().filter(|n| !n.is_dir)
    }

    pub fn directories(&self) -> impl DoubleEndedIterator<Item = &RemoteNode> {
        self.nodes.iter().filter(|n| n.is_dir)
    }

    /// Directories below the root holding no file at any depth, children
    /// before parents.
    ///
    /// A directory that failed to list, or that has such a directory below
    /// it, is never reported.
    pub fn empty_directories(&self) -> Vec<String> {
        let root = self.root.trim_end_matches('/');
        let mut occupied: HashSet<String> = HashSet::new();

        let mark = |path: &str, occupied: &mut HashSet<String>| {
            let mut current = path.to_string();
            while current.len() > root.len() && current.starts_with(root) {
                if !occupied.insert(current.clone()) {
                    break;
                }
                current = split_path(&current).0;
            }
        };

        for node in self.files() {
            mark(&node.parent(), &mut occupied);
        }
        for failure in &self.failures {
            mark(&failure.path, &mut occupied);
        }

        self.directories()
            .rev()
            .filter(|d| !occupied.contains(&d.path))
            .map(|d| d.path.clone())
            .collect()
    }
}

/// Recursive scanner over the storage service.
pub struct RemoteTree;

impl RemoteTree {
    /// Scan everything under `root`.
    pub async fn scan(session: &Session, root: &str) -> Result<TreeSnapshot, SessionError> {
        let entries = session.list(root).await?;
        let mut snapshot = TreeSnapshot::new(root);
        scan_entries(session, root, entries, &mut snapshot).await;

        debug!(
            root,
            nodes = snapshot.nodes.len(),
            failures = snapshot.failures.len(),
            "Scanned remote tree"
        );
        Ok(snapshot)
    }

    /// Scan `root` and report its empty directories, children first.
    pub async fn find_empty_directories(
        session: &Session,
        root: &str,
    ) -> Result<Vec<String>, SessionError> {
        Ok(Self::scan(session, root).await?.empty_directories())
    }
}

fn scan_entries<'a>(
    session: &'a Session,
    dir: &'a str,
    entries: Vec<RemoteEntry>,
    snapshot: &'a mut TreeSnapshot,
) -> BoxFuture<'a, ()> {
    async move {
        for entry in entries {
            let path = join_path(dir, &entry.name);
            if !entry.is_dir {
                snapshot.nodes.push(RemoteNode::file(path, entry.size));
                continue;
            }

            snapshot.nodes.push(RemoteNode::dir(path.clone()));
            match session.list(&path).await {
                Ok(children) => scan_entries(session, &path, children, snapshot).await,
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to list subdirectory");
                    SUBTREE_FAILURES.inc();
                    snapshot.failures.push(SubtreeFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    .boxed()
}

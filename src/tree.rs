//! The concurrent folder namespace itself.
//!
//! Every node owns a child-map and an [`RwLock`](crate::rwlock::RwLock)
//! guarding it. Every public operation descends from the root acquiring
//! read locks on each intermediate node (never the target — the caller
//! picks the target's own lock mode), performs its mutation under a
//! single write lock held at the deepest appropriate node, then releases
//! the read locks in reverse acquisition order.

use std::sync::Arc;

use crate::childmap::ChildMap;
use crate::error::TreeError;
use crate::path;
use crate::rwlock::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct NodeInner {
    children: RwLock<ChildMap>,
}

/// A handle to one folder in the tree. Cheap to clone (an `Arc` bump);
/// clones refer to the same underlying folder.
#[derive(Clone)]
pub(crate) struct Node(Arc<NodeInner>);

impl Node {
    pub(crate) fn new_empty() -> Self {
        Node(Arc::new(NodeInner {
            children: RwLock::new(ChildMap::new()),
        }))
    }

    fn read(&self) -> RwLockReadGuard<'_, ChildMap> {
        self.0.children.read_lock()
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChildMap> {
        self.0.children.write_lock()
    }

    fn raw_read_lock(&self) {
        self.0.children.raw_read_lock();
    }

    fn raw_read_unlock(&self) {
        self.0.children.raw_read_unlock();
    }

    /// Looks up a child while the caller already holds a read (or
    /// write) lock on `self`, taken either via a guard or via
    /// [`Self::raw_read_lock`].
    ///
    /// # Safety
    /// The caller must hold such a lock on `self` for the duration of
    /// this call.
    unsafe fn get_child_locked(&self, name: &str) -> Option<Node> {
        self.0.children.data_unchecked().get(name).cloned()
    }

    /// The number of children this node has, read without taking this
    /// node's own lock.
    ///
    /// # Safety
    /// The caller must hold the write lock of this node's *parent* —
    /// which, per the tree's locking discipline, guarantees no other
    /// operation can be inside or entering this node concurrently.
    unsafe fn children_len_under_parent_write_lock(&self) -> usize {
        self.0.children.data_unchecked().len()
    }

    /// Mutably accesses this node's child-map without taking its own
    /// lock.
    ///
    /// # Safety
    /// The caller must hold the write lock of an ancestor that
    /// dominates every path to this node — i.e. the LCA write lock
    /// acquired by [`Tree::move_to`] — for the duration of this call,
    /// and must not hold another live reference obtained this way over
    /// the same node at the same time.
    unsafe fn children_mut_under_ancestor_write_lock(&self) -> &mut ChildMap {
        self.0.children.data_unchecked_mut()
    }
}

/// Walks from `node` down `path`, acquiring a read lock on every
/// intermediate node (not the target) and retaining locks already taken
/// along a path that turns out not to exist, per the descent contract:
/// every successful or partial `lock_descend` must be paired with an
/// `unlock_descend` over the *same* path.
fn lock_descend(node: &Node, path: &str) -> Option<Node> {
    match path::split_first_component(path) {
        None => Some(node.clone()),
        Some((component, rest)) => {
            node.raw_read_lock();
            // SAFETY: the read lock was just acquired above.
            let child = unsafe { node.get_child_locked(component) };
            match child {
                Some(child) => lock_descend(&child, rest),
                None => None,
            }
        }
    }
}

/// Releases the read locks taken by a `lock_descend` call over the same
/// `path`, in reverse (LIFO) order via post-order recursion. Tolerates
/// the tail of the path being missing, matching a `lock_descend` that
/// aborted partway through.
fn unlock_descend(node: &Node, path: &str) {
    if let Some((component, rest)) = path::split_first_component(path) {
        // SAFETY: this node is currently locked by the matching
        // `lock_descend` call over the same path.
        let child = unsafe { node.get_child_locked(component) };
        if let Some(child) = child {
            unlock_descend(&child, rest);
        }
        node.raw_read_unlock();
    }
}

/// Descends `path` without taking any locks — valid only when the
/// caller already holds a write lock on an ancestor that dominates the
/// whole path (as `Tree::move_to` does at the LCA).
fn weak_descend(node: &Node, path: &str) -> Option<Node> {
    match path::split_first_component(path) {
        None => Some(node.clone()),
        Some((component, rest)) => {
            // SAFETY: caller holds a dominating ancestor write lock.
            let child = unsafe { node.get_child_locked(component) };
            match child {
                Some(child) => weak_descend(&child, rest),
                None => None,
            }
        }
    }
}

/// A concurrent in-memory folder namespace.
///
/// Construct with [`Tree::new`]; tearing it down is ordinary `Drop` —
/// there is no explicit `free`, since the root's `Arc` recursively drops
/// every folder still reachable from it once the last handle goes away.
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Creates a new tree containing only the root folder `"/"`.
    pub fn new() -> Self {
        Tree {
            root: Node::new_empty(),
        }
    }

    /// Lists the immediate children of `path` as a comma-separated
    /// string of names (e.g. `"foo,bar,baz"`), or `""` if empty.
    pub fn list(&self, path: &str) -> Result<String, TreeError> {
        if !path::is_path_valid(path) {
            return Err(TreeError::Invalid);
        }

        let target = lock_descend(&self.root, path);
        let result = target.as_ref().map(|node| node.read().to_comma_list());
        unlock_descend(&self.root, path);

        match result {
            Some(listing) => {
                log::debug!("list {path} -> {listing:?}");
                Ok(listing)
            }
            None => Err(TreeError::NotFound),
        }
    }

    /// Creates an empty folder at `path` (e.g. for `path = "/foo/bar/"`,
    /// creates an empty `bar` inside existing folder `/foo/`).
    pub fn create(&self, path: &str) -> Result<(), TreeError> {
        if !path::is_path_valid(path) {
            return Err(TreeError::Invalid);
        }
        if path == "/" {
            return Err(TreeError::AlreadyExists);
        }
        let (parent_path, component) =
            path::split_parent(path).expect("validated non-root path has a parent");

        let parent = lock_descend(&self.root, &parent_path);
        let result = parent.as_ref().map(|parent| {
            parent
                .write()
                .insert(component.clone(), Node::new_empty())
        });
        unlock_descend(&self.root, &parent_path);

        match result {
            None => {
                log::debug!("create {path} -> no such folder");
                Err(TreeError::NotFound)
            }
            Some(Ok(())) => {
                log::debug!("create {path} -> ok");
                Ok(())
            }
            Some(Err(_discarded_candidate)) => {
                log::debug!("create {path} -> already exists");
                Err(TreeError::AlreadyExists)
            }
        }
    }

    /// Removes the (empty) folder at `path`.
    pub fn remove(&self, path: &str) -> Result<(), TreeError> {
        if !path::is_path_valid(path) {
            return Err(TreeError::Invalid);
        }
        if path == "/" {
            return Err(TreeError::Busy);
        }
        let (parent_path, component) =
            path::split_parent(path).expect("validated non-root path has a parent");

        let parent = lock_descend(&self.root, &parent_path);
        let result = parent.as_ref().map(|parent| {
            let mut children = parent.write();
            match children.get(&component) {
                None => Err(TreeError::NotFound),
                Some(child) => {
                    // SAFETY: `children` (parent's write lock) is held.
                    if unsafe { child.children_len_under_parent_write_lock() } > 0 {
                        Err(TreeError::NotEmpty)
                    } else {
                        children.remove(&component);
                        Ok(())
                    }
                }
            }
        });
        unlock_descend(&self.root, &parent_path);

        match result {
            None => {
                log::debug!("remove {path} -> no such folder");
                Err(TreeError::NotFound)
            }
            Some(inner) => {
                log::debug!("remove {path} -> {inner:?}");
                inner
            }
        }
    }

    /// Moves the folder (and its whole subtree) at `source` to `target`.
    ///
    /// Implemented with a single write lock taken on the least common
    /// ancestor of `source`'s and `target`'s parent directories, rather
    /// than two separate write locks on the two parents: acquiring two
    /// independent write locks would invite deadlock against the read
    /// locks other operations hold while descending through either
    /// parent. Locking only the LCA keeps the tree's "locks form a
    /// prefix of some root-to-node path" invariant intact.
    pub fn move_to(&self, source: &str, target: &str) -> Result<(), TreeError> {
        if !path::is_path_valid(source) || !path::is_path_valid(target) {
            return Err(TreeError::Invalid);
        }
        if source == "/" {
            return Err(TreeError::Busy);
        }
        if target == "/" {
            return Err(TreeError::AlreadyExists);
        }

        if path::starts_with_strict(target, source) {
            return Err(TreeError::InvalidMove);
        }
        if path::starts_with_strict(source, target) {
            let found = lock_descend(&self.root, source);
            unlock_descend(&self.root, source);
            return if found.is_some() {
                Err(TreeError::AlreadyExists)
            } else {
                Err(TreeError::NotFound)
            };
        }

        let (source_parent_path, source_component) =
            path::split_parent(source).expect("validated non-root source has a parent");
        let (target_parent_path, target_component) =
            path::split_parent(target).expect("validated non-root target has a parent");

        let lca_path = path::longest_common_ancestor(&source_parent_path, &target_parent_path);

        let lca = lock_descend(&self.root, &lca_path);
        let result = lca.as_ref().map(|lca| {
            let _lca_write = lca.write();

            let source_parent = weak_descend(&self.root, &source_parent_path);
            let target_parent = weak_descend(&self.root, &target_parent_path);

            match (source_parent, target_parent) {
                (Some(source_parent), Some(target_parent)) => {
                    move_between(&source_parent, &source_component, &target_parent, &target_component)
                }
                _ => Err(TreeError::NotFound),
            }
        });
        unlock_descend(&self.root, &lca_path);

        match result {
            None => {
                log::debug!("move {source} -> {target}: no such folder (lca)");
                Err(TreeError::NotFound)
            }
            Some(inner) => {
                log::debug!("move {source} -> {target}: {inner:?}");
                inner
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Performs the actual remove-then-insert under the LCA write lock,
/// reinstating the node at its source location if the target name is
/// already taken (the caller then observes the pre-move state, per the
/// partial-failure compensation rule).
///
/// A move where `source_parent` and `target_parent` are the same node
/// and the component names are equal falls out of this naturally: the
/// remove vacates the slot the insert then reoccupies, so it always
/// succeeds without needing to special-case "move onto self".
fn move_between(
    source_parent: &Node,
    source_component: &str,
    target_parent: &Node,
    target_component: &str,
) -> Result<(), TreeError> {
    let removed = {
        // SAFETY: the LCA write lock dominates `source_parent`.
        let source_map = unsafe { source_parent.children_mut_under_ancestor_write_lock() };
        source_map.remove(source_component)
    };
    let source_node = match removed {
        Some(node) => node,
        None => return Err(TreeError::NotFound),
    };

    let insert_result = {
        // SAFETY: the LCA write lock dominates `target_parent`.
        let target_map = unsafe { target_parent.children_mut_under_ancestor_write_lock() };
        target_map.insert(target_component.to_string(), source_node)
    };

    match insert_result {
        Ok(()) => Ok(()),
        Err(source_node) => {
            // SAFETY: the LCA write lock dominates `source_parent`.
            let source_map = unsafe { source_parent.children_mut_under_ancestor_write_lock() };
            source_map
                .insert(source_component.to_string(), source_node)
                .expect("source slot was just vacated under the LCA write lock");
            Err(TreeError::AlreadyExists)
        }
    }
}

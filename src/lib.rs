//! A concurrent in-memory folder namespace.
//!
//! Folders are addressed by canonical UNIX-style paths (`"/"`, `"/a/"`,
//! `"/a/b/"`, ...). Many threads may list, create, remove, and move
//! folders at the same time; each [`Tree`] operation takes only the
//! locks its own path touches, using a starvation-avoiding
//! reader/writer lock on every folder rather than one lock for the
//! whole tree.
//!
//! ```
//! use foldertree::Tree;
//!
//! let tree = Tree::new();
//! tree.create("/a/").unwrap();
//! tree.create("/a/b/").unwrap();
//! assert_eq!(tree.list("/a/").unwrap(), "b");
//! tree.move_to("/a/b/", "/b/").unwrap();
//! assert_eq!(tree.list("/").unwrap(), "a,b");
//! ```

mod childmap;
pub mod error;
pub mod path;
mod rwlock;
mod tree;

pub use error::TreeError;
pub use path::{is_path_valid, MAX_FOLDER_NAME_LENGTH, MAX_PATH_LENGTH};
pub use tree::Tree;

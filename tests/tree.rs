use foldertree::{Tree, TreeError};

#[test]
fn s1_fresh_tree_create_and_list() {
    let tree = Tree::new();
    assert_eq!(tree.list("/").unwrap(), "");
    assert_eq!(tree.create("/a/"), Ok(()));
    assert_eq!(tree.list("/").unwrap(), "a");
    assert_eq!(tree.create("/a/b/"), Ok(()));
    assert_eq!(tree.list("/a/").unwrap(), "b");
}

#[test]
fn s2_create_remove_error_codes() {
    let tree = Tree::new();
    assert_eq!(tree.create("/a/"), Ok(()));
    assert_eq!(tree.create("/a/").unwrap_err().code(), foldertree::error::EEXIST);
    assert_eq!(tree.remove("/a/"), Ok(()));
    assert_eq!(tree.remove("/a/").unwrap_err().code(), foldertree::error::ENOENT);
    assert_eq!(tree.remove("/").unwrap_err().code(), foldertree::error::EBUSY);
}

#[test]
fn s3_remove_refuses_non_empty_folder() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();
    assert_eq!(tree.remove("/a/"), Err(TreeError::NotEmpty));
    assert_eq!(tree.remove("/a/b/"), Ok(()));
    assert_eq!(tree.remove("/a/"), Ok(()));
}

#[test]
fn s4_move_between_disjoint_parents() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/b/").unwrap();
    tree.create("/a/x/").unwrap();
    assert_eq!(tree.move_to("/a/x/", "/b/x/"), Ok(()));
    assert_eq!(tree.list("/a/").unwrap(), "");
    assert_eq!(tree.list("/b/").unwrap(), "x");
}

#[test]
fn s5_move_into_own_subtree_is_invalid() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/a/b/").unwrap();
    assert_eq!(
        tree.move_to("/a/", "/a/b/c/").unwrap_err().code(),
        foldertree::error::EINVMV
    );
}

#[test]
fn s6_move_collision_then_success() {
    let tree = Tree::new();
    tree.create("/a/").unwrap();
    tree.create("/b/").unwrap();
    assert_eq!(tree.move_to("/a/", "/b/"), Err(TreeError::AlreadyExists));
    assert_eq!(tree.move_to("/a/", "/c/"), Ok(()));

    let listing = tree.list("/").unwrap();
    let mut names: Vec<&str> = listing.split(',').collect();
    names.sort_unstable();
    assert_eq!(names, vec!["b", "c"]);
}

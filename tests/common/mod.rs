//! Shared schema and session fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use stagetree::domain::{ConfigTree, PathValidator, ReferenceTree, ReferenceTreeBuilder, TypeRegistry};
use stagetree::util::testing::init_test_setup;
use stagetree::{Session, SessionOptions};

pub const USER: &str = "vyconfadmin";

/// Schema used across the session tests:
///
/// ```text
/// foo
/// ├── bar
/// │   └── baz [tag]
/// │       └── eggs [leaf]
/// └── quux
///     ├── spam [multi]
///     ├── eggs [leaf]
///     ├── mtu [leaf, integer:68-9000]
///     └── speed [leaf, integer:10-10000, choice:auto]
/// ```
pub fn reference_tree() -> ReferenceTree {
    ReferenceTreeBuilder::new()
        .node(&["foo", "bar"])
        .tag(&["foo", "bar", "baz"])
        .leaf(&["foo", "bar", "baz", "eggs"])
        .multi(&["foo", "quux", "spam"])
        .leaf(&["foo", "quux", "eggs"])
        .leaf(&["foo", "quux", "mtu"])
        .constraint(&["foo", "quux", "mtu"], "integer", Some("68-9000"))
        .leaf(&["foo", "quux", "speed"])
        .constraint(&["foo", "quux", "speed"], "integer", Some("10-10000"))
        .constraint(&["foo", "quux", "speed"], "choice", Some("auto"))
        .build()
        .expect("test schema builds")
}

pub fn validator() -> Arc<PathValidator> {
    let validator = PathValidator::new(Arc::new(reference_tree()), TypeRegistry::with_builtins())
        .expect("test schema validates");
    Arc::new(validator)
}

/// Config that existed before the session: `foo quux spam fgsfds` and `foo bar`.
pub fn canonical_tree() -> ConfigTree {
    let mut tree = ConfigTree::new();
    let spam = tree
        .insert_path(&["foo", "quux", "spam"])
        .expect("insert spam");
    tree.add_value(spam, "fgsfds").expect("add value");
    tree.insert_path(&["foo", "bar"]).expect("insert bar");
    tree
}

/// Session in edit mode over `tree`.
pub fn editing_session(tree: ConfigTree, options: SessionOptions) -> Session {
    init_test_setup();
    let mut session = Session::new(tree, validator(), USER).with_options(options);
    session.configure().expect("configure");
    session
}

/// Session in edit mode over an empty tree with default options.
pub fn make_session() -> Session {
    editing_session(ConfigTree::new(), SessionOptions::default())
}

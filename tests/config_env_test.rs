//! Environment overrides live in their own test binary: the variables are
//! process-wide.

use std::env;
use std::fs;

use tempfile::TempDir;

use stagetree::config::Settings;

#[test]
fn given_env_vars_when_load_then_env_wins_over_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stagetree.toml");
    fs::write(&path, "user = \"from-file\"\nlog_level = \"info\"\n").unwrap();

    env::set_var("STAGETREE_USER", "from-env");
    env::set_var("STAGETREE_SESSION__PRUNE_EMPTY_PARENTS", "true");

    let settings = Settings::load(Some(&path)).expect("load settings");

    env::remove_var("STAGETREE_USER");
    env::remove_var("STAGETREE_SESSION__PRUNE_EMPTY_PARENTS");

    assert_eq!(settings.user, "from-env");
    assert_eq!(settings.log_level, "info");
    assert!(settings.session.prune_empty_parents);
}

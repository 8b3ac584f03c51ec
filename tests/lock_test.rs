//! Integration tests for cross-session exclusion through the service container.

mod common;

use std::sync::Arc;

use stagetree::application::{ErrorKind, SessionError, SessionState};
use stagetree::config::{SessionSettings, Settings};
use stagetree::domain::ConfigTree;
use stagetree::infrastructure::{InProcessEditLock, LockError, NoopEditLock, ServiceContainer};
use stagetree::util::testing::init_test_setup;

use common::{canonical_tree, validator};

fn settings(prune: bool) -> Settings {
    Settings {
        user: "alice".into(),
        log_level: "debug".into(),
        session: SessionSettings {
            prune_empty_parents: prune,
        },
    }
}

fn container() -> ServiceContainer {
    init_test_setup();
    ServiceContainer::with_deps(
        settings(false),
        validator(),
        Arc::new(InProcessEditLock::default()),
    )
}

#[test]
fn given_editing_session_when_second_session_configures_then_locked() {
    let services = container();
    let mut first = services.open_session(canonical_tree(), None);
    let mut second = services.open_session(canonical_tree(), Some("bob"));

    first.configure().unwrap();
    let err = second.configure().unwrap_err();

    assert_eq!(
        err,
        SessionError::Lock(LockError::Held {
            holder: "alice".into()
        })
    );
    assert_eq!(err.kind(), ErrorKind::Locked);
    assert_eq!(second.state(), SessionState::New);
}

#[test]
fn given_locked_session_when_closed_then_other_session_can_configure() {
    let services = container();
    let mut first = services.open_session(ConfigTree::new(), None);
    let mut second = services.open_session(ConfigTree::new(), Some("bob"));

    first.configure().unwrap();
    first.close();

    second.configure().unwrap();
    assert_eq!(services.lock.holder().as_deref(), Some("bob"));
}

#[test]
fn given_locked_session_when_dropped_then_lock_released() {
    let services = container();
    {
        let mut first = services.open_session(ConfigTree::new(), None);
        first.configure().unwrap();
        assert_eq!(services.lock.holder().as_deref(), Some("alice"));
    }
    assert_eq!(services.lock.holder(), None);

    let mut second = services.open_session(ConfigTree::new(), Some("bob"));
    assert!(second.configure().is_ok());
}

#[test]
fn given_session_handed_off_when_into_tree_then_lock_released() {
    let services = container();
    let mut session = services.open_session(canonical_tree(), None);
    session.configure().unwrap();
    session.set(&["foo", "quux", "spam", "vbnm"]).unwrap();

    let tree = session.into_tree();

    assert_eq!(services.lock.holder(), None);
    assert_eq!(tree.changes().len(), 3);
}

#[test]
fn given_noop_lock_when_two_sessions_configure_then_both_edit() {
    let services = ServiceContainer::with_deps(settings(false), validator(), Arc::new(NoopEditLock));
    let mut first = services.open_session(ConfigTree::new(), None);
    let mut second = services.open_session(ConfigTree::new(), None);

    assert!(first.configure().is_ok());
    assert!(second.configure().is_ok());
}

#[test]
fn given_settings_when_opening_session_then_user_and_options_applied() {
    let services = ServiceContainer::with_deps(settings(true), validator(), Arc::new(NoopEditLock));

    let session = services.open_session(ConfigTree::new(), None);

    assert_eq!(session.user(), "alice");
    assert!(session.options().prune_empty_parents);
}

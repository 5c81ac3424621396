//! Tests for command dispatch
//!
//! These tests verify:
//! - The full-session scenario end to end
//! - Precondition pipelines (login, selection, root)
//! - Existence masking for unauthorized access
//! - TTL argument handling at the handler layer
//! - Parse failures and parameter validation
//! - WAL append on successful mutations

use std::fs;

use tempfile::TempDir;
use wardenkv::{Config, Router, Session};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_router() -> (TempDir, Router) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .root_user("root")
        .root_password("rootpass")
        .pbkdf2_iterations(10)
        .build();
    let router = Router::open(&config).unwrap();
    (temp_dir, router)
}

fn send(router: &mut Router, session: &mut Session, line: &str) -> String {
    router.dispatch(session, line).unwrap()
}

fn login_root(router: &mut Router, session: &mut Session) {
    assert_eq!(send(router, session, "login root rootpass"), "login: ok");
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_full_session_scenario() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    assert_eq!(send(&mut router, &mut session, "login root rootpass"), "login: ok");
    assert_eq!(send(&mut router, &mut session, "create_db mydb"), "create_db: ok");
    assert_eq!(send(&mut router, &mut session, "select_db mydb"), "select_db: ok");
    assert_eq!(send(&mut router, &mut session, "put x 1"), "put: ok");
    assert_eq!(send(&mut router, &mut session, "get x"), "1");
    assert_eq!(send(&mut router, &mut session, "delete x"), "delete: ok");
    assert_eq!(send(&mut router, &mut session, "get x"), "invalid key");
}

#[test]
fn test_unauthorized_access_is_masked() {
    let (_dir, mut router) = setup_temp_router();
    let mut root = Session::new();
    login_root(&mut router, &mut root);
    send(&mut router, &mut root, "create_db mydb");

    let mut alice = Session::new();
    assert_eq!(
        send(&mut router, &mut alice, "register_user alice pw"),
        "create_user: ok"
    );
    assert_eq!(send(&mut router, &mut alice, "login alice pw"), "login: ok");

    // not "unauthorized": existence is masked
    assert_eq!(
        send(&mut router, &mut alice, "select_db mydb"),
        "database does not exist"
    );
}

#[test]
fn test_malformed_ttl_leaves_store_untouched() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    assert_eq!(
        send(&mut router, &mut session, "put k v notanumber"),
        "invalid ttl: should be integer"
    );
    assert_eq!(send(&mut router, &mut session, "get k"), "invalid key");

    // negative values are not well-formed either
    assert_eq!(
        send(&mut router, &mut session, "put k v -1"),
        "invalid ttl: should be integer"
    );
}

// =============================================================================
// Preconditions
// =============================================================================

#[test]
fn test_commands_require_login() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    for line in ["whoami", "create_db x", "select_db x", "list_dbs", "get k"] {
        assert_eq!(
            send(&mut router, &mut session, line),
            "you must be logged in",
            "line: {line}"
        );
    }
}

#[test]
fn test_data_commands_require_selection() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);

    for line in ["current_db", "get k", "put k v", "update k v", "delete k", "list_users"] {
        assert_eq!(
            send(&mut router, &mut session, line),
            "no database selected",
            "line: {line}"
        );
    }
}

#[test]
fn test_whoami_and_current_db_echo() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);

    assert_eq!(send(&mut router, &mut session, "whoami"), "root");
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");
    assert_eq!(send(&mut router, &mut session, "current_db"), "mydb");
}

#[test]
fn test_login_resets_selection() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    login_root(&mut router, &mut session);
    assert_eq!(
        send(&mut router, &mut session, "current_db"),
        "no database selected"
    );
}

#[test]
fn test_bad_login() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    assert_eq!(
        send(&mut router, &mut session, "login root wrongpass"),
        "invalid credentials"
    );
    assert_eq!(
        send(&mut router, &mut session, "login ghost pw"),
        "invalid credentials"
    );
    assert_eq!(send(&mut router, &mut session, "login root"), "invalid number of parameters");
    assert!(!session.is_logged_in());
}

#[test]
fn test_privileged_commands_require_root() {
    let (_dir, mut router) = setup_temp_router();
    let mut root = Session::new();
    login_root(&mut router, &mut root);
    send(&mut router, &mut root, "create_db shared");

    let mut alice = Session::new();
    send(&mut router, &mut alice, "register_user alice pw");
    send(&mut router, &mut alice, "login alice pw");

    assert_eq!(
        send(&mut router, &mut alice, "add_user_to_owners alice shared"),
        "unauthorized: only root may do this"
    );
    assert_eq!(
        send(&mut router, &mut alice, "delete_user alice"),
        "unauthorized: only root may do this"
    );

    // root can grant, after which alice can select
    assert_eq!(
        send(&mut router, &mut root, "add_user_to_owners alice shared"),
        "add_user_to_owners: ok"
    );
    assert_eq!(send(&mut router, &mut alice, "select_db shared"), "select_db: ok");
}

#[test]
fn test_root_cannot_be_deleted() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);

    assert_eq!(
        send(&mut router, &mut session, "delete_user root"),
        "cannot delete the root user"
    );
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_unknown_and_empty_commands() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    assert_eq!(send(&mut router, &mut session, "frobnicate"), "invalid command");
    assert_eq!(send(&mut router, &mut session, ""), "invalid command");
    assert_eq!(send(&mut router, &mut session, "   "), "invalid command");
}

#[test]
fn test_too_many_params_rejected() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    assert_eq!(
        send(&mut router, &mut session, "login a b c d e"),
        "invalid command"
    );
}

#[test]
fn test_wrong_param_counts() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    assert_eq!(
        send(&mut router, &mut session, "put onlykey"),
        "invalid number of parameters"
    );
    assert_eq!(
        send(&mut router, &mut session, "create_db"),
        "invalid number of parameters"
    );
    assert_eq!(
        send(&mut router, &mut session, "get a b"),
        "invalid number of parameters"
    );
}

// =============================================================================
// Users, Listings, TTL policy
// =============================================================================

#[test]
fn test_register_and_duplicate_user() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();

    assert_eq!(
        send(&mut router, &mut session, "register_user alice pw"),
        "create_user: ok"
    );
    assert_eq!(
        send(&mut router, &mut session, "register_user alice other"),
        "username already taken"
    );
}

#[test]
fn test_listings() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    assert_eq!(send(&mut router, &mut session, "list_users"), r#"["root"]"#);
    assert_eq!(send(&mut router, &mut session, "list_dbs"), r#"["mydb"]"#);
}

#[test]
fn test_update_vs_put_over_the_wire() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    assert_eq!(send(&mut router, &mut session, "update x 1"), "invalid key");
    assert_eq!(send(&mut router, &mut session, "put x 1"), "put: ok");
    assert_eq!(send(&mut router, &mut session, "update x 2"), "update: ok");
    assert_eq!(send(&mut router, &mut session, "get x"), "2");
}

#[test]
fn test_put_without_ttl_clears_prior_ttl() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");

    assert_eq!(send(&mut router, &mut session, "put k v 3600"), "put: ok");
    assert!(router
        .store()
        .get_database("root", "mydb")
        .unwrap()
        .expires_at("k")
        .is_some());

    assert_eq!(send(&mut router, &mut session, "put k v2"), "put: ok");
    assert!(router
        .store()
        .get_database("root", "mydb")
        .unwrap()
        .expires_at("k")
        .is_none());
}

#[test]
fn test_deleting_selected_db_masks_later_reads() {
    let (_dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");
    assert_eq!(send(&mut router, &mut session, "delete_db mydb"), "delete_db: ok");

    assert_eq!(
        send(&mut router, &mut session, "get k"),
        "database does not exist"
    );
}

// =============================================================================
// WAL Append
// =============================================================================

#[test]
fn test_successful_mutations_are_logged() {
    let (dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");
    send(&mut router, &mut session, "put x 1 60");
    send(&mut router, &mut session, "delete x");

    let log = fs::read_to_string(dir.path().join("commands.log")).unwrap();
    let commands: Vec<&str> = log
        .lines()
        .map(|line| line.split_once('\t').unwrap().1)
        .collect();
    assert_eq!(commands, vec!["create_db mydb", "put mydb x 1 60", "delete mydb x"]);
}

#[test]
fn test_failed_and_readonly_commands_are_not_logged() {
    let (dir, mut router) = setup_temp_router();
    let mut session = Session::new();
    login_root(&mut router, &mut session);
    send(&mut router, &mut session, "create_db mydb");
    send(&mut router, &mut session, "select_db mydb");
    send(&mut router, &mut session, "get missing");
    send(&mut router, &mut session, "update missing v");
    send(&mut router, &mut session, "put k v notanumber");
    send(&mut router, &mut session, "whoami");

    let log = fs::read_to_string(dir.path().join("commands.log")).unwrap();
    assert_eq!(log.lines().count(), 1); // only create_db
}

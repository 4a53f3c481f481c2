//! Session lifecycle against the real file-backed token store.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

use patent_cli::auth::{FileTokenStore, Session, TokenStore};
use patent_cli::models::Role;

fn token_for(name: &str, email: &str, role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "id": "u1",
            "name": name,
            "email": email,
            "role": role,
        }))
        .unwrap(),
    );
    format!("{header}.{payload}.sig")
}

#[test]
fn session_survives_restart_through_the_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    let token = token_for("Ana", "ana@example.com", "admin");

    {
        let mut session = Session::restore(Box::new(FileTokenStore::new(path.clone())));
        assert!(!session.is_authenticated());
        session.login(&token).unwrap();
    }

    // A fresh process start: restore from the same slot.
    let session = Session::restore(Box::new(FileTokenStore::new(path)));
    assert!(session.is_authenticated());
    let user = session.user().unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(session.token(), Some(token.as_str()));
}

#[test]
fn logout_removes_the_slot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    let store = FileTokenStore::new(path.clone());
    store.save(&token_for("Ana", "a@x", "user")).unwrap();

    let mut session = Session::restore(Box::new(FileTokenStore::new(path.clone())));
    assert!(session.is_authenticated());
    session.logout();

    assert!(!path.exists());
    assert!(!session.is_authenticated());

    // Next restore stays anonymous.
    let session = Session::restore(Box::new(FileTokenStore::new(path)));
    assert!(!session.is_authenticated());
}

#[test]
fn corrupt_slot_fails_soft_and_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    std::fs::write(&path, "definitely not a jwt").unwrap();

    let session = Session::restore(Box::new(FileTokenStore::new(path.clone())));
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert!(!path.exists());
}

#[test]
fn failed_login_keeps_the_previous_token_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    let good = token_for("Ana", "a@x", "user");

    let mut session = Session::restore(Box::new(FileTokenStore::new(path.clone())));
    session.login(&good).unwrap();

    assert!(session.login("broken").is_err());
    assert_eq!(session.token(), Some(good.as_str()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), good);
}

use keepsake_session::{
    CipherMode, SessionConfig, SessionError, SessionState, load_config, load_config_with_env,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppConfig {
    session: SessionConfig,
}

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_loads_session_section_from_toml() {
    let file = toml_file(
        r#"
        [session]
        namespace = "shop"
        encryption_key = "s3cret"
        bind_user_agent = true
        cipher = "authenticated"
        lifetime_minutes = 90
        save_path = "/var/lib/keepsake"
        "#,
    );

    let cfg: AppConfig = load_config(file.path()).unwrap();

    assert_eq!(cfg.session.namespace, "shop");
    assert_eq!(cfg.session.encryption_key.as_deref(), Some("s3cret"));
    assert!(cfg.session.bind_user_agent);
    assert_eq!(cfg.session.cipher, CipherMode::Authenticated);
    assert_eq!(cfg.session.lifetime_minutes, 90);
    assert_eq!(cfg.session.save_path, Some(PathBuf::from("/var/lib/keepsake")));
    assert!(cfg.session.validate().is_ok());
}

#[test]
fn test_missing_keys_fall_back_to_defaults() {
    let file = toml_file("[session]\nencryption_key = \"k\"\n");

    let cfg: AppConfig = load_config(file.path()).unwrap();

    assert_eq!(cfg.session.namespace, "app");
    assert_eq!(cfg.session.lifetime_minutes, 24);
    assert_eq!(cfg.session.cipher, CipherMode::Cbc);
}

#[test]
fn test_environment_overrides_file() {
    let file = toml_file("[session]\nnamespace = \"from-file\"\nlifetime_minutes = 10\n");

    let cfg: AppConfig = load_config_with_env(
        file.path(),
        [
            ("KEEPSAKE__SESSION__NAMESPACE", "from-env"),
            ("KEEPSAKE__SESSION__CIPHER", "authenticated"),
            ("UNRELATED__SESSION__NAMESPACE", "ignored"),
        ],
    )
    .unwrap();

    assert_eq!(cfg.session.namespace, "from-env");
    assert_eq!(cfg.session.cipher, CipherMode::Authenticated);
    assert_eq!(cfg.session.lifetime_minutes, 10);
}

#[test]
fn test_configured_namespace_selects_subtree() {
    let file = toml_file("[session]\nnamespace = \"cart\"\n");
    let cfg: AppConfig = load_config_with_env(file.path(), std::iter::empty::<(String, String)>())
        .unwrap();

    let state = SessionState::from_payload(
        json!({ "app": { "items": 0 }, "cart": { "items": 2 } }).as_object().unwrap().clone(),
    );

    assert_eq!(cfg.session.accessor(&state).get("items"), Some(json!(2)));
}

#[test]
fn test_missing_file_is_config_error() {
    let err = load_config::<AppConfig>("/definitely/not/here/keepsake.toml").unwrap_err();

    assert!(matches!(err, SessionError::Config { .. }));
}

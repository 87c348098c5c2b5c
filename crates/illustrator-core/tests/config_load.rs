use illustrator_core::config::{load_config_with_precedence, load_layers};
use illustrator_core::model::{AspectRatio, Resolution, DEFAULT_MODEL};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_no_files_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_layers(
        Some(&temp_dir.path().join("missing-user.toml")),
        &temp_dir.path().join("missing-project.toml"),
    )
    .unwrap();

    assert_eq!(config.paths.styles_dir, "styles");
    assert_eq!(config.render.model, DEFAULT_MODEL);
    assert_eq!(config.render.aspect_ratio, AspectRatio::Wide);
    assert_eq!(config.render.resolution, Resolution::TwoK);
    assert!(config.defaults.level.is_none());
}

#[test]
fn test_project_overrides_user_per_field() {
    let temp_dir = TempDir::new().unwrap();
    let user = temp_dir.path().join("user.toml");
    let project = temp_dir.path().join("illustrator.toml");

    fs::write(
        &user,
        r#"
[defaults]
style = "ticket"

[render]
resolution = "4K"
apiKey = "user-key"
"#,
    )
    .unwrap();
    fs::write(
        &project,
        r#"
[paths]
stylesDir = "design/styles"

[defaults]
level = "h3"

[render]
aspectRatio = "3:4"
maxBodyChars = 400
"#,
    )
    .unwrap();

    let config = load_layers(Some(&user), &project).unwrap();

    assert_eq!(config.paths.styles_dir, "design/styles");
    assert_eq!(config.defaults.level.as_deref(), Some("h3"));
    assert_eq!(config.defaults.style.as_deref(), Some("ticket"));
    assert_eq!(config.render.resolution, Resolution::FourK);
    assert_eq!(config.render.aspect_ratio, AspectRatio::Portrait);
    assert_eq!(config.render.max_body_chars, 400);
    assert_eq!(config.render.api_key.as_deref(), Some("user-key"));
}

#[test]
fn test_broken_user_config_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let user = temp_dir.path().join("user.toml");
    let project = temp_dir.path().join("illustrator.toml");
    fs::write(&user, "[render\nmodel = ").unwrap();
    fs::write(&project, "[render]\nmodel = \"project-model\"\n").unwrap();

    let config = load_layers(Some(&user), &project).unwrap();
    assert_eq!(config.render.model, "project-model");
}

#[test]
fn test_broken_project_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("illustrator.toml");
    fs::write(&project, "[render]\naspectRatio = \"21:9\"\n").unwrap();

    let err = load_layers(None, &project).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
}

#[test]
fn test_zero_body_limit_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("illustrator.toml");
    fs::write(&project, "[render]\nmaxBodyChars = 0\n").unwrap();

    let err = load_layers(None, &project).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config"));
}

#[test]
fn test_unknown_keys_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("illustrator.toml");
    fs::write(&project, "[render]\nseed = 42\n").unwrap();

    assert!(load_layers(None, &project).is_err());
}

#[test]
#[serial]
fn test_precedence_reads_project_file_from_cwd() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("illustrator.toml"),
        "[defaults]\nlevel = \"h4\"\n\n[render]\naspectRatio = \"3:4\"\n",
    )
    .unwrap();

    let _guard = ChangeDir::new(temp_dir.path());
    let config = load_config_with_precedence().unwrap();

    assert_eq!(config.defaults.level.as_deref(), Some("h4"));
    assert_eq!(config.render.aspect_ratio, AspectRatio::Portrait);
}

/// Helper to change directory and restore on drop
struct ChangeDir {
    original: std::path::PathBuf,
}

impl ChangeDir {
    fn new(path: &std::path::Path) -> Self {
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(path).unwrap();
        Self { original }
    }
}

impl Drop for ChangeDir {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

use super::*;

#[test]
fn empty_object_yields_defaults() {
    let opts = SceneOpts::from_json_str("{}").unwrap();
    assert!(opts.script_root.is_none());
    assert_eq!(opts.viewport, (1280.0, 720.0));
    assert_eq!(opts.native.compiler, PathBuf::from("rustc"));
    assert!(opts.scripts.max_operations.is_none());
}

#[test]
fn partial_override_keeps_other_defaults() {
    let opts = SceneOpts::from_json_str(
        r#"{
            "script_root": "/srv/scripts",
            "scripts": { "max_operations": 5000 },
            "native": { "opt_level": "0", "prelude": { "source": "prelude/lib.rs", "crate_name": "scene_prelude" } }
        }"#,
    )
    .unwrap();
    assert_eq!(opts.script_root, Some(PathBuf::from("/srv/scripts")));
    assert_eq!(opts.scripts.max_operations, Some(5000));
    assert_eq!(opts.native.opt_level, "0");
    assert_eq!(opts.native.edition, "2021");
    assert_eq!(
        opts.native.prelude.as_ref().map(|p| p.crate_name.as_str()),
        Some("scene_prelude")
    );
}

#[test]
fn invalid_viewport_is_rejected() {
    let err = SceneOpts::from_json_str(r#"{ "viewport": [0.0, 10.0] }"#).unwrap_err();
    assert!(matches!(err, SceneError::Validation(_)));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = SceneOpts::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, SceneError::Serde(_)));
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    std::fs::write(&path, r#"{ "viewport": [640.0, 480.0] }"#).unwrap();
    let opts = SceneOpts::from_path(&path).unwrap();
    assert_eq!(opts.viewport, (640.0, 480.0));
}

#[test]
fn host_crate_defaults_its_name_and_search_dir() {
    let opts = SceneOpts::from_json_str(
        r#"{ "native": { "host": { "rlib": "target/debug/deps/libmobscene-abc.rlib" } } }"#,
    )
    .unwrap();
    let host = opts.native.host.unwrap();
    assert_eq!(host.crate_name, "mobscene");
    assert_eq!(
        host.dependency_dirs(),
        vec![PathBuf::from("target/debug/deps")]
    );
    assert!(SceneOpts::default().native.host.is_none());
}

#[test]
fn empty_host_rlib_is_rejected() {
    let err = SceneOpts::from_json_str(r#"{ "native": { "host": { "rlib": "" } } }"#).unwrap_err();
    assert!(matches!(err, SceneError::Validation(_)));
}

#[test]
fn discover_picks_the_host_rlib() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("libkurbo-1.rlib"), "").unwrap();
    std::fs::write(dir.path().join("libmobscene-2.rmeta"), "").unwrap();
    std::fs::write(dir.path().join("libmobscene-2.rlib"), "").unwrap();
    let host = HostCrate::discover(dir.path()).unwrap();
    assert_eq!(host.rlib, dir.path().join("libmobscene-2.rlib"));
    assert!(HostCrate::discover(&dir.path().join("missing")).is_none());
}

use super::*;

#[cfg(unix)]
fn fake_compiler(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join("fake-rustc");
    let script = format!(
        r#"#!/bin/sh
echo "$@" >> "$0.log"
{body}
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
: > "$out"
"#
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn opts_in(dir: &Path, compiler: PathBuf) -> NativeOpts {
    NativeOpts {
        compiler,
        out_dir: dir.join("out"),
        ..NativeOpts::default()
    }
}

#[test]
fn crate_names_are_sanitized() {
    assert_eq!(crate_name("orbit-cam.v2"), "orbit_cam_v2");
    assert_eq!(crate_name("3d"), "_3d");
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = RustcBuilder::new(opts_in(dir.path(), PathBuf::from("rustc")));
    let err = builder.build(&dir.path().join("nope.rs")).unwrap_err();
    assert!(matches!(err, PluginError::Io { .. }));
}

#[test]
fn missing_compiler_is_a_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("spin.rs");
    std::fs::write(&source, "").unwrap();
    let mut builder = RustcBuilder::new(opts_in(
        dir.path(),
        dir.path().join("no-such-compiler"),
    ));
    let err = builder.build(&source).unwrap_err();
    assert!(matches!(err, PluginError::Spawn { .. }));
}

#[cfg(unix)]
#[test]
fn compiler_failure_carries_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "echo 'error: boom' >&2\nexit 1");
    let source = dir.path().join("spin.rs");
    std::fs::write(&source, "").unwrap();
    let mut builder = RustcBuilder::new(opts_in(dir.path(), compiler));
    match builder.build(&source) {
        Err(PluginError::Compile { stderr, .. }) => assert_eq!(stderr, "error: boom"),
        other => panic!("unexpected: {other:?}"),
    }
}

/// Fails a plugin build that names `scene_prelude` without linking it, like rustc's E0433.
/// The prelude build itself takes a moment.
#[cfg(unix)]
const PRELUDE_AWARE: &str = r#"for a; do last="$a"; done
case "$*" in
  *"--crate-type rlib"*) sleep 1 ;;
  *)
    if grep -q scene_prelude "$last" && ! echo "$*" | grep -q -- "--extern scene_prelude="; then
      echo "error[E0433]: cannot find module or crate scene_prelude" >&2
      exit 1
    fi
    ;;
esac"#;

#[cfg(unix)]
fn prelude_opts(dir: &Path, compiler: PathBuf) -> NativeOpts {
    let prelude = dir.join("prelude.rs");
    std::fs::write(&prelude, "pub fn hello() {}").unwrap();
    let mut opts = opts_in(dir, compiler);
    opts.prelude = Some(PreludeSpec {
        source: prelude,
        crate_name: "scene_prelude".to_string(),
    });
    opts
}

#[cfg(unix)]
fn cdylib_lines(compiler: &Path) -> Vec<String> {
    std::fs::read_to_string(compiler.with_extension("log"))
        .unwrap()
        .lines()
        .filter(|l| l.contains("--crate-type cdylib"))
        .map(str::to_string)
        .collect()
}

#[cfg(unix)]
#[test]
fn first_build_of_a_prelude_user_waits_for_the_prelude() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), PRELUDE_AWARE);
    let plugin = dir.path().join("orbit-cam.rs");
    std::fs::write(&plugin, "use scene_prelude::hello;").unwrap();
    let mut builder = RustcBuilder::new(prelude_opts(dir.path(), compiler.clone()));

    let first = builder.build(&plugin).unwrap();
    assert!(first.exists());
    assert!(
        first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("orbit_cam_1")
    );
    assert!(builder.prelude_ready());
    assert!(cdylib_lines(&compiler)[0].contains("--extern scene_prelude="));
}

#[cfg(unix)]
#[test]
fn stale_prelude_keeps_linking_the_last_good_build() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), PRELUDE_AWARE);
    let plugin = dir.path().join("orbit.rs");
    std::fs::write(&plugin, "use scene_prelude::hello;").unwrap();
    let opts = prelude_opts(dir.path(), compiler.clone());
    let prelude_source = opts.prelude.as_ref().unwrap().source.clone();
    let mut builder = RustcBuilder::new(opts);
    let first = builder.build(&plugin).unwrap();

    let later = SystemTime::now() + std::time::Duration::from_secs(60);
    std::fs::File::options()
        .write(true)
        .open(&prelude_source)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let second = builder.build(&plugin).unwrap();
    assert_ne!(first, second);
    assert!(!builder.prelude_ready());
    builder.wait_for_prelude();

    let log = std::fs::read_to_string(compiler.with_extension("log")).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains("--crate-type rlib")).count(), 2);
    let cdylib = cdylib_lines(&compiler);
    assert_eq!(cdylib.len(), 2);
    assert!(cdylib.iter().all(|l| l.contains("--extern scene_prelude=")));
}

#[cfg(unix)]
#[test]
fn failed_prelude_does_not_block_plugins_that_ignore_it() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(
        dir.path(),
        r#"case "$*" in *"--crate-type rlib"*) echo 'error: prelude broke' >&2; exit 1 ;; esac"#,
    );
    let plugin = dir.path().join("plain.rs");
    std::fs::write(&plugin, "").unwrap();
    let mut builder = RustcBuilder::new(prelude_opts(dir.path(), compiler.clone()));

    builder.build(&plugin).unwrap();
    builder.build(&plugin).unwrap();
    assert!(!builder.prelude_ready());
    assert!(cdylib_lines(&compiler).iter().all(|l| !l.contains("--extern")));
    let log = std::fs::read_to_string(compiler.with_extension("log")).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains("--crate-type rlib")).count(), 1);
}

#[cfg(unix)]
#[test]
fn host_crate_is_linked_into_plugins_and_prelude() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = fake_compiler(dir.path(), "");
    let plugin = dir.path().join("spin.rs");
    std::fs::write(&plugin, "").unwrap();
    let mut opts = prelude_opts(dir.path(), compiler.clone());
    opts.host = Some(HostCrate::new("/opt/host/deps/libmobscene-0123.rlib"));
    let mut builder = RustcBuilder::new(opts);
    builder.build(&plugin).unwrap();

    let log = std::fs::read_to_string(compiler.with_extension("log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    for line in log.lines() {
        assert!(line.contains("-L dependency=/opt/host/deps"), "{line}");
        assert!(line.contains("--extern mobscene=/opt/host/deps/libmobscene-0123.rlib"), "{line}");
    }
}

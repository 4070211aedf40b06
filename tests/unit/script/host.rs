use std::fs;

use super::*;
use crate::ecs::components::{NameComponent, TransformComponent};
use crate::scene::context::SceneContext;

fn host_in(dir: &Path) -> ScriptHost {
    ScriptHost::new(&SceneOpts {
        script_root: Some(dir.to_path_buf()),
        ..SceneOpts::default()
    })
}

fn scripted(ctx: &SharedContext, path: &str) -> Entity {
    let mut c = ctx.borrow_mut();
    let e = c.store.create();
    c.store.emplace(e, TransformComponent::at(0.0, 0.0));
    c.store.emplace(e, ScriptComponent::new(path));
    e
}

const MOVER: &str = r#"
    let speed = 2.0;

    fn on_start(id, scene) {
        this.ticks = 0;
        scene.set_name(id, "started");
    }

    fn on_update(id, scene, dt, time) {
        this.ticks += 1;
        let t = scene.get_transform(id);
        t.x += dt * 2.0;
        t.y = this.ticks.to_float();
        scene.set_transform(id, t);
    }

    fn on_destroy(id, scene) {
        scene.set_name(id, "destroyed");
    }
"#;

#[test]
fn environment_runs_start_then_update_with_per_entity_state() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mover.rhai"), MOVER).unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let a = scripted(&ctx, "mover.rhai");
    let b = scripted(&ctx, "mover.rhai");

    host.attach(a, &ctx).unwrap();
    assert!(host.is_attached(a));
    assert!(!host.has_environment(a));

    host.update(&ctx, 0.5, 0.5);
    host.update(&ctx, 0.5, 1.0);
    assert!(host.has_environment(a));
    assert!(host.has_environment(b));
    assert_eq!(host.script_path(a), Some(dir.path().join("mover.rhai").as_path()));

    let c = ctx.borrow();
    for e in [a, b] {
        let t = c.store.get::<TransformComponent>(e).unwrap();
        assert_eq!((t.x, t.y), (2.0, 2.0));
        assert_eq!(c.store.get::<NameComponent>(e).unwrap().0, "started");
    }
}

#[test]
fn detach_runs_destroy_and_removes_the_binding() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mover.rhai"), MOVER).unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let e = scripted(&ctx, "mover.rhai");
    host.update(&ctx, 0.1, 0.1);

    host.detach(e, &ctx);
    assert!(!host.is_attached(e));
    let c = ctx.borrow();
    assert!(!c.store.has::<ScriptComponent>(e));
    assert_eq!(c.store.get::<NameComponent>(e).unwrap().0, "destroyed");
}

#[test]
fn missing_and_directory_paths_fail_silently() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("folder")).unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let missing = scripted(&ctx, "nope.rhai");
    let folder = scripted(&ctx, "folder");

    for i in 0..3 {
        host.update(&ctx, 0.1, f64::from(i) * 0.1);
    }
    assert!(!host.has_environment(missing));
    assert!(!host.has_environment(folder));
    assert!(ctx.borrow().store.is_alive(missing));
    assert!(ctx.borrow().store.has::<ScriptComponent>(folder));
}

#[test]
fn syntax_and_runtime_errors_leave_other_entities_running() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.rhai"), "fn on_update(id, scene, dt, time) {").unwrap();
    fs::write(
        dir.path().join("throws.rhai"),
        r#"fn on_update(id, scene, dt, time) { throw "boom"; }"#,
    )
    .unwrap();
    fs::write(dir.path().join("mover.rhai"), MOVER).unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let broken = scripted(&ctx, "broken.rhai");
    let throws = scripted(&ctx, "throws.rhai");
    let mover = scripted(&ctx, "mover.rhai");

    for _ in 0..4 {
        host.update(&ctx, 0.25, 0.0);
    }
    assert!(!host.has_environment(broken));
    assert!(host.has_environment(throws));
    assert_eq!(
        ctx.borrow().store.get::<TransformComponent>(mover).unwrap().x,
        2.0
    );
}

#[test]
fn missing_update_function_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("idle.rhai"), "let unused = 1;").unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let e = scripted(&ctx, "idle.rhai");

    host.update(&ctx, 0.1, 0.1);
    host.update(&ctx, 0.1, 0.2);
    assert!(host.has_environment(e));
}

#[test]
fn top_level_sees_its_entity_constant() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("named.rhai"),
        r#"
            let owner = entity;
            fn on_start(id, scene) { scene.set_name(id, "id:" + id); }
        "#,
    )
    .unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let e = scripted(&ctx, "named.rhai");

    host.update(&ctx, 0.1, 0.1);
    let expected = format!("id:{}", entity_id(e));
    assert_eq!(ctx.borrow().store.get::<NameComponent>(e).unwrap().0, expected);
}

#[test]
fn changed_or_removed_bindings_are_torn_down() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mover.rhai"), MOVER).unwrap();
    fs::write(dir.path().join("idle.rhai"), "").unwrap();
    let ctx = SceneContext::default().shared();
    let mut host = host_in(dir.path());
    let e = scripted(&ctx, "mover.rhai");
    host.update(&ctx, 0.1, 0.1);

    ctx.borrow_mut().store.emplace(e, ScriptComponent::new("idle.rhai"));
    host.update(&ctx, 0.1, 0.2);
    assert_eq!(ctx.borrow().store.get::<NameComponent>(e).unwrap().0, "destroyed");
    assert_eq!(host.script_path(e), Some(dir.path().join("idle.rhai").as_path()));

    ctx.borrow_mut().store.remove::<ScriptComponent>(e);
    host.update(&ctx, 0.1, 0.3);
    assert!(!host.is_attached(e));
}

#[test]
fn attach_requires_a_script_component() {
    let ctx = SceneContext::default().shared();
    let mut host = ScriptHost::new(&SceneOpts::default());
    let e = ctx.borrow_mut().store.create();
    assert!(host.attach(e, &ctx).is_err());
    assert!(!host.is_attached(e));
}

#[test]
fn absolute_paths_ignore_the_script_root() {
    let host = host_in(Path::new("/scripts"));
    let abs = std::env::temp_dir().join("x.rhai");
    assert_eq!(host.resolve_path(&abs), abs);
    assert_eq!(
        host.resolve_path(Path::new("a/b.rhai")),
        Path::new("/scripts/a/b.rhai")
    );
}

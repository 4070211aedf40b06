use std::fs;

use super::*;
use crate::native::abi::Behavior;
use crate::native::registry::StaticRegistry;
use crate::scene::render::RecordingCanvas;

#[derive(Default)]
struct Spinner;

impl Behavior for Spinner {
    fn on_update(
        &mut self,
        entity: Entity,
        ctx: &mut SceneContext,
        dt: f64,
        _time: f64,
    ) {
        if let Some(t) = ctx.store.get_mut::<TransformComponent>(entity) {
            t.rotation += dt;
        }
    }

    fn on_draw(&mut self, _entity: Entity, _ctx: &mut SceneContext, canvas: &mut dyn Canvas) {
        canvas.draw_path(
            &ShapeKind::Circle.default_shape().to_path(),
            &Paint::from_material(&MaterialComponent::default()),
        );
    }
}

fn scene_in(dir: &std::path::Path) -> Scene {
    let mut registry = StaticRegistry::new();
    registry.register::<Spinner>("spinner");
    let opts = SceneOpts {
        script_root: Some(dir.to_path_buf()),
        ..SceneOpts::default()
    };
    Scene::with_native_host(opts, NativePluginHost::with_registry(registry)).unwrap()
}

#[test]
fn bindings_are_mutually_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);

    scene
        .attach_native(e, NativeScriptComponent::new("plugins/spinner.rs"))
        .unwrap();
    let err = scene
        .attach_script(e, ScriptComponent::new("a.rhai"))
        .unwrap_err();
    assert!(matches!(
        err,
        SceneError::BindingConflict {
            existing: "native",
            ..
        }
    ));

    scene.detach_native(e);
    scene.attach_script(e, ScriptComponent::new("a.rhai")).unwrap();
    assert!(matches!(
        scene.attach_native(e, NativeScriptComponent::new("plugins/spinner.rs")),
        Err(SceneError::BindingConflict {
            existing: "interpreted",
            ..
        })
    ));
}

#[test]
fn native_updates_run_before_interpreted_ones() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let spinner = scene.create_shape(ShapeKind::Rectangle, 0.0, 0.0);
    scene
        .attach_native(spinner, NativeScriptComponent::new("plugins/spinner.rs"))
        .unwrap();

    let target = crate::script::api::entity_id(spinner);
    fs::write(
        dir.path().join("observer.rhai"),
        format!(
            r#"
                fn on_update(id, scene, dt, time) {{
                    let t = scene.get_transform({target});
                    scene.set_name(id, "saw " + t.rotation);
                }}
            "#
        ),
    )
    .unwrap();
    let observer = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);
    scene
        .attach_script(observer, ScriptComponent::new("observer.rhai"))
        .unwrap();

    scene.update(0.5, 0.5);
    let ctx = scene.context();
    assert_eq!(
        ctx.borrow().store.get::<NameComponent>(observer).unwrap().0,
        "saw 0.5"
    );
    assert!(scene.is_running(spinner));
    assert!(scene.is_running(observer));
}

#[test]
fn draw_runs_background_first_and_respects_windows() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let circle = scene.create_shape(ShapeKind::Circle, 10.0, 10.0);
    let bg = scene.create_background(1280.0, 720.0).unwrap();
    let hidden = scene.create_shape(ShapeKind::Line, 0.0, 0.0);
    scene.context().borrow_mut().store.emplace(
        hidden,
        AnimationComponent {
            entry_time: 2.0,
            exit_time: 3.0,
        },
    );

    let mut canvas = RecordingCanvas::new();
    scene.draw(&mut canvas, 1.0);
    let calls = canvas.into_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].paint.color, Rgba8::BLACK);
    assert_eq!(calls[1].paint.color, Rgba8::WHITE);

    let mut canvas = RecordingCanvas::new();
    scene.draw(&mut canvas, 2.5);
    assert_eq!(canvas.calls().len(), 3);
    assert_eq!(canvas.depth(), 0);

    assert!(scene.destroy(bg));
    assert!(!scene.destroy(bg));
    assert_eq!(scene.entities(), vec![circle, hidden]);
}

#[test]
fn native_draw_hooks_follow_shapes() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Triangle, 0.0, 0.0);
    scene
        .attach_native(e, NativeScriptComponent::new("plugins/spinner.rs"))
        .unwrap();

    let mut canvas = RecordingCanvas::new();
    scene.draw(&mut canvas, 0.0);
    assert_eq!(canvas.calls().len(), 2);
}

#[test]
fn failed_native_attach_keeps_the_entity() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);
    assert!(
        scene
            .attach_native(e, NativeScriptComponent::new("plugins/unknown.rs"))
            .is_err()
    );
    assert!(scene.is_alive(e));
    assert!(!scene.is_running(e));
    let ctx = scene.context();
    assert!(!ctx.borrow().store.has::<NativeScriptComponent>(e));
    assert!(ctx.borrow().store.has::<ShapeComponent>(e));
}

#[test]
fn attach_to_dead_entity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);
    scene.destroy(e);
    assert!(matches!(
        scene.attach_script(e, ScriptComponent::new("a.rhai")),
        Err(SceneError::Validation(_))
    ));
}

#[test]
fn serialize_then_deserialize_restores_components() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("idle.rhai"), "").unwrap();
    let mut scene = scene_in(dir.path());
    scene.create_background(640.0, 480.0).unwrap();
    let e = scene.create_shape(ShapeKind::Polygon, 3.0, 4.0);
    scene.attach_script(e, ScriptComponent::new("idle.rhai")).unwrap();
    let doc = scene.serialize();
    assert!(doc.entities[0].background);
    assert_eq!(doc.entities[1].script, Some(ScriptComponent::new("idle.rhai")));

    let mut other = scene_in(dir.path());
    other.create_shape(ShapeKind::Line, 0.0, 0.0);
    let loaded = other.deserialize(&doc).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(other.entities(), loaded);
    assert_eq!(other.serialize(), doc);

    other.update(0.1, 0.1);
    assert!(other.is_running(loaded[1]));
}

#[test]
fn invalid_documents_leave_the_scene_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);
    let err = scene
        .load_json(
            r#"{"entities": [{
                "ScriptComponent": {"scriptPath": "a.rhai"},
                "CppScriptComponent": {"source_path": "b.rs"}
            }]}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SceneError::Validation(_)));
    assert_eq!(scene.entities(), vec![e]);
}

#[test]
fn clear_tears_down_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    let e = scene.create_shape(ShapeKind::Circle, 0.0, 0.0);
    scene
        .attach_native(e, NativeScriptComponent::new("plugins/spinner.rs"))
        .unwrap();
    scene.clear();
    assert!(scene.entities().is_empty());
    assert!(!scene.is_alive(e));
    assert!(!scene.is_running(e));
}

#[test]
fn non_finite_update_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = scene_in(dir.path());
    scene.update(f64::NAN, 1.0);
    assert_eq!(scene.context().borrow().clock.frame, 0);
    scene.update(0.1, 0.1);
    assert_eq!(scene.context().borrow().clock.frame, 1);
}

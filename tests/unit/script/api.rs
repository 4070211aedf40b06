use rhai::Scope;

use super::*;
use crate::foundation::core::Point;
use crate::scene::context::SceneContext;

fn setup() -> (SharedContext, Entity, Engine, Scope<'static>) {
    let ctx = SceneContext::default().shared();
    let e = {
        let mut c = ctx.borrow_mut();
        let e = c.store.create();
        c.store.emplace(e, TransformComponent::at(1.0, 2.0));
        c.store.emplace(e, MaterialComponent::default());
        e
    };
    let engine = build_engine(&ScriptOpts::default());
    let mut scope = Scope::new();
    scope.push("scene", ScriptScene::new(ctx.clone(), e));
    scope.push_constant("id", entity_id(e));
    (ctx, e, engine, scope)
}

#[test]
fn scripts_read_and_write_whitelisted_components() {
    let (ctx, e, engine, mut scope) = setup();
    engine
        .run_with_scope(
            &mut scope,
            r#"
                let t = scene.get_transform(id);
                t.x += 10.0;
                t.rotation = 0.5;
                scene.set_transform(id, t);
                scene.set_name(id, "hero");

                let m = scene.get_material(id);
                m.color = [300, 0, -5, 255];
                m.stroke_width = -2.0;
                scene.set_material(id, m);
            "#,
        )
        .unwrap_or_else(|e| panic!("{e}"));

    let c = ctx.borrow();
    let t = c.store.get::<TransformComponent>(e).unwrap();
    assert_eq!((t.x, t.rotation), (11.0, 0.5));
    assert_eq!(c.store.get::<NameComponent>(e).unwrap().0, "hero");
    let m = c.store.get::<MaterialComponent>(e).unwrap();
    assert_eq!(m.color, Rgba8::new(255, 0, 0, 255));
    assert_eq!(m.stroke_width, 0.0);
}

#[test]
fn dead_ids_read_as_unit_and_writes_are_dropped() {
    let (ctx, e, engine, mut scope) = setup();
    ctx.borrow_mut().store.destroy(e);
    let unit: bool = engine
        .eval_with_scope(
            &mut scope,
            r#"
                scene.set_name(id, "ghost");
                type_of(scene.get_transform(id)) == "()" && !scene.is_alive(id)
            "#,
        )
        .unwrap();
    assert!(unit);
    assert!(ctx.borrow().store.is_empty());
}

#[test]
fn view_control_and_identity_are_exposed() {
    let (ctx, _e, engine, mut scope) = setup();
    let ok: bool = engine
        .eval_with_scope(
            &mut scope,
            r#"
                scene.zoom(2.0);
                scene.pan(20.0, 0.0);
                let c = scene.view_center();
                scene.log("centered at " + c[0]);
                scene.entity == id && scene.has(id, "TransformComponent") && !scene.has(id, "Bogus")
            "#,
        )
        .unwrap();
    assert!(ok);
    assert_eq!(ctx.borrow().view.center(), Point::new(630.0, 360.0));

    engine.run_with_scope(&mut scope, "scene.reset_view();").unwrap();
    assert_eq!(ctx.borrow().view.zoom_level(), 1.0);
}

#[test]
fn operation_limit_stops_runaway_scripts() {
    let engine = build_engine(&ScriptOpts {
        max_operations: Some(1_000),
        max_call_levels: None,
    });
    assert!(engine.run("loop { }").is_err());
}

#[test]
fn color_arrays_must_have_four_ints() {
    assert_eq!(color_from_array(&vec![Dynamic::from(1_i64)]), None);
    assert_eq!(
        color_from_array(&vec![Dynamic::from(1.5_f64); 4]),
        None
    );
}

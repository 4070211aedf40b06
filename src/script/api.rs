//! What interpreted scripts can see: a `Scene` handle, a few whitelisted component types, view
//! control, and logging.
//!
//! Entities cross into scripts as integers (see [`entity_id`]). Every accessor tolerates dead or
//! foreign ids: getters return `()` and setters do nothing.

use rhai::{Array, Dynamic, Engine};

use crate::ecs::components::{
    AnimationComponent, MaterialComponent, NameComponent, NativeScriptComponent,
    SceneBackground, ScriptComponent, TransformComponent,
};
use crate::ecs::store::{Component, Entity};
use crate::foundation::config::ScriptOpts;
use crate::foundation::core::Rgba8;
use crate::scene::context::SharedContext;
use crate::scene::shapes::ShapeComponent;

/// Log target for everything scripts emit.
pub const SCRIPT_TARGET: &str = "mobscene::script";

/// Integer form of an entity handle used inside scripts.
pub fn entity_id(entity: Entity) -> i64 {
    entity.to_bits() as i64
}

fn entity_from_id(id: i64) -> Entity {
    Entity::from_bits(id as u64)
}

/// Script-side handle to the shared scene context, tagged with the entity that owns the script.
#[derive(Clone)]
pub struct ScriptScene {
    ctx: SharedContext,
    owner: Entity,
}

impl ScriptScene {
    pub fn new(ctx: SharedContext, owner: Entity) -> Self {
        Self { ctx, owner }
    }

    fn get<T: Component + Clone>(&self, id: i64) -> Dynamic {
        self.ctx
            .borrow()
            .store
            .get::<T>(entity_from_id(id))
            .cloned()
            .map_or(Dynamic::UNIT, Dynamic::from)
    }

    fn set<T: Component>(&self, id: i64, value: T) {
        self.ctx.borrow_mut().store.emplace(entity_from_id(id), value);
    }

    fn has(&self, id: i64, component: &str) -> bool {
        let entity = entity_from_id(id);
        let ctx = self.ctx.borrow();
        let store = &ctx.store;
        match component {
            "NameComponent" => store.has::<NameComponent>(entity),
            "TransformComponent" => store.has::<TransformComponent>(entity),
            "MaterialComponent" => store.has::<MaterialComponent>(entity),
            "AnimationComponent" => store.has::<AnimationComponent>(entity),
            "ScriptComponent" => store.has::<ScriptComponent>(entity),
            "CppScriptComponent" => store.has::<NativeScriptComponent>(entity),
            "SceneBackgroundComponent" => store.has::<SceneBackground>(entity),
            "ShapeComponent" => store.has::<ShapeComponent>(entity),
            _ => false,
        }
    }

    fn log(&self, message: &str) {
        tracing::info!(target: SCRIPT_TARGET, entity = ?self.owner, "{message}");
    }
}

/// Shared interpreter with the scene API registered and output routed to `tracing`.
pub fn build_engine(opts: &ScriptOpts) -> Engine {
    let mut engine = Engine::new();
    if let Some(ops) = opts.max_operations {
        engine.set_max_operations(ops);
    }
    if let Some(levels) = opts.max_call_levels {
        engine.set_max_call_levels(levels);
    }
    engine.on_print(|text| tracing::info!(target: SCRIPT_TARGET, "{text}"));
    engine.on_debug(|text, source, pos| {
        tracing::debug!(target: SCRIPT_TARGET, source = source.unwrap_or("<script>"), %pos, "{text}");
    });
    register_api(&mut engine);
    engine
}

fn register_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptScene>("Scene")
        .register_get("entity", |s: &mut ScriptScene| entity_id(s.owner))
        .register_get("time", |s: &mut ScriptScene| s.ctx.borrow().clock.time)
        .register_get("frame", |s: &mut ScriptScene| s.ctx.borrow().clock.frame as i64)
        .register_fn("is_alive", |s: &mut ScriptScene, id: i64| {
            s.ctx.borrow().store.is_alive(entity_from_id(id))
        })
        .register_fn("has", |s: &mut ScriptScene, id: i64, component: &str| {
            s.has(id, component)
        })
        .register_fn("log", |s: &mut ScriptScene, message: &str| s.log(message))
        .register_fn("get_name", |s: &mut ScriptScene, id: i64| {
            s.ctx
                .borrow()
                .store
                .get::<NameComponent>(entity_from_id(id))
                .map_or(Dynamic::UNIT, |n| Dynamic::from(n.0.clone()))
        })
        .register_fn("set_name", |s: &mut ScriptScene, id: i64, name: &str| {
            s.set(id, NameComponent(name.to_string()))
        })
        .register_fn("get_transform", |s: &mut ScriptScene, id: i64| {
            s.get::<TransformComponent>(id)
        })
        .register_fn(
            "set_transform",
            |s: &mut ScriptScene, id: i64, t: TransformComponent| s.set(id, t),
        )
        .register_fn("get_material", |s: &mut ScriptScene, id: i64| {
            s.get::<MaterialComponent>(id)
        })
        .register_fn(
            "set_material",
            |s: &mut ScriptScene, id: i64, m: MaterialComponent| s.set(id, m),
        )
        .register_fn("get_window", |s: &mut ScriptScene, id: i64| {
            s.get::<AnimationComponent>(id)
        })
        .register_fn(
            "set_window",
            |s: &mut ScriptScene, id: i64, w: AnimationComponent| s.set(id, w),
        )
        .register_fn("pan", |s: &mut ScriptScene, dx: f64, dy: f64| {
            s.ctx.borrow_mut().view.pan(dx, dy)
        })
        .register_fn("zoom", |s: &mut ScriptScene, factor: f64| {
            s.ctx.borrow_mut().view.zoom(factor)
        })
        .register_fn("reset_view", |s: &mut ScriptScene| {
            s.ctx.borrow_mut().view.reset()
        })
        .register_fn("view_center", |s: &mut ScriptScene| -> Array {
            let c = s.ctx.borrow().view.center();
            vec![Dynamic::from(c.x), Dynamic::from(c.y)]
        });

    engine
        .register_type_with_name::<TransformComponent>("Transform")
        .register_fn("transform", TransformComponent::at)
        .register_get_set(
            "x",
            |t: &mut TransformComponent| t.x,
            |t: &mut TransformComponent, v: f64| t.x = v,
        )
        .register_get_set(
            "y",
            |t: &mut TransformComponent| t.y,
            |t: &mut TransformComponent, v: f64| t.y = v,
        )
        .register_get_set(
            "rotation",
            |t: &mut TransformComponent| t.rotation,
            |t: &mut TransformComponent, v: f64| t.rotation = v,
        )
        .register_get_set(
            "sx",
            |t: &mut TransformComponent| t.sx,
            |t: &mut TransformComponent, v: f64| t.sx = v,
        )
        .register_get_set(
            "sy",
            |t: &mut TransformComponent| t.sy,
            |t: &mut TransformComponent, v: f64| t.sy = v,
        )
        .register_fn("to_string", |t: &mut TransformComponent| format!("{t:?}"));

    engine
        .register_type_with_name::<MaterialComponent>("Material")
        .register_get_set(
            "color",
            |m: &mut MaterialComponent| -> Array {
                <[u8; 4]>::from(m.color)
                    .into_iter()
                    .map(|c| Dynamic::from(i64::from(c)))
                    .collect()
            },
            |m: &mut MaterialComponent, rgba: Array| {
                if let Some(color) = color_from_array(&rgba) {
                    m.color = color;
                }
            },
        )
        .register_get_set(
            "is_filled",
            |m: &mut MaterialComponent| m.is_filled,
            |m: &mut MaterialComponent, v: bool| m.is_filled = v,
        )
        .register_get_set(
            "is_stroked",
            |m: &mut MaterialComponent| m.is_stroked,
            |m: &mut MaterialComponent, v: bool| m.is_stroked = v,
        )
        .register_get_set(
            "stroke_width",
            |m: &mut MaterialComponent| m.stroke_width,
            |m: &mut MaterialComponent, v: f64| m.stroke_width = v.max(0.0),
        )
        .register_get_set(
            "anti_aliased",
            |m: &mut MaterialComponent| m.anti_aliased,
            |m: &mut MaterialComponent, v: bool| m.anti_aliased = v,
        );

    engine
        .register_type_with_name::<AnimationComponent>("Window")
        .register_get_set(
            "entry_time",
            |w: &mut AnimationComponent| w.entry_time,
            |w: &mut AnimationComponent, v: f64| w.entry_time = v,
        )
        .register_get_set(
            "exit_time",
            |w: &mut AnimationComponent| w.exit_time,
            |w: &mut AnimationComponent, v: f64| w.exit_time = v,
        );
}

/// `[r, g, b, a]` integers, each clamped to a byte. Anything else is rejected.
fn color_from_array(rgba: &Array) -> Option<Rgba8> {
    let mut channels = [0u8; 4];
    if rgba.len() != 4 {
        return None;
    }
    for (slot, value) in channels.iter_mut().zip(rgba) {
        *slot = value.as_int().ok()?.clamp(0, 255) as u8;
    }
    Some(Rgba8::from(channels))
}

#[cfg(test)]
#[path = "../../tests/unit/script/api.rs"]
mod tests;

use crate::ecs::components::{
    AnimationComponent, MaterialComponent, NameComponent, NativeScriptComponent,
    SceneBackground, ScriptComponent, TransformComponent,
};
use crate::ecs::store::{Entity, EntityStore};
use crate::foundation::config::SceneOpts;
use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{SceneError, SceneResult};
use crate::native::host::NativePluginHost;
use crate::scene::context::{SceneContext, SharedContext};
use crate::scene::document::{EntityDocument, SceneDocument};
use crate::scene::render::{Canvas, Paint};
use crate::scene::scheduler::{BehaviorStage, BindingKind, FrameScheduler};
use crate::scene::shapes::{ShapeComponent, ShapeKind};
use crate::script::host::ScriptHost;

/// A running scene: entity storage, both behavior hosts, and the frame pipeline.
///
/// The rendering collaborator drives it with one [`Scene::update`] and one [`Scene::draw`] per
/// frame. Nothing here fails the frame; broken behaviors are logged and dropped per entity.
pub struct Scene {
    ctx: SharedContext,
    scheduler: FrameScheduler,
    opts: SceneOpts,
}

impl Scene {
    /// Scene whose native bindings are compiled with the configured compiler profile.
    pub fn new(opts: SceneOpts) -> SceneResult<Self> {
        let native = NativePluginHost::rustc(opts.native.clone());
        Self::with_native_host(opts, native)
    }

    /// Scene with a caller-supplied native host, e.g. one backed by a static registry.
    pub fn with_native_host(opts: SceneOpts, native: NativePluginHost) -> SceneResult<Self> {
        opts.validate()?;
        let (w, h) = opts.viewport;
        let ctx = SceneContext::new(Size::new(w, h)).shared();
        let scripts = ScriptHost::new(&opts);
        let scheduler = FrameScheduler::new(vec![Box::new(native), Box::new(scripts)]);
        Ok(Self {
            ctx,
            scheduler,
            opts,
        })
    }

    pub fn opts(&self) -> &SceneOpts {
        &self.opts
    }

    /// Handle to the context behaviors see.
    pub fn context(&self) -> SharedContext {
        self.ctx.clone()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> Vec<Entity> {
        self.ctx.borrow().store.entities().collect()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.ctx.borrow().store.is_alive(entity)
    }

    /// Whether `entity`'s binding is loaded and receiving callbacks, for either execution model.
    pub fn is_running(&mut self, entity: Entity) -> bool {
        let kind = {
            let ctx = self.ctx.borrow();
            [BindingKind::Native, BindingKind::Interpreted]
                .into_iter()
                .find(|k| k.is_bound(&ctx.store, entity))
        };
        kind.and_then(|k| self.scheduler.stage_mut(k))
            .is_some_and(|stage| stage.is_running(entity))
    }

    /// Advance the clock to `time`, then run native updates followed by interpreted ones.
    #[tracing::instrument(skip(self))]
    pub fn update(&mut self, dt: f64, time: f64) {
        if !(dt.is_finite() && time.is_finite()) {
            tracing::warn!("skipping update with non-finite timing");
            return;
        }
        self.scheduler.update(&self.ctx, dt, time);
    }

    /// Draw every visible shape, background bucket first, then every native behavior's draw hook.
    ///
    /// An entity with an [`AnimationComponent`] is visible only inside its window.
    #[tracing::instrument(skip(self, canvas))]
    pub fn draw(&mut self, canvas: &mut dyn Canvas, time: f64) {
        let view = self.ctx.borrow().view.to_affine();
        canvas.save();
        canvas.transform(view);
        {
            let ctx = self.ctx.borrow();
            let store = &ctx.store;
            let (background, foreground): (Vec<Entity>, Vec<Entity>) = store
                .entities()
                .filter(|&e| store.has::<ShapeComponent>(e) && is_visible(store, e, time))
                .partition(|&e| store.has::<SceneBackground>(e));
            for entity in background.into_iter().chain(foreground) {
                draw_shape(store, entity, canvas);
            }
        }
        self.scheduler.draw(&self.ctx, canvas);
        canvas.restore();
    }

    /// Entity with `kind`'s default geometry at `(x, y)`.
    pub fn create_shape(&mut self, kind: ShapeKind, x: f64, y: f64) -> Entity {
        let mut ctx = self.ctx.borrow_mut();
        let store = &mut ctx.store;
        let e = store.create();
        store.emplace(e, NameComponent(format!("{kind:?}")));
        store.emplace(e, TransformComponent::at(x, y));
        store.emplace(e, MaterialComponent::default());
        store.emplace(e, kind.default_shape());
        tracing::debug!(entity = ?e, ?kind, "shape created");
        e
    }

    /// Filled rectangle covering `[0, width] x [0, height]`, drawn before every other entity.
    pub fn create_background(&mut self, width: f64, height: f64) -> SceneResult<Entity> {
        let shape = ShapeComponent::Rectangle { width, height };
        shape.validate()?;
        let mut ctx = self.ctx.borrow_mut();
        let store = &mut ctx.store;
        let e = store.create();
        store.emplace(e, NameComponent("Background".to_string()));
        store.emplace(e, TransformComponent::at(width / 2.0, height / 2.0));
        store.emplace(
            e,
            MaterialComponent {
                color: Rgba8::BLACK,
                ..MaterialComponent::default()
            },
        );
        store.emplace(e, shape);
        store.emplace(e, SceneBackground);
        Ok(e)
    }

    /// Bind an interpreted script. The environment is instantiated on the next update.
    pub fn attach_script(&mut self, entity: Entity, binding: ScriptComponent) -> SceneResult<()> {
        self.attach(entity, BindingKind::Interpreted, |store| {
            store.emplace(entity, binding)
        })
    }

    /// Bind a native plugin, building and loading it now.
    ///
    /// On failure the binding is removed and the entity is left otherwise intact.
    pub fn attach_native(
        &mut self,
        entity: Entity,
        binding: NativeScriptComponent,
    ) -> SceneResult<()> {
        self.attach(entity, BindingKind::Native, |store| {
            store.emplace(entity, binding)
        })
    }

    pub fn detach_script(&mut self, entity: Entity) {
        self.detach(entity, BindingKind::Interpreted);
    }

    pub fn detach_native(&mut self, entity: Entity) {
        self.detach(entity, BindingKind::Native);
    }

    /// Tear down `entity`'s behavior, then remove it and its components.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.scheduler.detach_all(entity, &self.ctx);
        self.ctx.borrow_mut().store.destroy(entity)
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        for entity in self.entities() {
            self.scheduler.detach_all(entity, &self.ctx);
        }
        self.ctx.borrow_mut().store.clear();
        tracing::debug!("scene cleared");
    }

    /// Document of every live entity, in creation order.
    pub fn serialize(&self) -> SceneDocument {
        let ctx = self.ctx.borrow();
        let store = &ctx.store;
        let entities = store
            .entities()
            .map(|e| EntityDocument {
                name: store.get::<NameComponent>(e).cloned(),
                transform: store.get::<TransformComponent>(e).copied(),
                material: store.get::<MaterialComponent>(e).copied(),
                window: store.get::<AnimationComponent>(e).copied(),
                script: store.get::<ScriptComponent>(e).cloned(),
                native_script: store.get::<NativeScriptComponent>(e).cloned(),
                background: store.has::<SceneBackground>(e),
                shape: store.get::<ShapeComponent>(e).cloned(),
            })
            .collect();
        SceneDocument { entities }
    }

    /// Replace the scene's contents with `doc`.
    ///
    /// The document is validated as a whole first; an invalid one leaves the scene untouched.
    /// Bindings that fail to attach are logged and dropped without failing the load.
    pub fn deserialize(&mut self, doc: &SceneDocument) -> SceneResult<Vec<Entity>> {
        doc.validate()?;
        self.clear();

        let entities: Vec<Entity> = {
            let mut ctx = self.ctx.borrow_mut();
            doc.entities
                .iter()
                .map(|d| spawn(&mut ctx.store, d))
                .collect()
        };

        let ctx = self.ctx.clone();
        for (&entity, d) in entities.iter().zip(&doc.entities) {
            let kind = if d.script.is_some() {
                BindingKind::Interpreted
            } else if d.native_script.is_some() {
                BindingKind::Native
            } else {
                continue;
            };
            if let Err(e) = self.stage(kind).and_then(|s| s.attach(entity, &ctx)) {
                tracing::warn!(?entity, binding = kind.name(), error = %e, "binding dropped while loading scene");
            }
        }
        tracing::info!(entities = entities.len(), "scene loaded");
        Ok(entities)
    }

    /// Parse, validate, and load a JSON scene document.
    pub fn load_json(&mut self, text: &str) -> SceneResult<Vec<Entity>> {
        let doc = SceneDocument::from_json_str(text)?;
        self.deserialize(&doc)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        self.serialize().to_json_pretty()
    }

    fn stage(&mut self, kind: BindingKind) -> SceneResult<&mut (dyn BehaviorStage + 'static)> {
        self.scheduler
            .stage_mut(kind)
            .ok_or_else(|| SceneError::validation(format!("no {} stage", kind.name())))
    }

    fn attach(
        &mut self,
        entity: Entity,
        kind: BindingKind,
        bind: impl FnOnce(&mut EntityStore) -> bool,
    ) -> SceneResult<()> {
        {
            let mut ctx = self.ctx.borrow_mut();
            if !ctx.store.is_alive(entity) {
                return Err(SceneError::validation(format!(
                    "entity {entity:?} is not alive"
                )));
            }
            let other = kind.other();
            if other.is_bound(&ctx.store, entity) {
                return Err(SceneError::BindingConflict {
                    entity,
                    existing: other.name(),
                });
            }
            bind(&mut ctx.store);
        }
        let ctx = self.ctx.clone();
        self.stage(kind)?.attach(entity, &ctx)
    }

    fn detach(&mut self, entity: Entity, kind: BindingKind) {
        let ctx = self.ctx.clone();
        if let Ok(stage) = self.stage(kind) {
            stage.detach(entity, &ctx);
        }
    }
}

fn spawn(store: &mut EntityStore, d: &EntityDocument) -> Entity {
    let e = store.create();
    if let Some(name) = &d.name {
        store.emplace(e, name.clone());
    }
    if let Some(t) = d.transform {
        store.emplace(e, t);
    }
    if let Some(m) = d.material {
        store.emplace(e, m);
    }
    if let Some(w) = d.window {
        store.emplace(e, w);
    }
    if let Some(s) = &d.script {
        store.emplace(e, s.clone());
    }
    if let Some(n) = &d.native_script {
        store.emplace(e, n.clone());
    }
    if d.background {
        store.emplace(e, SceneBackground);
    }
    if let Some(shape) = &d.shape {
        store.emplace(e, shape.clone());
    }
    e
}

fn is_visible(store: &EntityStore, entity: Entity, time: f64) -> bool {
    store
        .get::<AnimationComponent>(entity)
        .is_none_or(|w| w.is_visible_at(time))
}

fn draw_shape(store: &EntityStore, entity: Entity, canvas: &mut dyn Canvas) {
    let Some(shape) = store.get::<ShapeComponent>(entity) else {
        return;
    };
    let transform = store
        .get::<TransformComponent>(entity)
        .copied()
        .unwrap_or_default();
    let paint = Paint::from_material(
        &store
            .get::<MaterialComponent>(entity)
            .copied()
            .unwrap_or_default(),
    );
    canvas.save();
    canvas.transform(transform.to_affine());
    canvas.draw_path(&shape.to_path(), &paint);
    canvas.restore();
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scene.rs"]
mod tests;

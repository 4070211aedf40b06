use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use slotmap::SecondaryMap;

use crate::ecs::components::{NativeScriptComponent, TransformComponent};
use crate::ecs::store::Entity;
use crate::foundation::config::NativeOpts;
use crate::foundation::error::{PluginError, SceneError, SceneResult};
use crate::native::abi::{Behavior, BehaviorObject};
use crate::native::build::{PluginBuilder, RustcBuilder};
use crate::native::loader::{DylibLoader, PluginLibrary, PluginLoader};
use crate::native::registry::StaticRegistry;
use crate::scene::context::SharedContext;
use crate::scene::render::Canvas;
use crate::scene::scheduler::{BehaviorStage, BindingKind};

/// A loaded plugin: one behavior object plus the library that owns its code.
///
/// Object and library are both present until teardown, which always destroys the object before
/// closing the library.
struct LoadedPlugin {
    source: PathBuf,
    object: Option<BehaviorObject>,
    library: Option<Box<dyn PluginLibrary>>,
}

impl LoadedPlugin {
    fn invoke(
        &mut self,
        phase: &'static str,
        f: impl FnOnce(&mut dyn Behavior),
    ) -> Result<(), PluginError> {
        let Some(object) = self.object.as_mut() else {
            return Ok(());
        };
        catch_unwind(AssertUnwindSafe(|| f(object.behavior()))).map_err(|payload| {
            PluginError::Panicked {
                phase,
                message: panic_message(payload.as_ref()),
            }
        })
    }

    fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().map(|l| l.path())
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        drop(self.object.take());
        if let Some(library) = self.library.take()
            && let Err(e) = library.close()
        {
            tracing::warn!(source = %self.source.display(), error = %e, "plugin library did not close cleanly");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Builds, loads, drives, and unloads native behavior plugins.
///
/// Every failure is local to its entity: the binding is torn down, the
/// [`NativeScriptComponent`] removed, and the rest of the scene keeps running.
pub struct NativePluginHost {
    builder: Box<dyn PluginBuilder>,
    loader: Box<dyn PluginLoader>,
    bindings: SecondaryMap<Entity, LoadedPlugin>,
}

impl NativePluginHost {
    pub fn new(builder: Box<dyn PluginBuilder>, loader: Box<dyn PluginLoader>) -> Self {
        Self {
            builder,
            loader,
            bindings: SecondaryMap::new(),
        }
    }

    /// Compile with `rustc` and load shared libraries from disk.
    pub fn rustc(opts: NativeOpts) -> Self {
        Self::new(Box::new(RustcBuilder::new(opts)), Box::new(DylibLoader))
    }

    /// Serve pre-registered, statically linked behaviors only.
    pub fn with_registry(registry: StaticRegistry) -> Self {
        Self::new(Box::new(registry.clone()), Box::new(registry))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Artifact the entity's behavior was loaded from.
    pub fn library_path(&self, entity: Entity) -> Option<&Path> {
        self.bindings.get(entity).and_then(LoadedPlugin::library_path)
    }

    fn load(&mut self, source: &Path) -> Result<LoadedPlugin, PluginError> {
        let artifact = self.builder.build(source)?;
        let library = self.loader.open(&artifact)?;
        let object = match library
            .symbols()
            .and_then(|symbols| symbols.instantiate(library.path()))
        {
            Ok(object) => object,
            Err(e) => {
                if let Err(close) = library.close() {
                    tracing::warn!(error = %close, "closing rejected plugin library failed");
                }
                return Err(e);
            }
        };
        Ok(LoadedPlugin {
            source: source.to_path_buf(),
            object: Some(object),
            library: Some(library),
        })
    }

    fn fail(&mut self, entity: Entity, ctx: &SharedContext, error: &PluginError) {
        self.bindings.remove(entity);
        let removed = ctx.borrow_mut().store.remove::<NativeScriptComponent>(entity);
        tracing::warn!(
            ?entity,
            source = ?removed.map(|c| c.source_path),
            %error,
            "native behavior failed; binding removed"
        );
    }

    /// Attach every bound entity that has no runtime state yet and drop state whose binding is
    /// gone.
    fn sync(&mut self, ctx: &SharedContext) {
        let stale: Vec<Entity> = {
            let ctx = ctx.borrow();
            self.bindings
                .keys()
                .filter(|&e| !ctx.store.has::<NativeScriptComponent>(e))
                .collect()
        };
        for entity in stale {
            tracing::debug!(?entity, "native binding vanished; unloading");
            self.bindings.remove(entity);
        }

        let pending: Vec<Entity> = ctx
            .borrow()
            .store
            .entities_with::<NativeScriptComponent>()
            .into_iter()
            .filter(|&e| !self.bindings.contains_key(e))
            .collect();
        for entity in pending {
            // Failures are logged and the component removed inside `attach`.
            let _ = self.attach(entity, ctx);
        }
    }
}

impl BehaviorStage for NativePluginHost {
    fn kind(&self) -> BindingKind {
        BindingKind::Native
    }

    fn attach(&mut self, entity: Entity, ctx: &SharedContext) -> SceneResult<()> {
        if self.bindings.remove(entity).is_some() {
            tracing::debug!(?entity, "replacing native binding");
        }
        let source = ctx
            .borrow()
            .store
            .get::<NativeScriptComponent>(entity)
            .map(|c| c.source_path.clone())
            .ok_or_else(|| {
                SceneError::validation(format!("entity {entity:?} has no CppScriptComponent"))
            })?;

        let mut plugin = match self.load(&source) {
            Ok(plugin) => plugin,
            Err(e) => {
                self.fail(entity, ctx, &e);
                return Err(e.into());
            }
        };
        if let Err(e) = plugin.invoke("start", |b| b.on_start(entity, &mut ctx.borrow_mut())) {
            drop(plugin);
            self.fail(entity, ctx, &e);
            return Err(e.into());
        }

        tracing::info!(?entity, source = %source.display(), "native behavior attached");
        self.bindings.insert(entity, plugin);
        Ok(())
    }

    fn detach(&mut self, entity: Entity, ctx: &SharedContext) {
        if let Some(plugin) = self.bindings.remove(entity) {
            tracing::debug!(?entity, source = %plugin.source.display(), "native behavior detached");
        }
        ctx.borrow_mut().store.remove::<NativeScriptComponent>(entity);
    }

    fn update(&mut self, ctx: &SharedContext, dt: f64, time: f64) {
        self.sync(ctx);

        let entities: Vec<Entity> = self.bindings.keys().collect();
        for entity in entities {
            if !ctx.borrow().store.is_alive(entity) {
                continue;
            }
            let Some(plugin) = self.bindings.get_mut(entity) else {
                continue;
            };
            let result = plugin.invoke("update", |b| {
                b.on_update(entity, &mut ctx.borrow_mut(), dt, time)
            });
            if let Err(e) = result {
                self.fail(entity, ctx, &e);
            }
        }
    }

    fn draw(&mut self, ctx: &SharedContext, canvas: &mut dyn Canvas) {
        let entities: Vec<Entity> = self.bindings.keys().collect();
        for entity in entities {
            let transform = {
                let ctx = ctx.borrow();
                if !ctx.store.is_alive(entity) {
                    continue;
                }
                ctx.store
                    .get::<TransformComponent>(entity)
                    .copied()
                    .unwrap_or_default()
            };
            let Some(plugin) = self.bindings.get_mut(entity) else {
                continue;
            };

            canvas.save();
            canvas.transform(transform.to_affine());
            let result = plugin.invoke("draw", |b| {
                b.on_draw(entity, &mut ctx.borrow_mut(), &mut *canvas)
            });
            canvas.restore();
            if let Err(e) = result {
                self.fail(entity, ctx, &e);
            }
        }
    }

    fn is_attached(&self, entity: Entity) -> bool {
        self.bindings.contains_key(entity)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/native/host.rs"]
mod tests;

use std::path::{Path, PathBuf};

use rhai::{AST, CallFnOptions, Dynamic, Engine, FuncArgs, Map, Scope};
use slotmap::SecondaryMap;

use crate::ecs::components::ScriptComponent;
use crate::ecs::store::Entity;
use crate::foundation::config::SceneOpts;
use crate::foundation::error::{SceneError, SceneResult, ScriptError};
use crate::scene::context::SharedContext;
use crate::scene::scheduler::{BehaviorStage, BindingKind};
use crate::script::api::{SCRIPT_TARGET, ScriptScene, build_engine, entity_id};

/// One entity's isolated interpreter state.
struct Environment {
    binding: ScriptComponent,
    path: PathBuf,
    ast: AST,
    scope: Scope<'static>,
    /// Per-entity object map bound as `this` in every entry point.
    state: Dynamic,
    scene: ScriptScene,
    warned_missing_update: bool,
}

impl Environment {
    fn has_fn(&self, name: &str) -> bool {
        self.ast.iter_functions().any(|f| f.name == name)
    }

    fn call(
        &mut self,
        engine: &Engine,
        function: &str,
        args: impl FuncArgs,
    ) -> Result<(), ScriptError> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.state);
        engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, function, args)
            .map(drop)
            .map_err(|e| ScriptError::Runtime {
                function: function.to_string(),
                reason: e.to_string(),
            })
    }
}

enum EnvironmentSlot {
    /// Bound, instantiated lazily on the next update.
    Pending,
    Ready(Box<Environment>),
    /// Instantiation failed for this binding; skipped until it changes or is re-attached.
    Failed(ScriptComponent),
}

/// One shared interpreter, one environment per scripted entity.
///
/// Load and runtime failures are logged and never leave the host.
pub struct ScriptHost {
    engine: Engine,
    script_root: Option<PathBuf>,
    slots: SecondaryMap<Entity, EnvironmentSlot>,
}

impl ScriptHost {
    pub fn new(opts: &SceneOpts) -> Self {
        Self {
            engine: build_engine(&opts.scripts),
            script_root: opts.script_root.clone(),
            slots: SecondaryMap::new(),
        }
    }

    /// Whether `entity` has a live, successfully loaded environment.
    pub fn has_environment(&self, entity: Entity) -> bool {
        matches!(self.slots.get(entity), Some(EnvironmentSlot::Ready(_)))
    }

    /// Resolved script path of a loaded environment.
    pub fn script_path(&self, entity: Entity) -> Option<&Path> {
        match self.slots.get(entity) {
            Some(EnvironmentSlot::Ready(env)) => Some(&env.path),
            _ => None,
        }
    }

    /// Absolute paths stay as they are; relative ones resolve against the script root, or the
    /// running executable's directory when none is configured.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let base = self.script_root.clone().or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
        });
        match base {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    fn instantiate(
        &self,
        entity: Entity,
        binding: ScriptComponent,
        ctx: &SharedContext,
    ) -> Result<Environment, ScriptError> {
        let path = self.resolve_path(&binding.script_path);
        if !path.exists() {
            return Err(ScriptError::NotFound(path));
        }
        if !path.is_file() {
            return Err(ScriptError::NotAFile(path));
        }
        let source = std::fs::read_to_string(&path).map_err(|e| ScriptError::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let load_err = |e: &dyn std::fmt::Display| ScriptError::Load {
            path: path.clone(),
            reason: e.to_string(),
        };
        let mut ast = self.engine.compile(&source).map_err(|e| load_err(&e))?;
        ast.set_source(path.display().to_string());

        let mut scope = Scope::new();
        scope.push_constant("entity", entity_id(entity));
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| load_err(&e))?;

        Ok(Environment {
            binding,
            path,
            ast,
            scope,
            state: Dynamic::from_map(Map::new()),
            scene: ScriptScene::new(ctx.clone(), entity),
            warned_missing_update: false,
        })
    }

    /// Bring a pending slot up, running the start function once on success.
    fn bring_up(&self, entity: Entity, ctx: &SharedContext) -> EnvironmentSlot {
        let Some(binding) = ctx.borrow().store.get::<ScriptComponent>(entity).cloned() else {
            return EnvironmentSlot::Pending;
        };
        match self.instantiate(entity, binding.clone(), ctx) {
            Ok(mut env) => {
                tracing::debug!(?entity, path = %env.path.display(), "script environment ready");
                let start = env.binding.start_function.clone();
                if env.has_fn(&start) {
                    let scene = env.scene.clone();
                    if let Err(e) = env.call(&self.engine, &start, (entity_id(entity), scene)) {
                        tracing::warn!(target: SCRIPT_TARGET, ?entity, error = %e, "script start failed");
                    }
                }
                EnvironmentSlot::Ready(Box::new(env))
            }
            Err(e) => {
                tracing::warn!(target: SCRIPT_TARGET, ?entity, error = %e, "script failed to load");
                EnvironmentSlot::Failed(binding)
            }
        }
    }

    /// Run the destroy function of a loaded environment.
    fn tear_down(&self, entity: Entity, slot: EnvironmentSlot) {
        let EnvironmentSlot::Ready(mut env) = slot else {
            return;
        };
        let destroy = env.binding.destroy_function.clone();
        if env.has_fn(&destroy) {
            let scene = env.scene.clone();
            if let Err(e) = env.call(&self.engine, &destroy, (entity_id(entity), scene)) {
                tracing::warn!(target: SCRIPT_TARGET, ?entity, error = %e, "script destroy failed");
            }
        }
        tracing::debug!(?entity, "script environment released");
    }

    /// Track bindings added, replaced, or removed straight through the store.
    fn sync(&mut self, ctx: &SharedContext) {
        let changed: Vec<Entity> = {
            let ctx = ctx.borrow();
            self.slots
                .iter()
                .filter(|&(e, slot)| {
                    let current = ctx.store.get::<ScriptComponent>(e);
                    match slot {
                        EnvironmentSlot::Pending => current.is_none(),
                        EnvironmentSlot::Ready(env) => current != Some(&env.binding),
                        EnvironmentSlot::Failed(binding) => current != Some(binding),
                    }
                })
                .map(|(e, _)| e)
                .collect()
        };
        for entity in changed {
            if let Some(slot) = self.slots.remove(entity) {
                self.tear_down(entity, slot);
            }
            if ctx.borrow().store.has::<ScriptComponent>(entity) {
                self.slots.insert(entity, EnvironmentSlot::Pending);
            }
        }

        let fresh: Vec<Entity> = ctx
            .borrow()
            .store
            .entities_with::<ScriptComponent>()
            .into_iter()
            .filter(|&e| !self.slots.contains_key(e))
            .collect();
        for entity in fresh {
            self.slots.insert(entity, EnvironmentSlot::Pending);
        }
    }
}

impl BehaviorStage for ScriptHost {
    fn kind(&self) -> BindingKind {
        BindingKind::Interpreted
    }

    fn attach(&mut self, entity: Entity, ctx: &SharedContext) -> SceneResult<()> {
        if !ctx.borrow().store.has::<ScriptComponent>(entity) {
            return Err(SceneError::validation(format!(
                "entity {entity:?} has no ScriptComponent"
            )));
        }
        if let Some(old) = self.slots.insert(entity, EnvironmentSlot::Pending) {
            self.tear_down(entity, old);
        }
        Ok(())
    }

    fn detach(&mut self, entity: Entity, ctx: &SharedContext) {
        if let Some(slot) = self.slots.remove(entity) {
            self.tear_down(entity, slot);
        }
        ctx.borrow_mut().store.remove::<ScriptComponent>(entity);
    }

    fn update(&mut self, ctx: &SharedContext, dt: f64, time: f64) {
        self.sync(ctx);

        let entities: Vec<Entity> = self.slots.keys().collect();
        for entity in entities {
            if !ctx.borrow().store.is_alive(entity) {
                continue;
            }
            if matches!(self.slots.get(entity), Some(EnvironmentSlot::Pending)) {
                let slot = self.bring_up(entity, ctx);
                self.slots.insert(entity, slot);
            }
            let Some(EnvironmentSlot::Ready(env)) = self.slots.get_mut(entity) else {
                continue;
            };

            let update = env.binding.update_function.clone();
            if !env.has_fn(&update) {
                if !env.warned_missing_update {
                    env.warned_missing_update = true;
                    tracing::warn!(target: SCRIPT_TARGET, ?entity, function = %update, "script has no update function");
                }
                continue;
            }
            let scene = env.scene.clone();
            if let Err(e) = env.call(&self.engine, &update, (entity_id(entity), scene, dt, time)) {
                tracing::warn!(target: SCRIPT_TARGET, ?entity, error = %e, "script update failed");
            }
        }
    }

    fn is_attached(&self, entity: Entity) -> bool {
        self.slots.contains_key(entity)
    }

    fn is_running(&self, entity: Entity) -> bool {
        self.has_environment(entity)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/host.rs"]
mod tests;

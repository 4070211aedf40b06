use crate::ecs::components::{NativeScriptComponent, ScriptComponent};
use crate::ecs::store::{Entity, EntityStore};
use crate::foundation::error::SceneResult;
use crate::scene::context::SharedContext;
use crate::scene::render::Canvas;

/// Which binding component a stage owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Compiled plugin bound through [`NativeScriptComponent`].
    Native,
    /// Interpreted script bound through [`ScriptComponent`].
    Interpreted,
}

impl BindingKind {
    /// The kind an entity may not carry alongside this one.
    pub fn other(self) -> Self {
        match self {
            Self::Native => Self::Interpreted,
            Self::Interpreted => Self::Native,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Interpreted => "interpreted",
        }
    }

    /// Whether `entity` carries this kind's binding component.
    pub fn is_bound(self, store: &EntityStore, entity: Entity) -> bool {
        match self {
            Self::Native => store.has::<NativeScriptComponent>(entity),
            Self::Interpreted => store.has::<ScriptComponent>(entity),
        }
    }
}

/// One execution model in the frame pipeline.
///
/// Stages read their binding component from the store; `attach`/`detach` manage whatever runtime
/// state backs it. Failures inside `update` and `draw` are local to the entity and never surface.
pub trait BehaviorStage {
    fn kind(&self) -> BindingKind;

    /// Bring up the binding for `entity`. On error the binding component has been removed.
    fn attach(&mut self, entity: Entity, ctx: &SharedContext) -> SceneResult<()>;

    /// Tear down the binding for `entity` and remove its component. No-op when unbound.
    fn detach(&mut self, entity: Entity, ctx: &SharedContext);

    fn update(&mut self, ctx: &SharedContext, dt: f64, time: f64);

    fn draw(&mut self, _ctx: &SharedContext, _canvas: &mut dyn Canvas) {}

    /// Whether runtime state exists for `entity`.
    fn is_attached(&self, entity: Entity) -> bool;

    /// Whether `entity`'s behavior is loaded and receiving callbacks.
    fn is_running(&self, entity: Entity) -> bool {
        self.is_attached(entity)
    }
}

/// Where the scheduler is within the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FramePhase {
    /// No frame has run yet.
    #[default]
    Idle,
    /// Update finished; draw may follow.
    Updated,
    /// Draw finished; the next call should be an update.
    Drawn,
}

/// Runs stages in a fixed order: every update of stage `n` happens before any of stage `n + 1`.
pub struct FrameScheduler {
    stages: Vec<Box<dyn BehaviorStage>>,
    phase: FramePhase,
}

impl FrameScheduler {
    pub fn new(stages: Vec<Box<dyn BehaviorStage>>) -> Self {
        Self {
            stages,
            phase: FramePhase::Idle,
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.kind().name()).collect()
    }

    pub fn stage_mut(&mut self, kind: BindingKind) -> Option<&mut (dyn BehaviorStage + 'static)> {
        self.stages
            .iter_mut()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_mut())
    }

    /// Advance the clock, then run every stage's update in order.
    pub fn update(&mut self, ctx: &SharedContext, dt: f64, time: f64) {
        if self.phase == FramePhase::Updated {
            tracing::debug!("update called twice without a draw in between");
        }
        ctx.borrow_mut().clock.advance(dt, time);
        for stage in &mut self.stages {
            stage.update(ctx, dt, time);
        }
        self.phase = FramePhase::Updated;
    }

    /// Run every stage's draw hook in order.
    pub fn draw(&mut self, ctx: &SharedContext, canvas: &mut dyn Canvas) {
        for stage in &mut self.stages {
            stage.draw(ctx, canvas);
        }
        self.phase = FramePhase::Drawn;
    }

    /// Detach `entity` from every stage.
    pub fn detach_all(&mut self, entity: Entity, ctx: &SharedContext) {
        for stage in &mut self.stages {
            stage.detach(entity, ctx);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scheduler.rs"]
mod tests;

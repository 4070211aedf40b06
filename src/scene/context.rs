use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::store::EntityStore;
use crate::foundation::core::{Affine, Point, Size, Vec2};

/// Context handle shared between the scene and every behavior callback.
///
/// Callbacks run on the tick thread only; borrows must not be held across calls into another
/// behavior.
pub type SharedContext = Rc<RefCell<SceneContext>>;

/// Everything a behavior may read or write during a callback.
#[derive(Default)]
pub struct SceneContext {
    /// Entity and component storage.
    pub store: EntityStore,
    /// Camera controls proxied to the rendering collaborator.
    pub view: ViewControl,
    /// Frame clock, advanced once per update.
    pub clock: Clock,
}

impl SceneContext {
    pub fn new(viewport: Size) -> Self {
        Self {
            store: EntityStore::new(),
            view: ViewControl::new(viewport),
            clock: Clock::default(),
        }
    }

    pub fn shared(self) -> SharedContext {
        Rc::new(RefCell::new(self))
    }
}

/// Scene clock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Clock {
    /// Absolute scene time in seconds.
    pub time: f64,
    /// Delta of the last update.
    pub dt: f64,
    /// Number of updates so far.
    pub frame: u64,
}

impl Clock {
    /// Jump to the caller-supplied absolute time.
    pub fn advance(&mut self, dt: f64, time: f64) {
        self.dt = dt;
        self.time = time;
        self.frame += 1;
    }
}

/// Pan/zoom camera over the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewControl {
    center: Point,
    zoom: f64,
    viewport: Size,
}

impl Default for ViewControl {
    fn default() -> Self {
        Self::new(Size::new(1280.0, 720.0))
    }
}

impl ViewControl {
    /// Smallest zoom accepted.
    pub const MIN_ZOOM: f64 = 1e-3;
    /// Largest zoom accepted.
    pub const MAX_ZOOM: f64 = 1e3;

    /// Camera centered on the middle of the viewport at zoom 1.
    pub fn new(viewport: Size) -> Self {
        Self {
            center: Point::new(viewport.width / 2.0, viewport.height / 2.0),
            zoom: 1.0,
            viewport,
        }
    }

    /// Move the camera by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.center -= Vec2::new(dx, dy) / self.zoom;
    }

    /// Multiply the zoom by `factor`, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.viewport);
    }

    /// Scene point shown at the middle of the viewport.
    pub fn center(&self) -> Point {
        self.center
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Scene-to-screen transform.
    pub fn to_affine(&self) -> Affine {
        Affine::translate(Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0))
            * Affine::scale(self.zoom)
            * Affine::translate(-self.center.to_vec2())
    }
}

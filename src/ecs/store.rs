use slotmap::{SecondaryMap, SlotMap};

use crate::ecs::components::{
    AnimationComponent, MaterialComponent, NameComponent, NativeScriptComponent,
    SceneBackground, ScriptComponent, TransformComponent,
};
use crate::scene::shapes::ShapeComponent;

slotmap::new_key_type! {
    /// Opaque entity handle.
    ///
    /// Handles are generational: once an entity is destroyed its handle stays invalid, even if the
    /// slot is reused by a later entity.
    pub struct Entity;
}

impl Entity {
    /// Stable 64-bit encoding of the handle (slot and generation).
    pub fn to_bits(self) -> u64 {
        slotmap::Key::data(&self).as_ffi()
    }

    /// Inverse of [`Entity::to_bits`]. Unknown bits decode to a handle that is simply not alive.
    pub fn from_bits(bits: u64) -> Self {
        slotmap::KeyData::from_ffi(bits).into()
    }
}

/// A value type stored in its own column, at most one per entity.
pub trait Component: Sized + 'static {
    #[doc(hidden)]
    fn column(columns: &Columns) -> &SecondaryMap<Entity, Self>;
    #[doc(hidden)]
    fn column_mut(columns: &mut Columns) -> &mut SecondaryMap<Entity, Self>;
}

macro_rules! component_columns {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// One densely indexed column per component type.
        #[doc(hidden)]
        #[derive(Default)]
        pub struct Columns {
            $($field: SecondaryMap<Entity, $ty>,)*
        }

        impl Columns {
            fn remove_all(&mut self, entity: Entity) {
                $(self.$field.remove(entity);)*
            }

            fn clear(&mut self) {
                $(self.$field.clear();)*
            }
        }

        $(
            impl Component for $ty {
                fn column(columns: &Columns) -> &SecondaryMap<Entity, Self> {
                    &columns.$field
                }

                fn column_mut(columns: &mut Columns) -> &mut SecondaryMap<Entity, Self> {
                    &mut columns.$field
                }
            }
        )*
    };
}

component_columns! {
    names: NameComponent,
    transforms: TransformComponent,
    materials: MaterialComponent,
    windows: AnimationComponent,
    scripts: ScriptComponent,
    native_scripts: NativeScriptComponent,
    backgrounds: SceneBackground,
    shapes: ShapeComponent,
}

/// Entity identity plus typed component storage.
///
/// Every operation on an invalid (destroyed or foreign) handle is a silent no-op returning
/// `None`/`false`, so callers can query optimistically.
#[derive(Default)]
pub struct EntityStore {
    entities: SlotMap<Entity, ()>,
    order: Vec<Entity>,
    columns: Columns,
}

impl EntityStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new entity with no components.
    pub fn create(&mut self) -> Entity {
        let entity = self.entities.insert(());
        self.order.push(entity);
        entity
    }

    /// Remove an entity and all of its components. Destroying twice is a no-op.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.columns.remove_all(entity);
        self.order.retain(|&e| e != entity);
        true
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        // SlotMap::clear bumps every slot version, so old handles stay dead.
        self.entities.clear();
        self.columns.clear();
        self.order.clear();
    }

    /// Whether `entity` refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// `true` when no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// Insert `component`, replacing any previous value of the same type.
    ///
    /// Returns `false` (and drops `component`) when `entity` is not alive.
    pub fn emplace<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        T::column_mut(&mut self.columns).insert(entity, component);
        true
    }

    /// Borrow the component of type `T`, if present.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::column(&self.columns).get(entity)
    }

    /// Mutably borrow the component of type `T`, if present.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::column_mut(&mut self.columns).get_mut(entity)
    }

    /// Whether `entity` has a `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        T::column(&self.columns).contains_key(entity)
    }

    /// Remove and return the `T` of `entity`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        T::column_mut(&mut self.columns).remove(entity)
    }

    /// Visit every entity owning a `T`, in slot order.
    pub fn each<T: Component>(&self, mut f: impl FnMut(Entity, &T)) {
        for (entity, component) in T::column(&self.columns).iter() {
            f(entity, component);
        }
    }

    /// Mutable variant of [`EntityStore::each`].
    pub fn each_mut<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        for (entity, component) in T::column_mut(&mut self.columns).iter_mut() {
            f(entity, component);
        }
    }

    /// Snapshot of the entities owning a `T`, in the same order as [`EntityStore::each`].
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        T::column(&self.columns).keys().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ecs/store.rs"]
mod tests;

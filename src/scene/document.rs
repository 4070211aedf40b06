use crate::ecs::components::{
    AnimationComponent, MaterialComponent, NameComponent, NativeScriptComponent,
    ScriptComponent, TransformComponent,
};
use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::shapes::ShapeComponent;

/// Persisted scene: `{ "entities": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDocument {
    /// Entities in creation order.
    #[serde(default)]
    pub entities: Vec<EntityDocument>,
}

/// One entity: every key is optional and named after its component.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityDocument {
    #[serde(
        rename = "NameComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<NameComponent>,
    #[serde(
        rename = "TransformComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<TransformComponent>,
    #[serde(
        rename = "MaterialComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub material: Option<MaterialComponent>,
    #[serde(
        rename = "AnimationComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub window: Option<AnimationComponent>,
    #[serde(
        rename = "ScriptComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub script: Option<ScriptComponent>,
    #[serde(
        rename = "CppScriptComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub native_script: Option<NativeScriptComponent>,
    /// Background tag; absent and `false` are equivalent.
    #[serde(
        rename = "SceneBackgroundComponent",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub background: bool,
    #[serde(
        rename = "ShapeComponent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub shape: Option<ShapeComponent>,
}

impl SceneDocument {
    pub fn from_json_str(text: &str) -> SceneResult<Self> {
        let doc: Self = serde_json::from_str(text).map_err(|e| SceneError::serde(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> SceneResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SceneError::serde(e.to_string()))
    }

    /// Reject documents that cannot be loaded as a whole.
    pub fn validate(&self) -> SceneResult<()> {
        for (index, entity) in self.entities.iter().enumerate() {
            entity
                .validate()
                .map_err(|e| SceneError::validation(format!("entities[{index}]: {e}")))?;
        }
        Ok(())
    }
}

impl EntityDocument {
    pub fn validate(&self) -> SceneResult<()> {
        if self.script.is_some() && self.native_script.is_some() {
            return Err(SceneError::validation(
                "ScriptComponent and CppScriptComponent are mutually exclusive",
            ));
        }
        if let Some(shape) = &self.shape {
            shape.validate()?;
        }
        if let Some(w) = &self.window
            && w.entry_time > w.exit_time
        {
            return Err(SceneError::validation(
                "AnimationComponent entryTime must be <= exitTime",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;

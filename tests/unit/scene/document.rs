use super::*;

#[test]
fn keys_follow_component_names() {
    let doc = SceneDocument::from_json_str(
        r#"{
            "entities": [
                {
                    "NameComponent": "bg",
                    "SceneBackgroundComponent": true,
                    "ShapeComponent": { "kind": "Rectangle", "properties": { "width": 640, "height": 480 } }
                },
                {
                    "TransformComponent": { "x": 1, "y": 2, "rotation": 0, "sx": 1, "sy": 1 },
                    "MaterialComponent": {
                        "color": [255, 0, 0, 255],
                        "isFilled": true,
                        "isStroked": false,
                        "strokeWidth": 1.5,
                        "antiAliased": true
                    },
                    "AnimationComponent": { "entryTime": 0, "exitTime": 3 },
                    "ScriptComponent": {
                        "scriptPath": "spin.rhai",
                        "startFunction": "on_start",
                        "updateFunction": "on_update",
                        "destroyFunction": "on_destroy"
                    }
                },
                { "CppScriptComponent": { "source_path": "orbit.rs" } }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(doc.entities.len(), 3);
    assert!(doc.entities[0].background);
    assert_eq!(doc.entities[0].name, Some(NameComponent("bg".to_string())));
    assert_eq!(doc.entities[1].material.unwrap().stroke_width, 1.5);
    assert_eq!(
        doc.entities[2].native_script.as_ref().unwrap().source_path,
        std::path::PathBuf::from("orbit.rs")
    );
}

#[test]
fn script_binding_has_no_draw_entry_point() {
    let v = serde_json::to_value(ScriptComponent::new("spin.rhai")).unwrap();
    let mut keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["destroyFunction", "scriptPath", "startFunction", "updateFunction"]
    );

    // Unknown keys such as a draw function are ignored on load.
    let parsed: ScriptComponent =
        serde_json::from_str(r#"{ "scriptPath": "spin.rhai", "drawFunction": "on_draw" }"#).unwrap();
    assert_eq!(parsed, ScriptComponent::new("spin.rhai"));
}

#[test]
fn false_background_is_omitted() {
    let v = serde_json::to_value(EntityDocument::default()).unwrap();
    assert_eq!(v, serde_json::json!({}));
}

#[test]
fn both_bindings_are_rejected() {
    let err = SceneDocument::from_json_str(
        r#"{ "entities": [ {
            "ScriptComponent": { "scriptPath": "a.rhai" },
            "CppScriptComponent": { "source_path": "a.rs" }
        } ] }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("entities[0]"));
}

#[test]
fn inverted_window_is_rejected() {
    assert!(
        SceneDocument::from_json_str(
            r#"{ "entities": [ { "AnimationComponent": { "entryTime": 2, "exitTime": 1 } } ] }"#
        )
        .is_err()
    );
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        SceneDocument::from_json_str("{ nope"),
        Err(SceneError::Serde(_))
    ));
}

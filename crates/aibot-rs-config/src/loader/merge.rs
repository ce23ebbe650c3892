use serde_json::Value;

/// Fold `layer` into `base`. Objects merge key by key; anything else in the
/// layer replaces what was there.
pub(super) fn overlay(base: &mut Value, layer: Value) {
    let Value::Object(layer_map) = layer else {
        *base = layer;
        return;
    };
    if !base.is_object() {
        *base = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(base_map) = base {
        for (key, value) in layer_map {
            overlay(base_map.entry(key).or_insert(Value::Null), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::overlay;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let mut base = json!({ "traces": { "path": "a.json", "lock": true } });
        overlay(&mut base, json!({ "traces": { "path": "b.json" } }));
        assert_eq!(base, json!({ "traces": { "path": "b.json", "lock": true } }));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut base = json!({ "server": "x" });
        overlay(&mut base, json!({ "server": { "bind": "0.0.0.0:1" } }));
        assert_eq!(base, json!({ "server": { "bind": "0.0.0.0:1" } }));
    }
}

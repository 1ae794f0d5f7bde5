use serde_json::Value;

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key and arrays merge index by index; at every other
/// position the overlay value replaces the base value (`null` included).
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            for (idx, value) in overlay_items.iter().enumerate() {
                match base_items.get_mut(idx) {
                    Some(existing) => deep_merge(existing, value),
                    None => base_items.push(value.clone()),
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn overlay_wins_on_scalar_conflict() {
        let mut base = json!({ "type": "wcs", "options": { "version": "2.0.1", "format": "image/tiff" } });
        deep_merge(&mut base, &json!({ "options": { "format": "image/png" } }));
        assert_eq!(
            base,
            json!({ "type": "wcs", "options": { "version": "2.0.1", "format": "image/png" } })
        );
    }

    #[test]
    fn arrays_merge_by_index() {
        let mut base = json!({ "bbox": [0, 0, 10, 10] });
        deep_merge(&mut base, &json!({ "bbox": [1, 2] }));
        assert_eq!(base, json!({ "bbox": [1, 2, 10, 10] }));

        let mut short = json!([1]);
        deep_merge(&mut short, &json!([5, 6, 7]));
        assert_eq!(short, json!([5, 6, 7]));
    }

    #[test]
    fn type_change_replaces_subtree() {
        let mut base = json!({ "auth": { "user": "a" } });
        deep_merge(&mut base, &json!({ "auth": null }));
        assert_eq!(base, json!({ "auth": null }));
    }
}

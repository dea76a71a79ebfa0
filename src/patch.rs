//! Deep patching of nested setting values.
//!
//! A detail path addresses a location inside an object- or array-valued
//! setting. Writes at that location must not disturb sibling keys, and
//! deletes must prune containers that become empty so that a fully cleared
//! setting reads back as unset rather than as `{}`.

use serde_json::Value;

/// Apply a write at `path` inside a possibly absent root.
///
/// `value = Some(..)` sets the value at the path, materializing missing
/// intermediate containers as empty objects. `value = None` deletes the
/// value at the path, then removes any container that became empty on the
/// way back up; if the root itself empties, `None` is returned so the
/// setting is unset entirely.
///
/// Deleting a path that does not exist returns the root unchanged. An empty
/// path replaces the root with `value`.
pub fn set_detail_value(root: Option<Value>, path: &[String], value: Option<Value>) -> Option<Value> {
    let Some((head, rest)) = path.split_first() else {
        return value;
    };
    match value {
        Some(_) => {
            let mut sure_root = root.unwrap_or_else(|| Value::Object(Default::default()));
            match &mut sure_root {
                Value::Object(map) => {
                    if rest.is_empty() {
                        map.insert(head.clone(), value.unwrap_or(Value::Null));
                    } else {
                        let child = map.remove(head);
                        if let Some(patched) = set_detail_value(child, rest, value) {
                            map.insert(head.clone(), patched);
                        }
                    }
                    Some(sure_root)
                }
                Value::Array(items) => match head.parse::<usize>() {
                    Ok(index) if index < items.len() => {
                        if rest.is_empty() {
                            items[index] = value.unwrap_or(Value::Null);
                        } else {
                            let child = std::mem::replace(&mut items[index], Value::Null);
                            items[index] =
                                set_detail_value(Some(child), rest, value).unwrap_or(Value::Null);
                        }
                        Some(sure_root)
                    }
                    // Out-of-range or non-numeric segments on an array leave it untouched.
                    _ => Some(sure_root),
                },
                // A scalar at an intermediate position is replaced by a fresh object.
                _ => set_detail_value(None, path, value),
            }
        }
        None => delete_detail_value(root?, path).0,
    }
}

/// Delete at `path`, reporting whether anything was actually removed.
///
/// Containers are only pruned along a path where a removal happened, so a
/// delete of a missing path hands the root back untouched even when it was
/// already an empty container.
fn delete_detail_value(mut root: Value, path: &[String]) -> (Option<Value>, bool) {
    let Some((head, rest)) = path.split_first() else {
        return (None, true);
    };
    match &mut root {
        Value::Object(map) => {
            let mut removed = false;
            if rest.is_empty() {
                removed = map.remove(head).is_some();
            } else if let Some(child) = map.remove(head) {
                let (kept, child_removed) = delete_detail_value(child, rest);
                removed = child_removed;
                match kept {
                    Some(kept) if !(child_removed && container_is_empty(&kept)) => {
                        map.insert(head.clone(), kept);
                    }
                    _ => {}
                }
            }
            if removed && map.is_empty() {
                (None, true)
            } else {
                (Some(root), removed)
            }
        }
        Value::Array(items) => {
            let mut removed = false;
            if let Ok(index) = head.parse::<usize>() {
                if index < items.len() {
                    if rest.is_empty() {
                        items.remove(index);
                        removed = true;
                    } else {
                        let child = std::mem::replace(&mut items[index], Value::Null);
                        let (kept, child_removed) = delete_detail_value(child, rest);
                        removed = child_removed;
                        match kept {
                            Some(kept) if !(child_removed && container_is_empty(&kept)) => {
                                items[index] = kept;
                            }
                            _ => {
                                items.remove(index);
                            }
                        }
                    }
                }
            }
            if removed && items.is_empty() {
                (None, true)
            } else {
                (Some(root), removed)
            }
        }
        _ => (Some(root), false),
    }
}

/// Project a value down through a detail path by sequential key/index lookup.
///
/// A missing intermediate key yields `None`, never an error.
pub fn get_detail_value<'a>(root: Option<&'a Value>, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root?, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// A container value with no remaining children.
///
/// Scalars are never considered empty; only a drained object or array
/// qualifies for pruning.
fn container_is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_depth_one() {
        let root = json!({"a": 1});
        let result = set_detail_value(Some(root), &path(&["b"]), Some(json!(2)));
        assert_eq!(result, Some(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_set_into_undefined_root() {
        let result = set_detail_value(None, &path(&["x", "y"]), Some(json!(5)));
        assert_eq!(result, Some(json!({"x": {"y": 5}})));
    }

    #[test]
    fn test_set_materializes_intermediates() {
        let root = json!({"keep": true});
        let result = set_detail_value(Some(root), &path(&["a", "b", "c"]), Some(json!("v")));
        assert_eq!(result, Some(json!({"keep": true, "a": {"b": {"c": "v"}}})));
    }

    #[test]
    fn test_set_preserves_siblings_at_each_depth() {
        let root = json!({"a": {"b": {"c": 1, "d": 2}, "e": 3}, "f": 4});
        let result = set_detail_value(Some(root), &path(&["a", "b", "c"]), Some(json!(9)));
        assert_eq!(
            result,
            Some(json!({"a": {"b": {"c": 9, "d": 2}, "e": 3}, "f": 4}))
        );
    }

    #[test]
    fn test_set_round_trip() {
        let root = json!({"x": {"y": {"z": 0}}});
        let p = path(&["x", "y", "z"]);
        let patched = set_detail_value(Some(root), &p, Some(json!([1, 2])));
        let read = get_detail_value(patched.as_ref(), &p);
        assert_eq!(read, Some(&json!([1, 2])));
    }

    #[test]
    fn test_empty_path_replaces_root() {
        assert_eq!(
            set_detail_value(Some(json!({"a": 1})), &[], Some(json!(7))),
            Some(json!(7))
        );
        assert_eq!(set_detail_value(Some(json!({"a": 1})), &[], None), None);
    }

    #[test]
    fn test_delete_leaf_keeps_nonempty_parent() {
        let root = json!({"x": {"y": 5, "z": 6}});
        let result = set_detail_value(Some(root), &path(&["x", "y"]), None);
        assert_eq!(result, Some(json!({"x": {"z": 6}})));
    }

    #[test]
    fn test_delete_prunes_emptied_parent() {
        let root = json!({"x": {"y": 5}, "w": 1});
        let result = set_detail_value(Some(root), &path(&["x", "y"]), None);
        assert_eq!(result, Some(json!({"w": 1})));
    }

    #[test]
    fn test_delete_prunes_emptied_grandparent() {
        let root = json!({"a": {"b": {"c": 1}}});
        let result = set_detail_value(Some(root), &path(&["a", "b", "c"]), None);
        assert_eq!(result, None);
    }

    #[test]
    fn test_delete_is_inverse_of_set_from_empty() {
        let p = path(&["a", "b", "c", "d"]);
        let set = set_detail_value(None, &p, Some(json!(true)));
        let deleted = set_detail_value(set, &p, None);
        assert_eq!(deleted, None);
    }

    #[test]
    fn test_delete_missing_path_is_noop() {
        let root = json!({"a": 1});
        let result = set_detail_value(Some(root.clone()), &path(&["b", "c"]), None);
        assert_eq!(result, Some(root));
        assert_eq!(set_detail_value(None, &path(&["b"]), None), None);
    }

    #[test]
    fn test_delete_missing_path_keeps_empty_containers() {
        let result = set_detail_value(Some(json!({})), &path(&["a"]), None);
        assert_eq!(result, Some(json!({})));
        let result = set_detail_value(Some(json!([])), &path(&["0"]), None);
        assert_eq!(result, Some(json!([])));
        let root = json!({"x": {}});
        let result = set_detail_value(Some(root.clone()), &path(&["x", "y"]), None);
        assert_eq!(result, Some(root));
    }

    #[test]
    fn test_delete_array_element() {
        let root = json!({"list": ["a", "b"]});
        let result = set_detail_value(Some(root), &path(&["list", "0"]), None);
        assert_eq!(result, Some(json!({"list": ["b"]})));
    }

    #[test]
    fn test_delete_last_array_element_prunes() {
        let root = json!({"list": ["a"]});
        let result = set_detail_value(Some(root), &path(&["list", "0"]), None);
        assert_eq!(result, None);
    }

    #[test]
    fn test_set_array_element() {
        let root = json!([1, 2, 3]);
        let result = set_detail_value(Some(root), &path(&["1"]), Some(json!(9)));
        assert_eq!(result, Some(json!([1, 9, 3])));
    }

    #[test]
    fn test_get_through_arrays_and_objects() {
        let root = json!({"a": [{"b": 2}]});
        assert_eq!(
            get_detail_value(Some(&root), &path(&["a", "0", "b"])),
            Some(&json!(2))
        );
        assert_eq!(get_detail_value(Some(&root), &path(&["a", "1", "b"])), None);
        assert_eq!(get_detail_value(Some(&root), &path(&["missing"])), None);
        assert_eq!(get_detail_value(None, &path(&["a"])), None);
    }
}

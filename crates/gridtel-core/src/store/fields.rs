// ── Value flattening ──
//
// Devices deliver the same leaf either as a scalar at a deep path or
// nested inside a container at a shallower one. Flattening both shapes
// into slash-joined relative keys lets field extraction ignore the
// difference.

use crate::decode::{PathSegment, TelemetryValue, local_name};

/// Leaf values keyed by their path relative to an anchor segment.
#[derive(Debug, Default)]
pub(crate) struct Fields<'a> {
    entries: Vec<(String, &'a TelemetryValue)>,
}

impl<'a> Fields<'a> {
    /// Flatten `value` beneath the local names of `tail`.
    ///
    /// Lists of containers are flattened element by element under the
    /// same key; scalar leaf-lists stay whole.
    pub(crate) fn collect(tail: &[PathSegment], value: &'a TelemetryValue) -> Self {
        let prefix = tail
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let mut entries = Vec::new();
        flatten_into(&prefix, value, &mut entries);
        Self { entries }
    }

    /// Value at exactly `key`.
    pub(crate) fn get(&self, key: &str) -> Option<&'a TelemetryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// First value whose key ends with `suffix` on a segment boundary.
    pub(crate) fn find_suffix(&self, suffix: &str) -> Option<&'a TelemetryValue> {
        self.all_suffix(suffix).next()
    }

    /// Every value whose key ends with `suffix` on a segment boundary.
    pub(crate) fn all_suffix<'s>(
        &'s self,
        suffix: &'s str,
    ) -> impl Iterator<Item = &'a TelemetryValue> + 's {
        self.entries
            .iter()
            .filter(move |(k, _)| has_suffix(k, suffix))
            .map(|(_, v)| *v)
    }
}

fn has_suffix(key: &str, suffix: &str) -> bool {
    key.strip_suffix(suffix)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('/'))
}

fn flatten_into<'a>(
    prefix: &str,
    value: &'a TelemetryValue,
    out: &mut Vec<(String, &'a TelemetryValue)>,
) {
    match value {
        TelemetryValue::Map(members) => {
            for (key, member) in members {
                let name = local_name(key);
                let path = if prefix.is_empty() {
                    name.to_owned()
                } else {
                    format!("{prefix}/{name}")
                };
                flatten_into(&path, member, out);
            }
        }
        TelemetryValue::List(items) if items.iter().any(|item| !item.is_scalar()) => {
            for item in items {
                flatten_into(prefix, item, out);
            }
        }
        _ => out.push((prefix.to_owned(), value)),
    }
}

/// The entries of a keyless container: list items, or the value itself.
/// A wrapper member named `list_name` is unwrapped first.
pub(crate) fn list_entries<'a>(value: &'a TelemetryValue, list_name: &str) -> Vec<&'a TelemetryValue> {
    let value = value.get(list_name).unwrap_or(value);
    match value {
        TelemetryValue::List(items) => items.iter().collect(),
        TelemetryValue::Map(_) => vec![value],
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decode::DecodedPath;

    #[test]
    fn nested_and_flat_shapes_produce_the_same_key() {
        let nested_path = DecodedPath::parse("/platform/control[slot=A]/cpu[index=all]").unwrap();
        let nested = TelemetryValue::from(serde_json::json!({"total": {"instant": 4}}));
        let flat_path = DecodedPath::parse("/platform/control[slot=A]/cpu[index=all]/total/instant").unwrap();
        let flat = TelemetryValue::Uint(4);

        let a = Fields::collect(nested_path.segments(), &nested);
        let b = Fields::collect(flat_path.segments(), &flat);
        assert_eq!(a.find_suffix("cpu/total/instant").and_then(TelemetryValue::as_u64), Some(4));
        assert_eq!(b.find_suffix("cpu/total/instant").and_then(TelemetryValue::as_u64), Some(4));
    }

    #[test]
    fn suffix_matches_whole_segments_only() {
        let value = TelemetryValue::from(serde_json::json!({"average-15": 1, "xtotal": 2}));
        let fields = Fields::collect(&[], &value);
        assert!(fields.find_suffix("total").is_none());
        assert!(fields.find_suffix("average-15").is_some());
    }

    #[test]
    fn container_lists_flatten_under_one_key() {
        let value = TelemetryValue::from(serde_json::json!({
            "ipv4": {"address": [{"ip-prefix": "10.0.0.1/31"}, {"ip-prefix": "10.0.0.5/31"}]}
        }));
        let fields = Fields::collect(&[], &value);
        let prefixes: Vec<_> = fields
            .all_suffix("ip-prefix")
            .filter_map(TelemetryValue::as_str)
            .collect();
        assert_eq!(prefixes, ["10.0.0.1/31", "10.0.0.5/31"]);
    }

    #[test]
    fn module_qualified_members_are_localized() {
        let value = TelemetryValue::from(serde_json::json!({
            "srl_nokia-interfaces:statistics": {"in-octets": "10"}
        }));
        let fields = Fields::collect(&[], &value);
        assert!(fields.get("statistics/in-octets").is_some());
    }

    #[test]
    fn list_entries_unwraps_named_container() {
        let wrapped = TelemetryValue::from(serde_json::json!({"neighbor": [{"a": 1}, {"a": 2}]}));
        assert_eq!(list_entries(&wrapped, "neighbor").len(), 2);
        let single = TelemetryValue::from(serde_json::json!({"a": 1}));
        assert_eq!(list_entries(&single, "neighbor").len(), 1);
        assert!(list_entries(&TelemetryValue::Uint(1), "neighbor").is_empty());
    }
}

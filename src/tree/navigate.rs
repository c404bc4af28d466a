//! Safe traversal of vendor metadata trees.
//!
//! Vendor trees are inconsistent: branches go missing, and a collection with
//! a single element is often stored as the bare element instead of a list.
//! These helpers absorb both so extractors never branch on node shape.

use super::RawNode;

/// Walk nested map lookups along `keys`.
///
/// Returns `None` as soon as a node on the path is not a map holding the next
/// key, and when the node reached is [`RawNode::Absent`]. An empty path
/// returns `node` itself.
pub fn path_get<'a>(node: &'a RawNode, keys: &[&str]) -> Option<&'a RawNode> {
    let mut current = node;
    for key in keys {
        current = current.as_map()?.get(key)?;
    }
    (!current.is_absent()).then_some(current)
}

/// Normalize a node that may be one map, a list of maps or nothing into a
/// list of maps.
///
/// Non-map items inside a sequence are skipped, so applying `as_list` to
/// each element of a result gives that element back unchanged.
pub fn as_list(node: Option<&RawNode>) -> Vec<&RawNode> {
    match node {
        Some(map @ RawNode::Map(_)) => vec![map],
        Some(RawNode::Seq(items)) => items
            .iter()
            .filter(|item| matches!(item, RawNode::Map(_)))
            .collect(),
        _ => Vec::new(),
    }
}

/// All nodes stored under `tag` anywhere below `node`, depth first in
/// document order. Sequences under the tag are flattened.
pub fn descendants<'a>(node: &'a RawNode, tag: &str) -> Vec<&'a RawNode> {
    let mut found = Vec::new();
    collect_descendants(node, tag, &mut found);
    found
}

fn collect_descendants<'a>(node: &'a RawNode, tag: &str, found: &mut Vec<&'a RawNode>) {
    match node {
        RawNode::Map(map) => {
            for (key, child) in map.iter() {
                if key == tag {
                    match child {
                        RawNode::Seq(items) => found.extend(items.iter()),
                        other => found.push(other),
                    }
                }
                collect_descendants(child, tag, found);
            }
        }
        RawNode::Seq(items) => {
            for item in items {
                collect_descendants(item, tag, found);
            }
        }
        _ => {}
    }
}

/// Text of the node at `keys`, with empty strings treated as absent.
pub fn text_at(node: &RawNode, keys: &[&str]) -> Option<String> {
    let text = path_get(node, keys)?.as_text()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Text of an XML attribute (stored under `@name`) on a map node.
pub fn attr(node: &RawNode, name: &str) -> Option<String> {
    let key = format!("@{name}");
    text_at(node, &[key.as_str()])
}

/// First non-empty `@name` attribute carried by `node` or any node below
/// it, depth first in document order.
pub fn find_attr(node: &RawNode, name: &str) -> Option<String> {
    let key = format!("@{name}");
    find_attr_key(node, &key)
}

fn find_attr_key(node: &RawNode, key: &str) -> Option<String> {
    match node {
        RawNode::Map(map) => {
            let own = map
                .get(key)
                .and_then(RawNode::as_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            own.or_else(|| map.iter().find_map(|(_, child)| find_attr_key(child, key)))
        }
        RawNode::Seq(items) => items.iter().find_map(|item| find_attr_key(item, key)),
        _ => None,
    }
}

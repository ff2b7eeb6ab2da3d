//! Override-wins configuration inheritance.

use std::collections::BTreeMap;

/// Merges a child config with its parent.
///
/// Set child values win, unset ones fall back to the parent, string maps
/// merge key-wise with child entries winning, and lists are replaced
/// wholesale. Neither side is mutated, and inheriting the same parent twice
/// changes nothing: `c.inherit(p).inherit(p) == c.inherit(p)`.
pub trait Inherit {
    /// Returns `self` completed with the values of `parent`.
    fn inherit(&self, parent: &Self) -> Self;
}

pub(crate) fn inherit_property<T: Clone>(child: &Option<T>, parent: &Option<T>) -> Option<T> {
    child.as_ref().or(parent.as_ref()).cloned()
}

pub(crate) fn inherit_config<T: Inherit + Clone>(
    child: &Option<T>,
    parent: &Option<T>,
) -> Option<T> {
    match (child, parent) {
        (Some(child), Some(parent)) => Some(child.inherit(parent)),
        (Some(child), None) => Some(child.clone()),
        (None, parent) => parent.clone(),
    }
}

pub(crate) fn inherit_map(
    child: &Option<BTreeMap<String, String>>,
    parent: &Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    match (child, parent) {
        (Some(child), Some(parent)) => {
            let mut merged = parent.clone();
            merged.extend(child.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
        (child, parent) => inherit_property(child, parent),
    }
}

// Empty counts as unset.
pub(crate) fn inherit_list<T: Clone>(child: &[T], parent: &[T]) -> Vec<T> {
    if child.is_empty() {
        parent.to_vec()
    } else {
        child.to_vec()
    }
}

pub(crate) fn inherit_optional_list<T: Clone>(
    child: &Option<Vec<T>>,
    parent: &Option<Vec<T>>,
) -> Option<Vec<T>> {
    match (child, parent) {
        (Some(child), _) if !child.is_empty() => Some(child.clone()),
        (_, Some(parent)) if !parent.is_empty() => Some(parent.clone()),
        (child, _) => child.clone(),
    }
}

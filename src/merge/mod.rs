//! Template merge engine.
//!
//! Reconciles a role baseline (base tree) with a device-specific override tree:
//!
//! - mapping + mapping: merged key by key, base key order first, new override keys appended
//! - sequence + sequence: reconciled by identity key (see [`IdentityKeys`]), or replaced
//!   wholesale when the override elements carry no recognizable identity
//! - anything else: the override value wins, type changes included
//!
//! The engine never fails and never touches its inputs; every call returns a
//! freshly built tree, so one parsed template can serve any number of devices.

pub mod identity;

use std::collections::HashMap;

use crate::models::{Mapping, Node, Scalar};

pub use identity::{IdentityKeys, DEFAULT_IDENTITY_KEYS};

/// Merge two trees with the default identity registry
pub fn deep_merge(base: &Node, overlay: &Node) -> Node {
    MergeEngine::default().merge(base, overlay)
}

/// Recursive base/override reconciliation
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    identity: IdentityKeys,
}

/// Hashable view of a scalar identity value. Null and container values never match.
#[derive(Debug, PartialEq, Eq, Hash)]
enum IdentityValue<'a> {
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a str),
}

fn identity_value(node: &Node) -> Option<IdentityValue<'_>> {
    match node.as_scalar()? {
        Scalar::Null => None,
        Scalar::Bool(b) => Some(IdentityValue::Bool(*b)),
        Scalar::Int(i) => Some(IdentityValue::Int(*i)),
        // -0.0 and 0.0 are the same identity
        Scalar::Float(f) => Some(IdentityValue::Float(if *f == 0.0 { 0 } else { f.to_bits() })),
        Scalar::String(s) => Some(IdentityValue::Str(s)),
    }
}

impl MergeEngine {
    pub fn new(identity: IdentityKeys) -> Self {
        Self { identity }
    }

    pub fn identity_keys(&self) -> &IdentityKeys {
        &self.identity
    }

    /// Merge `overlay` onto `base` and return the result as a new tree.
    ///
    /// Only two mappings are merged; for any other pair of inputs the overlay
    /// replaces the base.
    pub fn merge(&self, base: &Node, overlay: &Node) -> Node {
        match (base, overlay) {
            (Node::Mapping(b), Node::Mapping(o)) => Node::Mapping(self.merge_mappings(b, o)),
            _ => overlay.clone(),
        }
    }

    pub fn merge_mappings(&self, base: &Mapping, overlay: &Mapping) -> Mapping {
        let mut merged = Mapping::with_capacity(base.len() + overlay.len());

        for (key, base_value) in base.iter() {
            let value = match overlay.get(key) {
                Some(over) => self.merge_values(key, base_value, over),
                None => base_value.clone(),
            };
            merged.insert(key, value);
        }

        for (key, value) in overlay.iter() {
            if !base.contains_key(key) {
                merged.insert(key, value.clone());
            }
        }

        merged
    }

    fn merge_values(&self, key: &str, base: &Node, overlay: &Node) -> Node {
        match (base, overlay) {
            (Node::Mapping(b), Node::Mapping(o)) => Node::Mapping(self.merge_mappings(b, o)),
            (Node::Sequence(b), Node::Sequence(o)) => Node::Sequence(self.merge_sequences(b, o)),
            _ => {
                if base.kind() != overlay.kind() {
                    tracing::trace!(
                        "Key '{}' changes from {} to {}",
                        key,
                        base.kind(),
                        overlay.kind()
                    );
                }
                overlay.clone()
            }
        }
    }

    /// Reconcile two sequences.
    ///
    /// - empty overlay: base is kept as is
    /// - no identity key on the overlay's first element: overlay replaces base
    /// - otherwise base order is kept, matched records are merged in place and
    ///   the remaining overlay elements are appended in overlay order
    pub fn merge_sequences(&self, base: &[Node], overlay: &[Node]) -> Vec<Node> {
        let Some(first) = overlay.first() else {
            return base.to_vec();
        };

        let Some(id_key) = self.identity.select(first) else {
            tracing::trace!("No identity key on sequence, replacing {} base items", base.len());
            return overlay.to_vec();
        };

        // Overlay items in overlay order, flagged keyed/keyless. A keyed slot is
        // emptied once merged into a base item.
        let mut pending: Vec<(Option<&Node>, bool)> = Vec::with_capacity(overlay.len());
        let mut index: HashMap<IdentityValue<'_>, usize> = HashMap::new();

        for item in overlay {
            match item.get(id_key).and_then(identity_value) {
                Some(id) => match index.get(&id).copied() {
                    // Duplicate identity: last one wins, position of the first is kept
                    Some(slot) => pending[slot].0 = Some(item),
                    None => {
                        index.insert(id, pending.len());
                        pending.push((Some(item), true));
                    }
                },
                // No usable identity: appended on its own
                None => pending.push((Some(item), false)),
            }
        }

        let mut merged = Vec::with_capacity(base.len() + pending.len());
        let mut matched = 0usize;

        for item in base {
            let over = item
                .get(id_key)
                .and_then(identity_value)
                .and_then(|id| index.remove(&id))
                .and_then(|slot| pending[slot].0.take());

            match over {
                Some(over) => {
                    matched += 1;
                    merged.push(self.merge(item, over));
                }
                None => merged.push(item.clone()),
            }
        }

        let before = merged.len();
        for (item, keyed) in pending {
            let Some(item) = item else { continue };
            // Keyless items already present verbatim in the base are not repeated
            if keyed || !base.contains(item) {
                merged.push(item.clone());
            }
        }

        tracing::trace!(
            "Merged sequence on '{}': {} matched, {} appended",
            id_key,
            matched,
            merged.len() - before
        );

        merged
    }
}

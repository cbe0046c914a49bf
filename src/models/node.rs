use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use indexmap::IndexMap;
use std::fmt;

/// Scalar leaf value of a config tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered string-keyed map. Keys are unique and keep their first insertion position.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, Node>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    /// Insert a value. An existing key is overwritten in place and its old value returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, shifting later entries down to keep order.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// Key order is part of the rendered output, so it takes part in equality
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

/// Generic config tree node: a scalar, an ordered mapping or an ordered sequence.
///
/// Equality is structural and order-sensitive for mappings, since key order is
/// part of the rendered output.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Mapping(Mapping),
    Sequence(Vec<Node>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Mapping(Mapping::new())
    }
}

impl Node {
    pub const NULL: Node = Node::Scalar(Scalar::Null);

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Look up a key when this node is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Short name of the node kind, for log output
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<Mapping> for Node {
    fn from(m: Mapping) -> Self {
        Node::Mapping(m)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(items: Vec<T>) -> Self {
        Node::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Scalar(Scalar::Int(n))
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Scalar(Scalar::Int(n.into()))
    }
}

impl From<u32> for Node {
    fn from(n: u32) -> Self {
        Node::Scalar(Scalar::Int(n.into()))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Scalar(Scalar::Float(f))
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Node::NULL)
    }
}

// --- serde_json interop ---

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::NULL,
            Value::Bool(b) => b.into(),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Int(i)),
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => s.into(),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Mapping(map.into_iter().collect()),
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(node: Node) -> Self {
        use serde_json::Value;
        match node {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            Node::Scalar(Scalar::Int(i)) => Value::from(i),
            // Non-finite floats have no JSON form
            Node::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Scalar(Scalar::String(s)) => Value::String(s),
            Node::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Node::Mapping(m) => Value::Object(
                m.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

// --- serde ---

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Scalar(s) => s.serialize(serializer),
            Node::Mapping(m) => m.serialize(serializer),
            Node::Sequence(items) => serializer.collect_seq(items),
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar, a string-keyed mapping or a sequence")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(v.into())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(v.into())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => Node::Scalar(Scalar::Int(i)),
            Err(_) => Node::Scalar(Scalar::Float(v as f64)),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(v.into())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(v.into())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(v.into())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut mapping = Mapping::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            mapping.insert(key, value);
        }
        Ok(Node::Mapping(mapping))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_insert_keeps_position() {
        let mut m = Mapping::new();
        m.insert("a", 1);
        m.insert("b", 2);
        let old = m.insert("a", 3);

        assert_eq!(old, Some(Node::from(1)));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(&Node::from(3)));
    }

    #[test]
    fn test_mapping_equality_is_order_sensitive() {
        let ab: Mapping = vec![("a", 1), ("b", 2)].into_iter().collect();
        let ba: Mapping = vec![("b", 2), ("a", 1)].into_iter().collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn test_wide_mapping_lookup() {
        let wide: Mapping = (0..50_000).map(|i| (format!("k{}", i), i as i64)).collect();
        assert_eq!(wide.len(), 50_000);
        assert_eq!(wide.get("k49999"), Some(&Node::from(49_999i64)));
        assert_eq!(wide.keys().nth(10), Some("k10"));
    }

    #[test]
    fn test_mapping_remove_shifts() {
        let mut m: Mapping = vec![("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(m.remove("b"), Some(Node::from(2)));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(m.remove("missing"), None);
    }

    #[test]
    fn test_from_json_preserves_key_order() {
        let node = Node::from(json!({"zeta": 1, "alpha": {"y": true, "x": null}}));
        let m = node.as_mapping().unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        let inner = node.get("alpha").unwrap().as_mapping().unwrap();
        assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["y", "x"]);
        assert!(inner.get("x").unwrap().is_null());
    }

    #[test]
    fn test_json_number_kinds() {
        assert_eq!(Node::from(json!(7)), Node::Scalar(Scalar::Int(7)));
        assert_eq!(Node::from(json!(1.5)), Node::Scalar(Scalar::Float(1.5)));
        assert_eq!(
            Node::from(json!(u64::MAX)),
            Node::Scalar(Scalar::Float(u64::MAX as f64))
        );
    }

    #[test]
    fn test_yaml_deserialize_keeps_order_and_types() {
        let doc = "hostname: leaf1\nmtu: 9000\nratio: 0.5\nenabled: false\ntags:\n  - a\n  - b\nnothing: ~\n";
        let node: Node = serde_yaml::from_str(doc).unwrap();
        let m = node.as_mapping().unwrap();
        assert_eq!(
            m.keys().collect::<Vec<_>>(),
            vec!["hostname", "mtu", "ratio", "enabled", "tags", "nothing"]
        );
        assert_eq!(node.get("mtu"), Some(&Node::from(9000)));
        assert_eq!(node.get("ratio"), Some(&Node::from(0.5)));
        assert_eq!(node.get("enabled"), Some(&Node::from(false)));
        assert_eq!(node.get("tags"), Some(&Node::from(vec!["a", "b"])));
        assert!(node.get("nothing").unwrap().is_null());
    }

    #[test]
    fn test_serialize_to_json_string_in_order() {
        let node = Node::from(json!({"b": [1, "two"], "a": null}));
        let out = serde_json::to_string(&node).unwrap();
        assert_eq!(out, r#"{"b":[1,"two"],"a":null}"#);
    }

    #[test]
    fn test_value_conversion_drops_non_finite_float() {
        let value = serde_json::Value::from(Node::from(f64::INFINITY));
        assert_eq!(value, serde_json::Value::Null);
    }

    #[test]
    fn test_option_into_node() {
        assert!(Node::from(None::<String>).is_null());
        assert_eq!(Node::from(Some("x")), Node::from("x"));
    }
}

//! Document, id and collection path helpers shared by every stage.

use mongodb::bson::{Bson, Document};

/// Name of the identifying key of every document.
pub const ID_FIELD: &str = "_id";

/// Identifying key of a document (the `_id` value).
pub type DocumentId = Bson;

/// Query predicate in MongoDB syntax. An empty document matches everything.
pub type Filter = Document;

/// Returns the id of a document, or `Bson::Null` when `_id` is absent.
#[must_use]
pub fn document_id(doc: &Document) -> DocumentId {
    doc.get(ID_FIELD).cloned().unwrap_or(Bson::Null)
}

/// Compares two BSON values, treating all numeric types as numbers.
///
/// `Int32(1)`, `Int64(1)` and `Double(1.0)` are equal. Documents and arrays
/// are compared element-wise with the same rule.
#[must_use]
pub fn bson_eq(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| bson_eq(v, other)))
        }
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| bson_eq(v, w))
        }
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Hashable form of a document id with exact equality.
///
/// Integers of either width compare by value, and a `Double` joins them
/// only when it holds an exact integer. Subdocuments compare field by field
/// in order, as the server does for `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdKey {
    /// `Int32`, `Int64` or an integral `Double`.
    Int(i64),
    /// Bit pattern of a non-integral `Double`.
    Float(u64),
    /// A string id.
    Str(String),
    /// Fields in document order.
    Doc(Vec<(String, IdKey)>),
    /// Array elements in order.
    Array(Vec<IdKey>),
    /// Any other BSON type, keyed by its debug form (which names the type).
    Other(String),
}

impl IdKey {
    /// Builds the key for an id value.
    #[must_use]
    pub fn new(id: &Bson) -> Self {
        match id {
            Bson::Int32(i) => IdKey::Int(i64::from(*i)),
            Bson::Int64(i) => IdKey::Int(*i),
            Bson::Double(f) => match exact_i64(*f) {
                Some(i) => IdKey::Int(i),
                None => IdKey::Float(f.to_bits()),
            },
            Bson::String(s) => IdKey::Str(s.clone()),
            Bson::Document(d) => {
                IdKey::Doc(d.iter().map(|(k, v)| (k.clone(), IdKey::new(v))).collect())
            }
            Bson::Array(items) => IdKey::Array(items.iter().map(IdKey::new).collect()),
            other => IdKey::Other(format!("{:?}", other)),
        }
    }
}

/// Returns true if two ids name the same document.
#[must_use]
pub fn id_eq(a: &Bson, b: &Bson) -> bool {
    IdKey::new(a) == IdKey::new(b)
}

/// The integer a double holds exactly, if any. `-0.0` maps to 0.
fn exact_i64(f: f64) -> Option<i64> {
    // 2^63 as f64; the range is half-open because i64::MAX rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f)).then(|| f as i64)
}

/// Numeric view of a BSON value.
pub(crate) fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

/// Checks that a dotted collection path can be resolved by a store.
///
/// Rejects empty paths, empty segments (`a..b`, leading or trailing dots)
/// and the characters `$` and NUL.
pub fn validate_collection_path(path: &str) -> std::result::Result<(), String> {
    if path.is_empty() {
        return Err("collection path is empty".to_string());
    }
    if path.split('.').any(str::is_empty) {
        return Err(format!("collection path '{}' has an empty segment", path));
    }
    if let Some(c) = path.chars().find(|c| *c == '$' || *c == '\0') {
        return Err(format!(
            "collection path '{}' contains forbidden character {:?}",
            path, c
        ));
    }
    Ok(())
}

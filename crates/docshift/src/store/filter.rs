//! Filter evaluation for the in-memory store.
//!
//! Supports the subset of MongoDB query syntax useful for selecting
//! documents to replicate: field equality (with dotted paths), the
//! comparison operators `$eq $ne $gt $gte $lt $lte $in $nin $exists`, and
//! the logical operators `$and $or $nor`.
//!
//! Equality, `$in` and their negations also match an array field that
//! contains the value. Range operators compare the field as a whole.

use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

use crate::document::{as_f64, bson_eq};

/// Checks that every operator used in `filter` is supported.
pub fn check_supported(filter: &Document) -> std::result::Result<(), String> {
    for (key, cond) in filter {
        match key.as_str() {
            "$and" | "$or" | "$nor" => {
                let clauses = clause_list(key, cond)?;
                for clause in clauses {
                    check_supported(clause)?;
                }
            }
            k if k.starts_with('$') => return Err(format!("unsupported operator '{}'", k)),
            _ => {
                if let Bson::Document(ops) = cond {
                    if is_operator_doc(ops) {
                        for op in ops.keys() {
                            if !COMPARISON_OPS.contains(&op.as_str()) {
                                return Err(format!("unsupported operator '{}'", op));
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

const COMPARISON_OPS: &[&str] = &[
    "$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$exists",
];

fn clause_list<'a>(key: &str, cond: &'a Bson) -> std::result::Result<Vec<&'a Document>, String> {
    match cond {
        Bson::Array(items) => items
            .iter()
            .map(|item| match item {
                Bson::Document(d) => Ok(d),
                _ => Err(format!("'{}' clauses must be documents", key)),
            })
            .collect(),
        _ => Err(format!("'{}' expects an array", key)),
    }
}

fn is_operator_doc(doc: &Document) -> bool {
    doc.keys().next().is_some_and(|k| k.starts_with('$'))
}

/// Returns true if `doc` satisfies `filter`. Unsupported operators never match.
#[must_use]
pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, cond)| match key.as_str() {
        "$and" => clause_list(key, cond).is_ok_and(|c| c.iter().all(|f| matches(doc, f))),
        "$or" => clause_list(key, cond).is_ok_and(|c| c.iter().any(|f| matches(doc, f))),
        "$nor" => clause_list(key, cond).is_ok_and(|c| !c.iter().any(|f| matches(doc, f))),
        k if k.starts_with('$') => false,
        path => {
            let value = lookup(doc, path);
            match cond {
                Bson::Document(ops) if is_operator_doc(ops) => {
                    ops.iter().all(|(op, arg)| apply_operator(value, op, arg))
                }
                expected => eq_match(value, expected),
            }
        }
    })
}

/// Resolves a dotted field path inside a document.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(d) => d.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Equality against a field, or against any element when the field is an array.
fn eq_match(value: Option<&Bson>, expected: &Bson) -> bool {
    value.is_some_and(|v| {
        bson_eq(v, expected)
            || matches!(v, Bson::Array(items) if items.iter().any(|i| bson_eq(i, expected)))
    })
}

fn apply_operator(value: Option<&Bson>, op: &str, arg: &Bson) -> bool {
    match op {
        "$eq" => eq_match(value, arg),
        "$ne" => !eq_match(value, arg),
        "$gt" => compare(value, arg).is_some_and(Ordering::is_gt),
        "$gte" => compare(value, arg).is_some_and(Ordering::is_ge),
        "$lt" => compare(value, arg).is_some_and(Ordering::is_lt),
        "$lte" => compare(value, arg).is_some_and(Ordering::is_le),
        "$in" => match arg {
            Bson::Array(items) => items.iter().any(|i| eq_match(value, i)),
            _ => false,
        },
        "$nin" => match arg {
            Bson::Array(items) => !items.iter().any(|i| eq_match(value, i)),
            _ => false,
        },
        "$exists" => {
            let wanted = !matches!(arg, Bson::Boolean(false) | Bson::Null)
                && as_f64(arg).map_or(true, |n| n != 0.0);
            value.is_some() == wanted
        }
        _ => false,
    }
}

fn compare(value: Option<&Bson>, arg: &Bson) -> Option<Ordering> {
    let value = value?;
    if let (Some(a), Some(b)) = (as_f64(value), as_f64(arg)) {
        return a.partial_cmp(&b);
    }
    match (value, arg) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

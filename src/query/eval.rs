use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use std::cmp::Ordering;

use super::parse::in_values;

use super::types::{
    CmpOp, Filter, ID_FIELD, MAX_IN_SET, MAX_PATH_DEPTH, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS,
    Order, Projection, SortSpec,
};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Cmp { path, op, value, raw } => {
            get_path(doc, path).is_some_and(|v| match v {
                // array fields match when any element does
                Bson::Array(items) if !matches!(value, Bson::Array(_)) || *op == CmpOp::In => {
                    items.iter().any(|item| eval_term(item, *op, value, raw.as_deref()))
                }
                _ => eval_term(v, *op, value, raw.as_deref()),
            })
        }
    }
}

fn eval_term(v: &Bson, op: CmpOp, value: &Bson, raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return eval_cmp(v, op, value);
    };
    if op == CmpOp::In {
        let set: Vec<Bson> = in_values(raw)
            .zip(in_set(value))
            .map(|(text, typed)| read_as_stored(v, text).unwrap_or_else(|| typed.clone()))
            .collect();
        return eval_cmp(v, op, &Bson::Array(set));
    }
    match read_as_stored(v, raw) {
        Some(as_stored) => eval_cmp(v, op, &as_stored),
        None => eval_cmp(v, op, value),
    }
}

fn in_set(value: &Bson) -> impl Iterator<Item = &Bson> {
    match value {
        Bson::Array(set) => set.iter(),
        other => std::slice::from_ref(other).iter(),
    }
}

/// Reads query-string text in the type of the stored value, the way a schema-aware
/// store casts query values. `None` keeps the eagerly coerced value.
fn read_as_stored(stored: &Bson, raw: &str) -> Option<Bson> {
    match stored {
        Bson::String(_) => Some(Bson::String(raw.to_string())),
        Bson::ObjectId(_) => ObjectId::parse_str(raw).ok().map(Bson::ObjectId),
        Bson::DateTime(_) => parse_date(raw).map(Bson::DateTime),
        _ => None,
    }
}

/// RFC 3339 timestamps, or plain `YYYY-MM-DD` dates at midnight UTC.
fn parse_date(raw: &str) -> Option<bson::DateTime> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(bson::DateTime::from_millis(ts.timestamp_millis()));
    }
    let day = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(bson::DateTime::from_millis(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()))
}

fn eval_cmp(v: &Bson, op: CmpOp, value: &Bson) -> bool {
    match op {
        CmpOp::Eq => bson_equal(v, value),
        CmpOp::Gt => same_family(v, value) && compare_bson(v, value) == Ordering::Greater,
        CmpOp::Gte => same_family(v, value) && compare_bson(v, value) != Ordering::Less,
        CmpOp::Lt => same_family(v, value) && compare_bson(v, value) == Ordering::Less,
        CmpOp::Lte => same_family(v, value) && compare_bson(v, value) != Ordering::Greater,
        CmpOp::In => match value {
            Bson::Array(set) => set.iter().take(MAX_IN_SET).any(|x| bson_equal(v, x)),
            other => bson_equal(v, other),
        },
    }
}

/// Range operators only compare values of the same kind (numbers with numbers, ...),
/// as document stores do; `{age: {$gt: "x"}}` never matches a number.
fn same_family(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

fn bson_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_bson(a, b) == Ordering::Equal;
    }
    a == b
}

/// Multi-key comparison, left to right. Missing fields sort before present ones.
pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let va = get_path(a, &s.field);
        let vb = get_path(b, &s.field);
        let ord = match (va, vb) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut segs = path.split('.').peekable();
    let mut depth = 0usize;
    while let Some(seg) = segs.next() {
        depth += 1;
        if depth > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(seg)?;
        if segs.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        (T::DateTime(x), T::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (T::ObjectId(x), T::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (T::Array(x), T::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_bson(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Cross-type sort order; numbers share one rank so mixed numeric fields sort by value.
fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::Symbol(_) | T::String(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) => 12,
        T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 13,
        T::MaxKey => 255,
    }
}

/// Applies an inclusion or exclusion projection. Inclusion keeps `_id` unless told not
/// to; dotted names copy the embedded value into the same nested position.
pub fn apply_projection(doc: &BsonDocument, projection: &Projection) -> BsonDocument {
    match projection {
        Projection::Include { fields, keep_id } => {
            let mut out = BsonDocument::new();
            if *keep_id && let Some(id) = doc.get(ID_FIELD) {
                out.insert(ID_FIELD, id.clone());
            }
            for f in fields.iter().take(MAX_PROJECTION_FIELDS) {
                if let Some(v) = get_path(doc, f) {
                    set_path(&mut out, f, v.clone());
                }
            }
            out
        }
        Projection::Exclude(fields) => {
            let mut out = doc.clone();
            for f in fields.iter().take(MAX_PROJECTION_FIELDS) {
                remove_path(&mut out, f);
            }
            out
        }
    }
}

fn set_path(out: &mut BsonDocument, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            out.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(out.get(head), Some(Bson::Document(_))) {
                out.insert(head, BsonDocument::new());
            }
            if let Some(Bson::Document(inner)) = out.get_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

fn remove_path(out: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            out.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = out.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

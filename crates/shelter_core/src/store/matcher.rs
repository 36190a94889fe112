//! In-process evaluation of a MongoDB query-language subset.
//!
//! # Responsibility
//! - Decide whether a record matches a query filter.
//! - Apply inclusion/exclusion projections.
//! - Apply `$set` field updates and report whether anything changed.
//!
//! # Invariants
//! - Unsupported operators are rejected with `InvalidQuery`, never ignored.
//! - Numeric values compare across int/long/double like the server does.
//! - `_id` is immutable through `$set`.

use super::{StoreError, StoreResult};
use crate::model::record::ID_FIELD;
use bson::{Bson, Document, Regex as BsonRegex};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Returns whether `record` satisfies every clause of `filter`.
///
/// Supported clauses: implicit equality (including array membership and
/// `{ field: null }` matching missing fields), dotted paths, `$eq $ne $gt
/// $gte $lt $lte $in $nin $exists $regex/$options`, and top-level `$and $or
/// $nor`.
pub fn matches(record: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let satisfied = match key.as_str() {
            "$and" => {
                let clauses = logical_clauses(key, condition)?;
                let mut all = true;
                for clause in clauses {
                    if !matches(record, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_clause(record, logical_clauses(key, condition)?)?,
            "$nor" => !any_clause(record, logical_clauses(key, condition)?)?,
            other if other.starts_with('$') => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported top-level operator `{other}`"
                )));
            }
            path => {
                let candidates = lookup_all(record, path);
                field_matches(&candidates, condition)?
            }
        };

        if !satisfied {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Applies a projection document to one record.
///
/// `_id` is kept unless explicitly excluded. Mixing inclusion and exclusion
/// of non-`_id` fields is rejected, matching the server.
pub fn project(record: Document, projection: &Document) -> StoreResult<Document> {
    let mut include_id = true;
    let mut id_selected = false;
    let mut included: Vec<Vec<&str>> = Vec::new();
    let mut excluded: Vec<Vec<&str>> = Vec::new();

    for (path, flag) in projection {
        let keep = projection_flag(path, flag)?;
        if path == ID_FIELD {
            include_id = keep;
            id_selected = keep;
        } else if keep {
            included.push(path.split('.').collect());
        } else {
            excluded.push(path.split('.').collect());
        }
    }

    if !included.is_empty() && !excluded.is_empty() {
        return Err(StoreError::InvalidQuery(
            "projection cannot mix inclusion and exclusion".to_string(),
        ));
    }

    // `{ _id: 1 }` alone is an inclusion projection.
    if !included.is_empty() || (id_selected && excluded.is_empty()) {
        let mut projected = Document::new();
        if include_id {
            if let Some(id) = record.get(ID_FIELD) {
                projected.insert(ID_FIELD, id.clone());
            }
        }
        for (key, value) in include_paths(&record, &included) {
            projected.insert(key, value);
        }
        return Ok(projected);
    }

    let mut projected = record;
    if !include_id {
        projected.remove(ID_FIELD);
    }
    for path in &excluded {
        exclude_path(&mut projected, path);
    }
    Ok(projected)
}

/// Applies `$set` semantics and returns whether the record changed.
pub fn apply_set(record: &mut Document, fields: &Document) -> StoreResult<bool> {
    let mut changed = false;
    for (path, value) in fields {
        if path.is_empty() || path.split('.').any(|segment| segment.is_empty()) {
            return Err(StoreError::InvalidQuery(format!(
                "invalid update path `{path}`"
            )));
        }
        if path.starts_with('$') {
            return Err(StoreError::InvalidQuery(format!(
                "update field `{path}` must not start with `$`"
            )));
        }
        if path == ID_FIELD && record.get(ID_FIELD) != Some(value) {
            return Err(StoreError::InvalidQuery(
                "update would modify the immutable field `_id`".to_string(),
            ));
        }
        changed |= set_path(record, path, value.clone())?;
    }
    Ok(changed)
}

fn logical_clauses<'a>(operator: &str, condition: &'a Bson) -> StoreResult<Vec<&'a Document>> {
    let items = match condition {
        Bson::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(StoreError::InvalidQuery(format!(
                "`{operator}` needs a non-empty array of documents"
            )));
        }
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(StoreError::InvalidQuery(format!(
                "`{operator}` entries must be documents"
            ))),
        })
        .collect()
}

fn any_clause(record: &Document, clauses: Vec<&Document>) -> StoreResult<bool> {
    for clause in clauses {
        if matches(record, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn field_matches(candidates: &[&Bson], condition: &Bson) -> StoreResult<bool> {
    match condition {
        Bson::Document(expression) if is_operator_expression(expression) => {
            operator_matches(candidates, expression)
        }
        Bson::RegularExpression(pattern) => {
            let regex = compile_regex(&pattern.pattern, &pattern.options)?;
            Ok(any_scalar(candidates, |value| regex_matches(&regex, value)))
        }
        target => Ok(equals_any(candidates, target)),
    }
}

fn is_operator_expression(expression: &Document) -> bool {
    expression
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

fn operator_matches(candidates: &[&Bson], expression: &Document) -> StoreResult<bool> {
    for (operator, operand) in expression {
        let satisfied = match operator.as_str() {
            "$eq" => equals_any(candidates, operand),
            "$ne" => !equals_any(candidates, operand),
            "$gt" => compares_any(candidates, operand, |ord| ord == Ordering::Greater),
            "$gte" => compares_any(candidates, operand, |ord| ord != Ordering::Less),
            "$lt" => compares_any(candidates, operand, |ord| ord == Ordering::Less),
            "$lte" => compares_any(candidates, operand, |ord| ord != Ordering::Greater),
            "$in" => in_list(candidates, operator, operand)?,
            "$nin" => !in_list(candidates, operator, operand)?,
            "$exists" => truthy(operand) == !candidates.is_empty(),
            "$regex" => {
                let regex = regex_operand(operand, expression.get("$options"))?;
                any_scalar(candidates, |value| regex_matches(&regex, value))
            }
            "$options" if expression.contains_key("$regex") => true,
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported field operator `{other}`"
                )));
            }
        };

        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(candidates: &[&Bson], operator: &str, operand: &Bson) -> StoreResult<bool> {
    match operand {
        Bson::Array(options) => {
            for option in options {
                let found = match option {
                    Bson::RegularExpression(pattern) => {
                        let regex = compile_regex(&pattern.pattern, &pattern.options)?;
                        any_scalar(candidates, |value| regex_matches(&regex, value))
                    }
                    other => equals_any(candidates, other),
                };
                if found {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(StoreError::InvalidQuery(format!(
            "`{operator}` needs an array"
        ))),
    }
}

/// Equality with server semantics: a missing field equals `null`, and an
/// array field matches when it equals the target or contains it.
fn equals_any(candidates: &[&Bson], target: &Bson) -> bool {
    if candidates.is_empty() {
        return matches!(target, Bson::Null);
    }

    candidates.iter().any(|value| {
        values_equal(value, target)
            || matches!(value, Bson::Array(items) if items.iter().any(|item| values_equal(item, target)))
    })
}

/// A missing field compares equal to `null`, so `$gte`/`$lte: null` match it.
fn compares_any(candidates: &[&Bson], operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    if candidates.is_empty() {
        return matches!(operand, Bson::Null) && accept(Ordering::Equal);
    }
    any_scalar(candidates, |value| {
        compare_values(value, operand).is_some_and(&accept)
    })
}

/// Tests the candidate itself and, for arrays, each element.
fn any_scalar(candidates: &[&Bson], test: impl Fn(&Bson) -> bool) -> bool {
    candidates.iter().any(|value| match *value {
        Bson::Array(items) => items.iter().any(&test),
        other => test(other),
    })
}

fn values_equal(left: &Bson, right: &Bson) -> bool {
    compare_values(left, right) == Some(Ordering::Equal) || left == right
}

/// Orders values of the same BSON type class; `None` when incomparable.
fn compare_values(left: &Bson, right: &Bson) -> Option<Ordering> {
    match (left, right) {
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            Some(as_i64(left)?.cmp(&as_i64(right)?))
        }
        (
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_),
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_),
        ) => as_f64(left)?.partial_cmp(&as_f64(right)?),
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        (Bson::Timestamp(a), Bson::Timestamp(b)) => {
            Some((a.time, a.increment).cmp(&(b.time, b.increment)))
        }
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(v) => *v != 0,
        Bson::Int64(v) => *v != 0,
        Bson::Double(v) => *v != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

fn regex_operand(operand: &Bson, options: Option<&Bson>) -> StoreResult<Regex> {
    let extra = match options {
        Some(Bson::String(flags)) => flags.as_str(),
        Some(_) => {
            return Err(StoreError::InvalidQuery(
                "`$options` must be a string".to_string(),
            ));
        }
        None => "",
    };

    match operand {
        Bson::String(pattern) => compile_regex(pattern, extra),
        Bson::RegularExpression(BsonRegex { pattern, options }) => {
            compile_regex(pattern, &format!("{options}{extra}"))
        }
        _ => Err(StoreError::InvalidQuery(
            "`$regex` needs a string or regular expression".to_string(),
        )),
    }
}

fn compile_regex(pattern: &str, options: &str) -> StoreResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(StoreError::InvalidQuery(format!(
                    "unsupported regex option `{other}`"
                )));
            }
        };
    }
    builder
        .build()
        .map_err(|err| StoreError::InvalidQuery(format!("invalid regex `{pattern}`: {err}")))
}

fn regex_matches(regex: &Regex, value: &Bson) -> bool {
    match value {
        Bson::String(text) | Bson::Symbol(text) => regex.is_match(text),
        _ => false,
    }
}

fn projection_flag(path: &str, flag: &Bson) -> StoreResult<bool> {
    match flag {
        Bson::Boolean(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => Ok(truthy(flag)),
        _ => Err(StoreError::InvalidQuery(format!(
            "projection value for `{path}` must be a boolean or number"
        ))),
    }
}

/// Resolves a dotted path; arrays are traversed element-wise and by index.
fn lookup_all<'a>(record: &'a Document, path: &str) -> Vec<&'a Bson> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut found = Vec::new();
    if let Some(value) = record.get(segments[0]) {
        collect_path(value, &segments[1..], &mut found);
    }
    found
}

fn collect_path<'a>(value: &'a Bson, rest: &[&str], found: &mut Vec<&'a Bson>) {
    let Some((segment, tail)) = rest.split_first() else {
        found.push(value);
        return;
    };

    match value {
        Bson::Document(doc) => {
            if let Some(next) = doc.get(*segment) {
                collect_path(next, tail, found);
            }
        }
        Bson::Array(items) => {
            if let Ok(index) = segment.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    collect_path(item, tail, found);
                }
            }
            for item in items {
                if let Bson::Document(_) = item {
                    collect_path(item, rest, found);
                }
            }
        }
        _ => {}
    }
}

fn include_paths(record: &Document, paths: &[Vec<&str>]) -> Document {
    let mut projected = Document::new();
    for (key, value) in record {
        if key == ID_FIELD {
            continue;
        }
        let selecting: Vec<&[&str]> = paths
            .iter()
            .filter_map(|path| match path.split_first() {
                Some((head, tail)) if *head == key.as_str() => Some(tail),
                _ => None,
            })
            .collect();
        if selecting.is_empty() {
            continue;
        }
        if selecting.iter().any(|tail| tail.is_empty()) {
            projected.insert(key.clone(), value.clone());
            continue;
        }

        let tails: Vec<Vec<&str>> = selecting.iter().map(|tail| tail.to_vec()).collect();
        match value {
            Bson::Document(nested) => {
                let sub = include_paths(nested, &tails);
                if !sub.is_empty() {
                    projected.insert(key.clone(), sub);
                }
            }
            Bson::Array(items) => {
                let kept: Vec<Bson> = items
                    .iter()
                    .filter_map(|item| match item {
                        Bson::Document(nested) => {
                            Some(Bson::Document(include_paths(nested, &tails)))
                        }
                        _ => None,
                    })
                    .collect();
                projected.insert(key.clone(), kept);
            }
            _ => {}
        }
    }
    projected
}

fn exclude_path(record: &mut Document, path: &[&str]) {
    match path {
        [] => {}
        [field] => {
            record.remove(*field);
        }
        [field, tail @ ..] => match record.get_mut(*field) {
            Some(Bson::Document(nested)) => exclude_path(nested, tail),
            Some(Bson::Array(items)) => {
                for item in items {
                    if let Bson::Document(nested) = item {
                        exclude_path(nested, tail);
                    }
                }
            }
            _ => {}
        },
    }
}

fn set_path(record: &mut Document, path: &str, value: Bson) -> StoreResult<bool> {
    let segments: Vec<&str> = path.split('.').collect();
    set_in_document(record, path, &segments, value)
}

fn set_in_document(
    target: &mut Document,
    path: &str,
    segments: &[&str],
    value: Bson,
) -> StoreResult<bool> {
    let Some((head, tail)) = segments.split_first() else {
        return Ok(false);
    };

    if tail.is_empty() {
        if target.get(*head) == Some(&value) {
            return Ok(false);
        }
        target.insert(*head, value);
        return Ok(true);
    }

    if !target.contains_key(*head) {
        target.insert(*head, Document::new());
    }
    match target.get_mut(*head) {
        Some(child) => set_in_value(child, head, path, tail, value),
        None => Ok(false),
    }
}

/// Descends into `node` (the value at `parent`); arrays are addressed by
/// numeric index and padded with `null` when the index is past the end.
fn set_in_value(
    node: &mut Bson,
    parent: &str,
    path: &str,
    segments: &[&str],
    value: Bson,
) -> StoreResult<bool> {
    match node {
        Bson::Document(nested) => set_in_document(nested, path, segments, value),
        Bson::Array(items) => {
            let Some((head, tail)) = segments.split_first() else {
                return Ok(false);
            };
            let index: usize = head.parse().map_err(|_| {
                StoreError::InvalidQuery(format!(
                    "cannot create field `{head}` inside array `{parent}` for `{path}`"
                ))
            })?;

            if tail.is_empty() {
                if items.get(index) == Some(&value) {
                    return Ok(false);
                }
                if index >= items.len() {
                    items.resize(index + 1, Bson::Null);
                }
                items[index] = value;
                return Ok(true);
            }

            if index >= items.len() {
                items.resize(index, Bson::Null);
                items.push(Bson::Document(Document::new()));
            }
            set_in_value(&mut items[index], head, path, tail, value)
        }
        _ => Err(StoreError::InvalidQuery(format!(
            "cannot create field `{}` inside non-document `{parent}` for `{path}`",
            segments.first().copied().unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{apply_set, matches, project};
    use crate::store::StoreError;
    use bson::{doc, Bson, Regex};

    fn rex() -> bson::Document {
        doc! {
            "_id": 1,
            "name": "Rex",
            "species": "dog",
            "age_upon_outcome_in_weeks": 52.5,
            "tags": ["friendly", "vaccinated"],
            "location": { "lat": 30.75, "long": -97.48 },
        }
    }

    #[test]
    fn implicit_equality_and_dotted_paths_match() {
        let record = rex();
        assert!(matches(&record, &doc! {}).unwrap());
        assert!(matches(&record, &doc! { "name": "Rex", "species": "dog" }).unwrap());
        assert!(matches(&record, &doc! { "location.lat": 30.75 }).unwrap());
        assert!(!matches(&record, &doc! { "name": "Milo" }).unwrap());
    }

    #[test]
    fn array_fields_match_by_membership() {
        let record = rex();
        assert!(matches(&record, &doc! { "tags": "friendly" }).unwrap());
        assert!(matches(&record, &doc! { "tags": { "$in": ["aggressive", "vaccinated"] } }).unwrap());
        assert!(!matches(&record, &doc! { "tags": { "$nin": ["friendly"] } }).unwrap());
    }

    #[test]
    fn null_equality_matches_missing_field() {
        let record = rex();
        assert!(matches(&record, &doc! { "outcome_subtype": Bson::Null }).unwrap());
        assert!(!matches(&record, &doc! { "outcome_subtype": { "$exists": true } }).unwrap());
        assert!(matches(&record, &doc! { "name": { "$exists": 1 } }).unwrap());
    }

    #[test]
    fn numeric_comparisons_cross_int_and_double() {
        let record = rex();
        assert!(matches(&record, &doc! { "age_upon_outcome_in_weeks": { "$gte": 26, "$lt": 156 } })
            .unwrap());
        assert!(!matches(&record, &doc! { "age_upon_outcome_in_weeks": { "$gt": 52.5 } }).unwrap());
        assert!(matches(&record, &doc! { "_id": 1_i64 }).unwrap());
        assert!(!matches(&record, &doc! { "name": { "$gt": 5 } }).unwrap());
    }

    #[test]
    fn logical_operators_combine_clauses() {
        let record = rex();
        assert!(matches(
            &record,
            &doc! { "$or": [{ "species": "cat" }, { "name": "Rex" }] }
        )
        .unwrap());
        assert!(!matches(
            &record,
            &doc! { "$and": [{ "species": "dog" }, { "name": "Milo" }] }
        )
        .unwrap());
        assert!(matches(&record, &doc! { "$nor": [{ "species": "cat" }] }).unwrap());
    }

    #[test]
    fn regex_operators_match_strings() {
        let record = rex();
        assert!(matches(&record, &doc! { "name": { "$regex": "^r", "$options": "i" } }).unwrap());
        assert!(matches(
            &record,
            &doc! { "name": Regex { pattern: "ex$".to_string(), options: String::new() } }
        )
        .unwrap());
        assert!(!matches(&record, &doc! { "name": { "$regex": "^r" } }).unwrap());
    }

    #[test]
    fn unsupported_operators_are_rejected() {
        let record = rex();
        assert!(matches!(
            matches(&record, &doc! { "name": { "$where": "1" } }),
            Err(StoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            matches(&record, &doc! { "$text": { "$search": "Rex" } }),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn invalid_regex_inside_in_list_is_rejected() {
        let record = rex();
        let broken = Regex {
            pattern: "(".to_string(),
            options: String::new(),
        };
        assert!(matches!(
            matches(&record, &doc! { "name": { "$in": [broken.clone()] } }),
            Err(StoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            matches(&record, &doc! { "name": { "$nin": ["Milo", broken] } }),
            Err(StoreError::InvalidQuery(_))
        ));

        let prefix = Regex {
            pattern: "^R".to_string(),
            options: String::new(),
        };
        assert!(matches(&record, &doc! { "name": { "$in": ["Milo", prefix] } }).unwrap());
    }

    #[test]
    fn inclusive_null_comparisons_match_missing_field() {
        let record = rex();
        assert!(matches(&record, &doc! { "breed": { "$gte": Bson::Null } }).unwrap());
        assert!(matches(&record, &doc! { "breed": { "$lte": Bson::Null } }).unwrap());
        assert!(!matches(&record, &doc! { "breed": { "$gt": Bson::Null } }).unwrap());
        assert!(!matches(&record, &doc! { "breed": { "$lt": Bson::Null } }).unwrap());
        assert!(!matches(&record, &doc! { "name": { "$gte": Bson::Null } }).unwrap());
    }

    #[test]
    fn inclusion_projection_keeps_id_by_default() {
        let projected = project(rex(), &doc! { "name": 1, "location.lat": 1 }).unwrap();
        assert_eq!(
            projected,
            doc! { "_id": 1, "name": "Rex", "location": { "lat": 30.75 } }
        );

        let without_id = project(rex(), &doc! { "_id": 0, "name": true }).unwrap();
        assert_eq!(without_id, doc! { "name": "Rex" });
    }

    #[test]
    fn id_only_projection_is_an_inclusion() {
        assert_eq!(project(rex(), &doc! { "_id": 1 }).unwrap(), doc! { "_id": 1 });
        assert_eq!(project(rex(), &doc! { "_id": true }).unwrap(), doc! { "_id": 1 });

        let without_id = project(rex(), &doc! { "_id": 0 }).unwrap();
        assert!(!without_id.contains_key("_id"));
        assert_eq!(without_id.get_str("name").unwrap(), "Rex");

        let id_and_exclusion = project(rex(), &doc! { "_id": 1, "tags": 0 }).unwrap();
        assert_eq!(id_and_exclusion.get_i32("_id").unwrap(), 1);
        assert_eq!(id_and_exclusion.get_str("species").unwrap(), "dog");
        assert!(!id_and_exclusion.contains_key("tags"));
    }

    #[test]
    fn exclusion_projection_drops_named_fields() {
        let projected = project(rex(), &doc! { "tags": 0, "location.long": 0 }).unwrap();
        assert!(!projected.contains_key("tags"));
        assert_eq!(projected.get_document("location").unwrap(), &doc! { "lat": 30.75 });
        assert_eq!(projected.get_i32("_id").unwrap(), 1);
    }

    #[test]
    fn mixed_projection_is_rejected() {
        assert!(matches!(
            project(rex(), &doc! { "name": 1, "tags": 0 }),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn set_reports_change_only_when_value_differs() {
        let mut record = rex();
        assert!(apply_set(&mut record, &doc! { "species": "canine" }).unwrap());
        assert_eq!(record.get_str("species").unwrap(), "canine");
        assert!(!apply_set(&mut record, &doc! { "species": "canine" }).unwrap());
    }

    #[test]
    fn set_creates_nested_documents_and_guards_id() {
        let mut record = rex();
        assert!(apply_set(&mut record, &doc! { "intake.condition": "normal" }).unwrap());
        assert_eq!(
            record.get_document("intake").unwrap(),
            &doc! { "condition": "normal" }
        );

        assert!(matches!(
            apply_set(&mut record, &doc! { "_id": 2 }),
            Err(StoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            apply_set(&mut record, &doc! { "name.first": "R" }),
            Err(StoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn set_addresses_array_elements_by_index() {
        let mut record = rex();
        assert!(apply_set(&mut record, &doc! { "tags.0": "calm" }).unwrap());
        assert_eq!(
            record.get_array("tags").unwrap(),
            &vec![Bson::from("calm"), Bson::from("vaccinated")]
        );
        assert!(!apply_set(&mut record, &doc! { "tags.0": "calm" }).unwrap());

        assert!(apply_set(&mut record, &doc! { "tags.3": "neutered" }).unwrap());
        assert_eq!(record.get_array("tags").unwrap().len(), 4);
        assert_eq!(record.get_array("tags").unwrap()[2], Bson::Null);

        let mut visits = doc! { "_id": 2, "visits": [{ "vet": "Ames" }] };
        assert!(apply_set(&mut visits, &doc! { "visits.0.outcome": "healthy" }).unwrap());
        assert_eq!(
            visits.get_array("visits").unwrap()[0],
            Bson::Document(doc! { "vet": "Ames", "outcome": "healthy" })
        );

        assert!(matches!(
            apply_set(&mut record, &doc! { "tags.first": "calm" }),
            Err(StoreError::InvalidQuery(_))
        ));
    }
}

//! Candidate value enumeration for the edit menu.
//!
//! Candidates come from several overlapping sources (type literals, range
//! bounds, enum choices, default, current, recently used), so registration
//! dedupes by serialized value and merges the descriptions of duplicates.

use std::collections::HashMap;

use serde_json::Value;

use crate::schema::{PrimitiveType, SettingsEntry};

/// How many recent values to offer for an enum-typed setting, relative to
/// the number of declared choices.
const ENUM_RECENT_DIVISOR: usize = 3;

/// Lists longer than this are grouped by detail presence before sorting.
const GROUPING_THRESHOLD: usize = 10;

/// One offerable value with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: Value,
    /// Comma-joined provenance, e.g. `default, current value`.
    pub description: String,
    /// Per-choice schema description, when the value is an enum choice.
    pub detail: Option<String>,
}

struct Registered {
    value: Value,
    serialized: String,
    descriptions: Vec<String>,
    detail: Option<String>,
    enum_index: Option<usize>,
    order: usize,
}

/// Deduplicating candidate accumulator.
#[derive(Default)]
pub struct CandidateSet {
    items: Vec<Registered>,
    by_serialized: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate. A value already present keeps one list entry;
    /// the new description is appended and the first detail wins.
    pub fn register(&mut self, value: Value, description: &str, detail: Option<String>) {
        self.register_inner(value, description, detail, None);
    }

    fn register_enum(&mut self, value: Value, description: &str, detail: Option<String>, index: usize) {
        self.register_inner(value, description, detail, Some(index));
    }

    fn register_inner(
        &mut self,
        value: Value,
        description: &str,
        detail: Option<String>,
        enum_index: Option<usize>,
    ) {
        let serialized = value.to_string();
        if let Some(&index) = self.by_serialized.get(&serialized) {
            let existing = &mut self.items[index];
            if !existing.descriptions.iter().any(|d| d == description) {
                existing.descriptions.push(description.to_string());
            }
            if existing.detail.is_none() {
                existing.detail = detail;
            }
            if existing.enum_index.is_none() {
                existing.enum_index = enum_index;
            }
            return;
        }
        let order = self.items.len();
        self.by_serialized.insert(serialized.clone(), order);
        self.items.push(Registered {
            value,
            serialized,
            descriptions: vec![description.to_string()],
            detail,
            enum_index,
            order,
        });
    }

    /// Finish: merge descriptions and sort.
    ///
    /// "recently used" is provenance of last resort; once a value has any
    /// other description the recency tag is dropped from the merge.
    pub fn into_sorted(mut self) -> Vec<Candidate> {
        let group_by_detail = self.items.len() > GROUPING_THRESHOLD;
        // Registration order is the last tiebreak for every comparison path.
        self.items.sort_by(|a, b| {
            compare_candidates(a, b, group_by_detail).then_with(|| a.order.cmp(&b.order))
        });
        self.items
            .into_iter()
            .map(|item| {
                let mut descriptions = item.descriptions;
                if descriptions.len() > 1 {
                    descriptions.retain(|d| d != "recently used");
                }
                Candidate {
                    value: item.value,
                    description: descriptions.join(", "),
                    detail: item.detail,
                }
            })
            .collect()
    }
}

fn compare_candidates(a: &Registered, b: &Registered, group_by_detail: bool) -> std::cmp::Ordering {
    if group_by_detail {
        let rank = |item: &Registered| item.detail.is_none();
        match rank(a).cmp(&rank(b)) {
            std::cmp::Ordering::Equal => {}
            other => return other,
        }
    }
    let type_a = type_rank(&a.value);
    let type_b = type_rank(&b.value);
    if type_a != type_b {
        return type_a.cmp(&type_b);
    }
    if let (Some(ia), Some(ib)) = (a.enum_index, b.enum_index) {
        return ia.cmp(&ib);
    }
    match (&a.value, &b.value) {
        (Value::Number(na), Value::Number(nb)) => {
            let fa = na.as_f64().unwrap_or(0.0);
            let fb = nb.as_f64().unwrap_or(0.0);
            fa.partial_cmp(&fb).unwrap_or(std::cmp::Ordering::Equal)
        }
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        _ => a.serialized.cmp(&b.serialized),
    }
}

/// Runtime type ordering: null < boolean < string < number < array < object.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::String(_) => 2,
        Value::Number(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Enumerate every value the edit menu offers for `entry`.
///
/// `current` is the value in the pointer's slot, `default` the derived
/// default, `recents` the recency list for the pointer, most recent first.
pub fn enumerate(
    entry: &SettingsEntry,
    current: Option<&Value>,
    default: &Value,
    recents: &[Value],
) -> Vec<Candidate> {
    let property = &entry.property;
    let mut set = CandidateSet::new();

    if property.has_type(PrimitiveType::Null) {
        set.register(Value::Null, "null", None);
    }
    if property.has_type(PrimitiveType::Boolean) {
        set.register(Value::Bool(true), "true", None);
        set.register(Value::Bool(false), "false", None);
    }
    if let Some(minimum) = property.minimum {
        if let Some(value) = f64_to_value(minimum) {
            set.register(value, "minimum", None);
        }
    }
    if let Some(maximum) = property.maximum {
        if let Some(value) = f64_to_value(maximum) {
            set.register(value, "maximum", None);
        }
    }
    if let Some(choices) = &property.enum_values {
        for (index, choice) in choices.iter().enumerate() {
            set.register_enum(
                choice.clone(),
                "allowed value",
                property.choice_description(index),
                index,
            );
        }
    }
    set.register(default.clone(), "default", None);
    if let Some(current) = current {
        set.register(current.clone(), "current value", None);
    }

    // For enum settings most choices are already listed, so recency only
    // earns a small slice of the menu.
    let recent_budget = match &property.enum_values {
        Some(choices) => choices.len() / ENUM_RECENT_DIVISOR,
        None => recents.len(),
    };
    for recent in recents.iter().take(recent_budget) {
        set.register(recent.clone(), "recently used", None);
    }

    set.into_sorted()
}

fn f64_to_value(number: f64) -> Option<Value> {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Some(Value::Number((number as i64).into()))
    } else {
        serde_json::Number::from_f64(number).map(Value::Number)
    }
}

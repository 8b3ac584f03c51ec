//! Value types referenced by reference-tree constraints.
//!
//! A constraint names a type (`integer`, `string`, `choice`, or anything a
//! caller registers) plus an optional type-specific constraint string.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// A named value type able to check values against its constraint syntax.
pub trait ValueType: Send + Sync {
    /// Name constraints use to refer to this type.
    fn name(&self) -> &str;

    /// Check that a constraint string is well formed for this type.
    fn check_constraint(&self, constraint: &str) -> Result<(), String>;

    /// Whether `value` belongs to the type and satisfies `constraint`.
    fn accepts(&self, value: &str, constraint: Option<&str>) -> bool;
}

/// Signed integers, constrained by an inclusive `min-max` range.
#[derive(Debug, Default)]
pub struct IntegerType;

impl IntegerType {
    fn parse_range(constraint: &str) -> Result<(i64, i64), String> {
        // Both bounds may be negative, so split at the '-' that follows a digit
        let bytes = constraint.as_bytes();
        let split = (1..bytes.len())
            .find(|&i| bytes[i] == b'-' && bytes[i - 1].is_ascii_digit())
            .ok_or_else(|| format!("expected 'min-max', got '{constraint}'"))?;
        let (min, max) = (&constraint[..split], &constraint[split + 1..]);
        let min: i64 = min.trim().parse().map_err(|e| format!("min: {e}"))?;
        let max: i64 = max.trim().parse().map_err(|e| format!("max: {e}"))?;
        if min > max {
            return Err(format!("empty range {min}-{max}"));
        }
        Ok((min, max))
    }
}

impl ValueType for IntegerType {
    fn name(&self) -> &str {
        "integer"
    }

    fn check_constraint(&self, constraint: &str) -> Result<(), String> {
        Self::parse_range(constraint).map(|_| ())
    }

    fn accepts(&self, value: &str, constraint: Option<&str>) -> bool {
        let Ok(number) = value.parse::<i64>() else {
            return false;
        };
        match constraint {
            None => true,
            Some(c) => Self::parse_range(c)
                .map(|(min, max)| (min..=max).contains(&number))
                .unwrap_or(false),
        }
    }
}

/// Free-form strings, constrained by a regular expression that must match
/// the whole value.
#[derive(Debug, Default)]
pub struct StringType;

impl StringType {
    fn compile(pattern: &str) -> Result<Regex, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$"))
    }
}

impl ValueType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn check_constraint(&self, constraint: &str) -> Result<(), String> {
        Self::compile(constraint).map(|_| ()).map_err(|e| e.to_string())
    }

    fn accepts(&self, value: &str, constraint: Option<&str>) -> bool {
        match constraint {
            None => true,
            Some(pattern) => Self::compile(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false),
        }
    }
}

/// Enumerated alternatives written as `a|b|c`.
#[derive(Debug, Default)]
pub struct ChoiceType;

impl ValueType for ChoiceType {
    fn name(&self) -> &str {
        "choice"
    }

    fn check_constraint(&self, constraint: &str) -> Result<(), String> {
        if constraint.split('|').any(|alt| alt.trim().is_empty()) {
            return Err("empty alternative".to_string());
        }
        Ok(())
    }

    fn accepts(&self, value: &str, constraint: Option<&str>) -> bool {
        // A choice without alternatives admits nothing
        constraint.is_some_and(|c| c.split('|').any(|alt| alt.trim() == value))
    }
}

/// Lookup table from type name to implementation.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn ValueType>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.types.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl TypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `integer`, `string` and `choice`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(IntegerType));
        registry.register(Arc::new(StringType));
        registry.register(Arc::new(ChoiceType));
        registry
    }

    /// Adds a type, replacing any previous type of the same name.
    pub fn register(&mut self, value_type: Arc<dyn ValueType>) {
        self.types.insert(value_type.name().to_string(), value_type);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ValueType>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

//! Filter compiler
//!
//! Turns rule-group configuration into a [`CompiledFilter`], resolving
//! every field key and literal up front so evaluation is a plain walk
//! over pre-typed comparisons.

use loghose_config::{FilterGroup, FilterRule};
use loghose_protocol::RequestView;

use crate::error::{FilterError, Result};
use crate::fields::{field_spec, FieldType, FilterOperand};
use crate::operator::Operator;

#[cfg(test)]
#[path = "compile_test.rs"]
mod tests;

/// How to read the rule's subject off a request
#[derive(Clone)]
enum Subject {
    /// Static field from the accessor table
    Static(crate::fields::Accessor),
    /// `header:<name>` dynamic key (name pre-lowercased)
    Header(String),
    /// `cookie:<name>` dynamic key
    Cookie(String),
}

impl Subject {
    fn resolve(&self, view: &RequestView) -> Option<FilterOperand> {
        match self {
            Self::Static(accessor) => accessor(view),
            Self::Header(name) => view
                .header(name)
                .map(|v| FilterOperand::Str(v.to_string())),
            Self::Cookie(name) => view
                .cookie(name)
                .map(|v| FilterOperand::Str(v.to_string())),
        }
    }
}

/// A fully-typed comparison
#[derive(Clone)]
enum Comparison {
    Exists,
    DoesNotExist,
    EqualsStr(String),
    EqualsNum(f64),
    EqualsBool(bool),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    GreaterThan(f64),
    LessThan(f64),
}

impl Comparison {
    /// Evaluate against a subject value
    ///
    /// A null subject fails everything except `DoesNotExist`; a subject
    /// of the wrong shape fails rather than erroring.
    fn eval(&self, subject: Option<&FilterOperand>) -> bool {
        match self {
            Self::Exists => subject.is_some(),
            Self::DoesNotExist => subject.is_none(),
            _ => {
                let Some(subject) = subject else {
                    return false;
                };
                match (self, subject) {
                    (Self::EqualsStr(lit), FilterOperand::Str(v)) => v == lit,
                    (Self::EqualsNum(lit), FilterOperand::Num(v)) => v == lit,
                    (Self::EqualsBool(lit), FilterOperand::Bool(v)) => v == lit,
                    (Self::Contains(lit), FilterOperand::Str(v)) => v.contains(lit),
                    (Self::StartsWith(lit), FilterOperand::Str(v)) => v.starts_with(lit),
                    (Self::EndsWith(lit), FilterOperand::Str(v)) => v.ends_with(lit),
                    (Self::GreaterThan(lit), FilterOperand::Num(v)) => v > lit,
                    (Self::LessThan(lit), FilterOperand::Num(v)) => v < lit,
                    _ => false,
                }
            }
        }
    }
}

/// One compiled rule: subject + comparison
#[derive(Clone)]
struct CompiledRule {
    subject: Subject,
    comparison: Comparison,
}

#[derive(Clone)]
enum Kind {
    /// No filter configured: every request matches
    MatchAll,
    /// Compile failure degraded this filter: nothing matches
    DenyAll,
    /// OR of groups; each group is an AND of rules
    Groups(Vec<Vec<CompiledRule>>),
}

/// A compiled filter predicate
#[derive(Clone)]
pub struct CompiledFilter {
    kind: Kind,
}

impl CompiledFilter {
    /// Predicate that matches every request
    pub fn match_all() -> Self {
        Self {
            kind: Kind::MatchAll,
        }
    }

    /// Predicate that matches no request
    ///
    /// Used by the plan compiler when a route's filter fails to compile.
    pub fn deny_all() -> Self {
        Self {
            kind: Kind::DenyAll,
        }
    }

    /// Evaluate the predicate against a request view
    pub fn matches(&self, view: &RequestView) -> bool {
        match &self.kind {
            Kind::MatchAll => true,
            Kind::DenyAll => false,
            Kind::Groups(groups) => groups.iter().any(|group| {
                group
                    .iter()
                    .all(|rule| rule.comparison.eval(rule.subject.resolve(view).as_ref()))
            }),
        }
    }

    /// Whether this filter was degraded to deny-all
    pub fn is_deny_all(&self) -> bool {
        matches!(self.kind, Kind::DenyAll)
    }
}

impl std::fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            Kind::MatchAll => "match_all".to_string(),
            Kind::DenyAll => "deny_all".to_string(),
            Kind::Groups(groups) => format!("{} group(s)", groups.len()),
        };
        f.debug_struct("CompiledFilter").field("kind", &kind).finish()
    }
}

/// Compile rule groups into a predicate
///
/// An absent or empty group list compiles to match-all. Unknown fields,
/// unknown operators, operator/type mismatches, and mistyped literals
/// are all compile-time errors.
pub fn compile(groups: Option<&[FilterGroup]>) -> Result<CompiledFilter> {
    let Some(groups) = groups else {
        return Ok(CompiledFilter::match_all());
    };
    if groups.is_empty() {
        return Ok(CompiledFilter::match_all());
    }

    let mut compiled_groups = Vec::with_capacity(groups.len());
    for group in groups {
        let mut compiled = Vec::new();
        for (field_key, rules) in group {
            compile_field_rules(field_key, rules, &mut compiled)?;
        }
        compiled_groups.push(compiled);
    }

    Ok(CompiledFilter {
        kind: Kind::Groups(compiled_groups),
    })
}

/// Compile all rules declared for one field key
fn compile_field_rules(
    field_key: &str,
    rules: &FilterRule,
    out: &mut Vec<CompiledRule>,
) -> Result<()> {
    let (subject, field_type) = resolve_field(field_key)?;

    for (op_name, literal) in rules {
        let operator = Operator::parse(op_name).ok_or_else(|| FilterError::UnknownOperator {
            field: field_key.to_string(),
            operator: op_name.clone(),
        })?;

        if !operator.valid_for(field_type) {
            return Err(FilterError::InvalidOperator {
                field: field_key.to_string(),
                operator: operator.name(),
                field_type: field_type.name(),
            });
        }

        let comparison = build_comparison(field_key, operator, field_type, literal)?;
        out.push(CompiledRule {
            subject: subject.clone(),
            comparison,
        });
    }

    Ok(())
}

/// Resolve a field key to its subject reader and declared type
fn resolve_field(field_key: &str) -> Result<(Subject, FieldType)> {
    if let Some(name) = field_key.strip_prefix("header:") {
        if name.is_empty() {
            return Err(FilterError::EmptyDynamicName(field_key.to_string()));
        }
        return Ok((Subject::Header(name.to_ascii_lowercase()), FieldType::Str));
    }

    if let Some(name) = field_key.strip_prefix("cookie:") {
        if name.is_empty() {
            return Err(FilterError::EmptyDynamicName(field_key.to_string()));
        }
        return Ok((Subject::Cookie(name.to_string()), FieldType::Str));
    }

    let spec = field_spec(field_key)
        .ok_or_else(|| FilterError::UnknownField(field_key.to_string()))?;
    Ok((Subject::Static(spec.accessor), spec.field_type))
}

/// Convert a JSON literal into a typed comparison
fn build_comparison(
    field_key: &str,
    operator: Operator,
    field_type: FieldType,
    literal: &serde_json::Value,
) -> Result<Comparison> {
    let string_literal = || {
        literal
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FilterError::LiteralType {
                field: field_key.to_string(),
                operator: operator.name(),
                expected: "string",
            })
    };
    let number_literal = || {
        literal.as_f64().ok_or_else(|| FilterError::LiteralType {
            field: field_key.to_string(),
            operator: operator.name(),
            expected: "number",
        })
    };

    Ok(match operator {
        Operator::Exists => Comparison::Exists,
        Operator::DoesNotExist => Comparison::DoesNotExist,
        Operator::Equals => match field_type {
            FieldType::Str => Comparison::EqualsStr(string_literal()?),
            FieldType::Num => Comparison::EqualsNum(number_literal()?),
            FieldType::Bool => {
                let value = literal.as_bool().ok_or_else(|| FilterError::LiteralType {
                    field: field_key.to_string(),
                    operator: operator.name(),
                    expected: "boolean",
                })?;
                Comparison::EqualsBool(value)
            }
        },
        Operator::Contains => Comparison::Contains(string_literal()?),
        Operator::StartsWith => Comparison::StartsWith(string_literal()?),
        Operator::EndsWith => Comparison::EndsWith(string_literal()?),
        Operator::GreaterThan => Comparison::GreaterThan(number_literal()?),
        Operator::LessThan => Comparison::LessThan(number_literal()?),
    })
}

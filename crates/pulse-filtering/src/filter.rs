//! Filter compilation and evaluation
//!
//! A `Filter` is one compiled field/predicate/comparand triple. Compilation
//! front-loads every failure mode (unknown field, inapplicable predicate,
//! unparseable comparand) so that evaluation is infallible: it takes a
//! telemetry item and returns a bool, never an error.
//!
//! String comparisons are ordinal. Numeric comparisons use f64 semantics;
//! a text field under a numeric predicate is parsed per item, and a value
//! that does not parse simply does not match.

use pulse_protocol::{FieldValue, FilterSpec, Predicate, TelemetryItem, TelemetryKind};

use crate::error::FilterError;
use crate::fields::{self, FieldKind, FieldTarget};

/// The comparand literal, parsed into the type the predicate requires.
#[derive(Debug, Clone)]
enum Comparand {
    Text(String),
    Number(f64),
    Flag(bool),
}

/// One compiled filter.
#[derive(Debug, Clone)]
pub struct Filter {
    kind: TelemetryKind,
    spec: FilterSpec,
    target: FieldTarget,
    comparand: Comparand,
}

impl Filter {
    /// Compile a filter spec against the field schema for `kind`.
    ///
    /// Fails if the field is not projectable for the kind, the predicate
    /// does not apply to the field's type, or the comparand does not parse
    /// as the type the predicate requires.
    pub fn compile(kind: TelemetryKind, spec: &FilterSpec) -> Result<Self, FilterError> {
        let target = fields::resolve(kind, &spec.field_name)?;
        let comparand = Self::compile_comparand(&target, spec)?;

        Ok(Self {
            kind,
            spec: spec.clone(),
            target,
            comparand,
        })
    }

    fn compile_comparand(target: &FieldTarget, spec: &FilterSpec) -> Result<Comparand, FilterError> {
        let predicate = spec.predicate;

        if matches!(target, FieldTarget::AnyField)
            && !matches!(predicate, Predicate::Contains | Predicate::DoesNotContain)
        {
            // The any-field scan has no single value to compare against
            return Err(FilterError::not_applicable(predicate, &spec.field_name));
        }

        match target.kind() {
            FieldKind::Flag => match predicate {
                Predicate::Equal | Predicate::NotEqual => {
                    match spec.comparand.trim().to_ascii_lowercase().as_str() {
                        "true" => Ok(Comparand::Flag(true)),
                        "false" => Ok(Comparand::Flag(false)),
                        _ => Err(FilterError::invalid_comparand(
                            predicate,
                            &spec.comparand,
                            "boolean",
                        )),
                    }
                }
                _ => Err(FilterError::not_applicable(predicate, &spec.field_name)),
            },

            FieldKind::Number => match predicate {
                Predicate::Contains | Predicate::DoesNotContain => {
                    Ok(Comparand::Text(spec.comparand.clone()))
                }
                _ => Self::parse_number(spec),
            },

            FieldKind::Text => {
                if predicate.is_numeric() {
                    // Numeric predicate on a text field: the comparand must
                    // be numeric now, the field value is coerced per item
                    Self::parse_number(spec)
                } else {
                    Ok(Comparand::Text(spec.comparand.clone()))
                }
            }
        }
    }

    fn parse_number(spec: &FilterSpec) -> Result<Comparand, FilterError> {
        spec.comparand
            .trim()
            .parse::<f64>()
            .map(Comparand::Number)
            .map_err(|_| {
                FilterError::invalid_comparand(spec.predicate, &spec.comparand, "number")
            })
    }

    /// The telemetry kind this filter was compiled for
    pub fn telemetry_kind(&self) -> TelemetryKind {
        self.kind
    }

    /// The field/predicate/comparand triple this filter was compiled from
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// Evaluate the filter against a telemetry item. Total: absent fields
    /// project to empty values, unparseable coercions do not match.
    pub fn evaluate(&self, item: &TelemetryItem) -> bool {
        match &self.target {
            FieldTarget::AnyField => {
                let Comparand::Text(needle) = &self.comparand else {
                    return false;
                };
                let hit = item.scan_text(|s| s.contains(needle.as_str()));
                match self.spec.predicate {
                    Predicate::Contains => hit,
                    Predicate::DoesNotContain => !hit,
                    _ => false,
                }
            }

            FieldTarget::CustomDimension(key) => {
                let value = item.property(key).unwrap_or_default();
                self.evaluate_value(FieldValue::Text(value.to_string()))
            }

            FieldTarget::Typed { extract, .. } => self.evaluate_value(extract(item)),
        }
    }

    fn evaluate_value(&self, value: FieldValue) -> bool {
        let predicate = self.spec.predicate;

        match (value, &self.comparand) {
            (FieldValue::Text(s), Comparand::Text(c)) => match predicate {
                Predicate::Equal => s == *c,
                Predicate::NotEqual => s != *c,
                Predicate::Contains => s.contains(c.as_str()),
                Predicate::DoesNotContain => !s.contains(c.as_str()),
                _ => false,
            },

            // Numeric predicate over a text field: coerce per item
            (FieldValue::Text(s), Comparand::Number(n)) => match s.trim().parse::<f64>() {
                Ok(v) => compare_numeric(predicate, v, *n),
                Err(_) => false,
            },

            (FieldValue::Number(v), Comparand::Number(n)) => compare_numeric(predicate, v, *n),

            // Contains/DoesNotContain over a numeric field matches the
            // value's textual form
            (FieldValue::Number(v), Comparand::Text(c)) => {
                let text = format_number(v);
                match predicate {
                    Predicate::Contains => text.contains(c.as_str()),
                    Predicate::DoesNotContain => !text.contains(c.as_str()),
                    _ => false,
                }
            }

            (FieldValue::Flag(v), Comparand::Flag(c)) => match predicate {
                Predicate::Equal => v == *c,
                Predicate::NotEqual => v != *c,
                _ => false,
            },

            // Remaining combinations are unreachable for compiled filters
            _ => false,
        }
    }
}

fn compare_numeric(predicate: Predicate, left: f64, right: f64) -> bool {
    match predicate {
        Predicate::Equal => left == right,
        Predicate::NotEqual => left != right,
        Predicate::GreaterThan => left > right,
        Predicate::GreaterThanOrEqual => left >= right,
        Predicate::LessThan => left < right,
        Predicate::LessThanOrEqual => left <= right,
        Predicate::Contains | Predicate::DoesNotContain => false,
    }
}

fn format_number(value: f64) -> String {
    // Integral values render without a trailing ".0" so Contains behaves
    // the way operators expect ("200" matches 200.0)
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;

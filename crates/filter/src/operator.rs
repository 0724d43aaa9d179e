//! The filter operator set

use crate::fields::FieldType;

/// Comparison operator for filter rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Field has a value
    Exists,
    /// Field has no value
    DoesNotExist,
    /// Equality (string, number, or boolean)
    Equals,
    /// Substring match (string)
    Contains,
    /// Prefix match (string)
    StartsWith,
    /// Suffix match (string)
    EndsWith,
    /// Numeric greater-than
    GreaterThan,
    /// Numeric less-than
    LessThan,
}

impl Operator {
    /// Parse an operator from its configuration name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "exists" => Some(Self::Exists),
            "doesNotExist" => Some(Self::DoesNotExist),
            "equals" => Some(Self::Equals),
            "contains" => Some(Self::Contains),
            "startsWith" => Some(Self::StartsWith),
            "endsWith" => Some(Self::EndsWith),
            "greaterThan" => Some(Self::GreaterThan),
            "lessThan" => Some(Self::LessThan),
            _ => None,
        }
    }

    /// Configuration name of the operator
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::DoesNotExist => "doesNotExist",
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
        }
    }

    /// Whether the operator is valid for a field of the given type
    pub fn valid_for(&self, field_type: FieldType) -> bool {
        match self {
            Self::Exists | Self::DoesNotExist | Self::Equals => true,
            Self::Contains | Self::StartsWith | Self::EndsWith => {
                field_type == FieldType::Str
            }
            Self::GreaterThan | Self::LessThan => field_type == FieldType::Num,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips() {
        for name in [
            "exists",
            "doesNotExist",
            "equals",
            "contains",
            "startsWith",
            "endsWith",
            "greaterThan",
            "lessThan",
        ] {
            let op = Operator::parse(name).unwrap();
            assert_eq!(op.name(), name);
        }
        assert!(Operator::parse("regex").is_none());
    }

    #[test]
    fn test_type_validity() {
        assert!(Operator::Contains.valid_for(FieldType::Str));
        assert!(!Operator::Contains.valid_for(FieldType::Num));
        assert!(Operator::GreaterThan.valid_for(FieldType::Num));
        assert!(!Operator::GreaterThan.valid_for(FieldType::Bool));
        assert!(Operator::Equals.valid_for(FieldType::Bool));
        assert!(Operator::Exists.valid_for(FieldType::Bool));
    }
}

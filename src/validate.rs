//! Well-formedness checks over a parsed `StateSchema`.
//!
//! Total and deterministic: the same schema always yields the same verdict,
//! no side effects. The generator assumes its input passed this gate.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ast::{StateSchema, Strictness};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("state set is empty: at least one state is required")]
    EmptyStateSet,

    #[error("duplicate state name `{name}`")]
    DuplicateStateName { name: String },

    #[error("duplicate field name `{name}`")]
    DuplicateFieldName { name: String },

    #[error("name `{name}` collides with another generated identifier")]
    NameCollision { name: String },

    #[error("inconsistent strictness: {detail}")]
    InconsistentStrictness { detail: String },

    #[error("`{name}` is not a usable identifier in generated code")]
    InvalidIdentifier { name: String },
}

// Shape of every identifier that ends up in emitted code. Schemas can be
// built programmatically without going through the lexer, so this is checked
// here rather than trusted from parse.
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rust keywords that would break emitted declarations if used as names.
fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "as" | "break" | "const" | "continue" | "crate" | "dyn" | "else" | "enum"
            | "extern" | "false" | "fn" | "for" | "if" | "impl" | "in" | "let"
            | "loop" | "match" | "mod" | "move" | "mut" | "pub" | "ref" | "return"
            | "self" | "Self" | "static" | "struct" | "super" | "trait" | "true"
            | "type" | "unsafe" | "use" | "where" | "while" | "async" | "await"
            | "abstract" | "become" | "box" | "do" | "final" | "macro" | "override"
            | "priv" | "try" | "typeof" | "unsized" | "virtual" | "yield"
    )
}

/// Check one schema for well-formedness. Read-only; returns the first
/// violation found, in a fixed check order.
pub fn validate(schema: &StateSchema) -> Result<(), SchemaError> {
    if schema.states.is_empty() {
        return Err(SchemaError::EmptyStateSet);
    }

    // unique states
    let mut seen = std::collections::BTreeSet::new();
    for s in &schema.states {
        if !seen.insert(s.as_str()) {
            return Err(SchemaError::DuplicateStateName { name: s.clone() });
        }
    }

    // unique fields, disjoint from states and from the generated phantom slot
    let mut seen_fields = std::collections::BTreeSet::new();
    for f in &schema.fields {
        if !seen_fields.insert(f.name.as_str()) {
            return Err(SchemaError::DuplicateFieldName { name: f.name.clone() });
        }
        if seen.contains(f.name.as_str()) || f.name == crate::codegen::PHANTOM_SLOT {
            return Err(SchemaError::NameCollision { name: f.name.clone() });
        }
    }

    // everything emitted into the generated scope must be pairwise distinct:
    // `mod Idle` next to `struct Idle;` is the same kind of clash as a
    // duplicate field. The state parameter is included so it cannot shadow
    // a marker inside the carrier.
    let mut emitted = std::collections::BTreeSet::new();
    for name in schema
        .states
        .iter()
        .chain(std::iter::once(&schema.carrier_name))
        .chain(std::iter::once(&schema.state_param))
        .chain(schema.bound_name.iter())
        .chain(schema.seal_module.iter())
        .chain(schema.seal_trait.iter())
    {
        if !emitted.insert(name.as_str()) {
            return Err(SchemaError::NameCollision { name: name.clone() });
        }
    }

    check_strictness(schema)?;

    // every identifier that will appear in emitted code
    let idents = std::iter::once(&schema.carrier_name)
        .chain(std::iter::once(&schema.state_param))
        .chain(schema.states.iter())
        .chain(schema.fields.iter().map(|f| &f.name))
        .chain(schema.bound_name.iter())
        .chain(schema.seal_module.iter())
        .chain(schema.seal_trait.iter());
    for name in idents {
        if !IDENT_RE.is_match(name) || is_reserved(name) {
            return Err(SchemaError::InvalidIdentifier { name: name.clone() });
        }
    }

    Ok(())
}

fn check_strictness(schema: &StateSchema) -> Result<(), SchemaError> {
    let seal_present = schema.seal_module.is_some() || schema.seal_trait.is_some();
    match schema.strictness {
        Strictness::Unconstrained => {
            if schema.bound_name.is_some() {
                return Err(SchemaError::InconsistentStrictness {
                    detail: "bound name given but strictness is unconstrained".into(),
                });
            }
            if seal_present {
                return Err(SchemaError::InconsistentStrictness {
                    detail: "sealing names given but strictness is unconstrained".into(),
                });
            }
        }
        Strictness::Constrained => {
            if schema.bound_name.is_none() {
                return Err(SchemaError::InconsistentStrictness {
                    detail: "constrained strictness requires a bound name (default missing)".into(),
                });
            }
            if seal_present {
                return Err(SchemaError::InconsistentStrictness {
                    detail: "sealing names given but strictness is only constrained".into(),
                });
            }
        }
        Strictness::Sealed => {
            if schema.bound_name.is_none()
                || schema.seal_module.is_none()
                || schema.seal_trait.is_none()
            {
                return Err(SchemaError::InconsistentStrictness {
                    detail: "sealed strictness requires bound, seal module and seal trait names"
                        .into(),
                });
            }
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_one;

    #[test]
    fn parsed_drone_example_is_valid() {
        let s = parse_one(
            "sealed pub Drone<S: DroneState>(state_mod::StateLimit)[Idle, Hovering, Flying]{x: float, y: float}",
        )
        .unwrap();
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn empty_state_set_is_rejected() {
        let s = parse_one("Conn<S>[]{}").unwrap();
        assert_eq!(validate(&s), Err(SchemaError::EmptyStateSet));
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let s = parse_one("Conn<S>[Open, Closed, Open]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::DuplicateStateName { name: "Open".into() })
        );
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let s = parse_one("Conn<S>[Open]{ a: int, a: float }").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::DuplicateFieldName { name: "a".into() })
        );
    }

    #[test]
    fn field_named_like_a_state_is_a_collision() {
        let s = parse_one("Conn<S>[Open]{ Open: bool }").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "Open".into() })
        );
    }

    #[test]
    fn carrier_named_like_a_state_is_a_collision() {
        let s = parse_one("Open<S>[Open]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "Open".into() })
        );
    }

    #[test]
    fn field_named_like_the_phantom_slot_is_a_collision() {
        let s = parse_one("Conn<S>[Open]{ _state: int }").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "_state".into() })
        );
    }

    #[test]
    fn seal_module_named_like_a_state_is_a_collision() {
        // would emit `mod Idle` next to `struct Idle;`
        let s = parse_one("sealed Conn<S>(Idle::T)[Idle]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "Idle".into() })
        );
    }

    #[test]
    fn seal_trait_named_like_a_state_is_a_collision() {
        let s = parse_one("sealed Conn<S>(m::Idle)[Idle]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "Idle".into() })
        );
    }

    #[test]
    fn state_param_shadowing_a_state_is_a_collision() {
        let s = parse_one("Conn<S>[S, Open]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::NameCollision { name: "S".into() })
        );
    }

    #[test]
    fn bound_under_unconstrained_is_inconsistent() {
        // no strictness keyword, yet a bound sub-clause was written
        let s = parse_one("Conn<S: ConnState>[Open]{}").unwrap();
        assert!(matches!(
            validate(&s),
            Err(SchemaError::InconsistentStrictness { .. })
        ));
    }

    #[test]
    fn seal_clause_under_constrained_is_inconsistent() {
        let s = parse_one("constrained Conn<S>(m::T)[Open]{}").unwrap();
        assert!(matches!(
            validate(&s),
            Err(SchemaError::InconsistentStrictness { .. })
        ));
    }

    #[test]
    fn reserved_word_state_is_rejected() {
        // `loop` lexes as a plain ident; only the validator knows it's reserved
        let s = parse_one("Conn<S>[Open, Loop, loop]{}").unwrap();
        assert_eq!(
            validate(&s),
            Err(SchemaError::InvalidIdentifier { name: "loop".into() })
        );
    }

    #[test]
    fn verdict_is_deterministic() {
        let s = parse_one("Conn<S>[Open, Open]{}").unwrap();
        assert_eq!(validate(&s), validate(&s));
    }
}

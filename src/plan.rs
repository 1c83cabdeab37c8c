//! Lower a validated `StateSchema` to the ordered list of abstract
//! declarations. This is where the language-agnostic contract ends: `Decl`
//! says *what* to declare, `codegen` decides how that looks in Rust.
//!
//! Emission order is fixed (define-before-use for the carrier):
//!   markers → seal module (if sealed) → bound trait (if any) → carrier.

use indexmap::IndexMap;

use crate::ast::{FieldTy, StateSchema, Visibility};
use crate::policy::policy_for;

/// Abstract declaration artifacts, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// Empty per-state tag type.
    Marker { name: String, visibility: Visibility },
    /// Private module holding the sealing trait, implemented for every state.
    SealModule { module: String, trait_name: String, states: Vec<String> },
    /// The constraint abstraction. `seal` carries the supertrait path when
    /// the schema is sealed.
    BoundTrait {
        name: String,
        visibility: Visibility,
        seal: Option<(String, String)>,
        states: Vec<String>,
    },
    /// The state-parameterized carrier. `bound` is `None` only when
    /// unconstrained; `fields` keep declaration order.
    Carrier {
        name: String,
        visibility: Visibility,
        state_param: String,
        bound: Option<String>,
        fields: IndexMap<String, FieldTy>,
    },
}

/// Plan the emission for one schema.
///
/// The input must already have passed `validate`; feeding an invalid schema
/// here is a contract violation, not a recoverable error. Re-validation is
/// cheap, so debug builds assert it.
pub fn plan(schema: &StateSchema) -> Vec<Decl> {
    debug_assert!(crate::validate::validate(schema).is_ok());

    let policy = policy_for(schema.strictness);
    let mut decls = Vec::with_capacity(schema.states.len() + 3);

    // 1) markers, preserving input order
    for state in &schema.states {
        decls.push(Decl::Marker {
            name: state.clone(),
            visibility: schema.visibility,
        });
    }

    // 2) sealing module
    if policy.emit_seal {
        decls.push(Decl::SealModule {
            module: schema.seal_module.clone().unwrap_or_default(),
            trait_name: schema.seal_trait.clone().unwrap_or_default(),
            states: schema.states.clone(),
        });
    }

    // 3) bound abstraction, supertrait-constrained by the seal when present
    if policy.emit_bound {
        let seal = if policy.emit_seal {
            Some((
                schema.seal_module.clone().unwrap_or_default(),
                schema.seal_trait.clone().unwrap_or_default(),
            ))
        } else {
            None
        };
        decls.push(Decl::BoundTrait {
            name: schema.bound_name.clone().unwrap_or_default(),
            visibility: schema.visibility,
            seal,
            states: schema.states.clone(),
        });
    }

    // 4) carrier last: it references everything above
    let fields: IndexMap<String, FieldTy> = schema
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect();
    decls.push(Decl::Carrier {
        name: schema.carrier_name.clone(),
        visibility: schema.visibility,
        state_param: schema.state_param.clone(),
        bound: if policy.emit_bound { schema.bound_name.clone() } else { None },
        fields,
    });

    decls
}

// ------------------------------- Tests ------------------------------------ //

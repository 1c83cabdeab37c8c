// Strongly-typed schema for codegen. No raw source text past this point
// except the field type descriptors, which stay verbatim until render.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Private,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strictness {
    Unconstrained,
    Constrained,
    Sealed,
}

/// Raw type descriptor as written in the declaration.
///
/// Portable scalar names (`float`, `int`, `uint`, `bool`, `string`) are
/// mapped to Rust types at render time; everything else passes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTy(pub String);

impl FieldTy {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One declared field, in declaration order. Kept as a plain list (not a
/// map) so the validator can still see duplicate names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldTy,
}

/// One typestate-carrying declaration.
///
/// Built once by the parser, immutable afterwards; the validator and the
/// planner only read it. Field order is declaration order (deterministic
/// output).
#[derive(Debug, Clone, Serialize)]
pub struct StateSchema {
    pub carrier_name: String,
    pub state_param: String,
    pub visibility: Visibility,
    pub strictness: Strictness,
    pub states: Vec<String>,
    pub fields: Vec<FieldDecl>,
    /// Constraint trait name; `None` only under `Unconstrained`.
    pub bound_name: Option<String>,
    /// Sealing module/trait; present only under `Sealed`. The trait may be
    /// renamed independently of the module, but renaming the module requires
    /// renaming the trait too (the grammar only accepts the pair together).
    pub seal_module: Option<String>,
    pub seal_trait: Option<String>,
}

impl StateSchema {
    /// Documented default for the bound trait name.
    pub fn default_bound_name(carrier: &str) -> String {
        format!("{carrier}State")
    }

    pub const DEFAULT_SEAL_MODULE: &'static str = "sealed";
    pub const DEFAULT_SEAL_TRAIT: &'static str = "Sealed";

    /// Fill in the documented defaults for whatever the declaration omitted.
    /// Single deterministic pass, run once right after parsing.
    pub fn apply_defaults(&mut self) {
        match self.strictness {
            Strictness::Unconstrained => {
                // names are absent/ignored at this level; validate flags leftovers
            }
            Strictness::Constrained => {
                if self.bound_name.is_none() {
                    self.bound_name = Some(Self::default_bound_name(&self.carrier_name));
                }
            }
            Strictness::Sealed => {
                if self.bound_name.is_none() {
                    self.bound_name = Some(Self::default_bound_name(&self.carrier_name));
                }
                if self.seal_module.is_none() {
                    self.seal_module = Some(Self::DEFAULT_SEAL_MODULE.to_string());
                }
                if self.seal_trait.is_none() {
                    self.seal_trait = Some(Self::DEFAULT_SEAL_TRAIT.to_string());
                }
            }
        }
    }
}

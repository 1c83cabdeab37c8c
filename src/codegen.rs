//! Render abstract declarations as Rust source text.
//!
//! Output is deterministic: the same `Decl` list always renders to the same
//! bytes (no timestamps, no environment). The seal module is emitted private
//! on purpose; the sealing trait being unreachable from outside the generated
//! scope is the whole mechanism.

use crate::ast::Visibility;
use crate::plan::Decl;

/// Name of the generated phantom slot tracking the current state. Reserved:
/// the validator rejects declared fields with this name.
pub const PHANTOM_SLOT: &str = "_state";

/// Portable scalar descriptor names → Rust types. Unknown names pass through
/// verbatim so target-language types (`Vec<f64>`, paths) keep working.
fn map_scalar(ty: &str) -> &str {
    match ty {
        "float" => "f64",
        "int" => "i64",
        "uint" => "u64",
        "bool" => "bool",
        "string" => "String",
        other => other,
    }
}

fn vis_prefix(v: Visibility) -> &'static str {
    match v {
        Visibility::Private => "",
        Visibility::Public => "pub ",
    }
}

pub struct Codegen {
    out: String,
}

impl Codegen {
    pub fn new() -> Self {
        Self { out: String::new() }
    }

    /// Append the rendering of one ordered declaration list. Consecutive
    /// markers stay grouped; everything else gets a blank line between.
    pub fn emit(&mut self, decls: &[Decl]) {
        let mut prev_was_marker = false;
        for decl in decls {
            let is_marker = matches!(decl, Decl::Marker { .. });
            if !self.out.is_empty() && !(prev_was_marker && is_marker) {
                self.out.push('\n');
            }
            self.emit_decl(decl);
            prev_was_marker = is_marker;
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn emit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Marker { name, visibility } => {
                self.line(&format!("{}struct {name};", vis_prefix(*visibility)));
            }
            Decl::SealModule { module, trait_name, states } => {
                // module stays private; `pub` inside is scoped to it
                self.line(&format!("mod {module} {{"));
                self.line(&format!("    pub trait {trait_name} {{}}"));
                self.line("");
                for state in states {
                    self.line(&format!("    impl {trait_name} for super::{state} {{}}"));
                }
                self.line("}");
            }
            Decl::BoundTrait { name, visibility, seal, states } => {
                let vis = vis_prefix(*visibility);
                match seal {
                    Some((module, trait_name)) => {
                        self.line(&format!("{vis}trait {name}: {module}::{trait_name} {{}}"));
                    }
                    None => {
                        self.line(&format!("{vis}trait {name} {{}}"));
                    }
                }
                self.line("");
                for state in states {
                    self.line(&format!("impl {name} for {state} {{}}"));
                }
            }
            Decl::Carrier { name, visibility, state_param, bound, fields } => {
                let vis = vis_prefix(*visibility);
                let params = match bound {
                    Some(bound) => format!("{state_param}: {bound}"),
                    None => state_param.clone(),
                };
                self.line(&format!("{vis}struct {name}<{params}> {{"));
                for (field, ty) in fields {
                    self.line(&format!("    {field}: {},", map_scalar(ty.as_str())));
                }
                self.line(&format!(
                    "    {PHANTOM_SLOT}: core::marker::PhantomData<{state_param}>,"
                ));
                self.line("}");
            }
        }
    }

    fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }
}

/// Full pipeline for one declaration: text → schema → validated → rendered.
pub fn generate_one(src: &str) -> anyhow::Result<String> {
    let schema = crate::parse::parse_one(src)?;
    crate::validate::validate(&schema)?;
    let decls = crate::plan::plan(&schema);
    let mut cg = Codegen::new();
    cg.emit(&decls);
    Ok(cg.into_string())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_end_to_end_matches_expected_source() {
        let src = "sealed pub Drone<S: DroneState>(state_mod::StateLimit)[Idle, Hovering, Flying] { x: float, y: float }";
        let out = generate_one(src).unwrap();
        let expected = "\
pub struct Idle;
pub struct Hovering;
pub struct Flying;

mod state_mod {
    pub trait StateLimit {}

    impl StateLimit for super::Idle {}
    impl StateLimit for super::Hovering {}
    impl StateLimit for super::Flying {}
}

pub trait DroneState: state_mod::StateLimit {}

impl DroneState for Idle {}
impl DroneState for Hovering {}
impl DroneState for Flying {}

pub struct Drone<S: DroneState> {
    x: f64,
    y: f64,
    _state: core::marker::PhantomData<S>,
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn unconstrained_output_has_no_traits_at_all() {
        let out = generate_one("Conn<S>[Open, Closed]{ fd: int }").unwrap();
        assert!(!out.contains("trait"));
        assert!(!out.contains("mod "));
        assert!(out.contains("struct Conn<S> {"));
        assert!(out.contains("fd: i64,"));
    }

    #[test]
    fn constrained_output_bounds_the_carrier_but_emits_no_module() {
        let out = generate_one("constrained Door<St>[Open, Shut]{}").unwrap();
        assert!(out.contains("trait DoorState {}"));
        assert!(out.contains("struct Door<St: DoorState> {"));
        assert!(!out.contains("mod "));
    }

    #[test]
    fn sealing_module_is_never_public() {
        let out = generate_one("sealed Door<St>[Open, Shut]{}").unwrap();
        assert!(out.contains("mod sealed {"));
        assert!(!out.contains("pub mod"));
    }

    #[test]
    fn omitted_bound_name_defaults_to_the_documented_name() {
        let explicit = generate_one("constrained Door<St: DoorState>[Open, Shut]{}").unwrap();
        let defaulted = generate_one("constrained Door<St>[Open, Shut]{}").unwrap();
        assert_eq!(explicit, defaulted);
    }

    #[test]
    fn pipeline_is_idempotent_byte_for_byte() {
        let src = "sealed pub Drone<S>(state_mod::StateLimit)[Idle, Hovering, Flying]{ x: float, y: float }";
        let a = generate_one(src).unwrap();
        let b = generate_one(src).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_state_never_reaches_the_generator() {
        let err = generate_one("Conn<S>[Open, Open]{}").unwrap_err();
        assert!(err.to_string().contains("duplicate state name"));
    }

    #[test]
    fn scalar_descriptors_map_and_unknown_types_pass_through() {
        let out =
            generate_one("Conn<S>[Open]{ a: float, b: int, c: uint, d: bool, e: string, f: Vec<u8> }")
                .unwrap();
        assert!(out.contains("a: f64,"));
        assert!(out.contains("b: i64,"));
        assert!(out.contains("c: u64,"));
        assert!(out.contains("d: bool,"));
        assert!(out.contains("e: String,"));
        assert!(out.contains("f: Vec<u8>,"));
    }

    #[test]
    fn carrier_always_carries_the_phantom_state_slot() {
        let out = generate_one("Conn<S>[Open]{}").unwrap();
        assert!(out.contains("_state: core::marker::PhantomData<S>,"));
    }

    #[test]
    fn declared_field_cannot_take_the_phantom_slot_name() {
        let err = generate_one("Conn<S>[Open]{ _state: int }").unwrap_err();
        assert!(err.to_string().contains("_state"));
        // the valid path emits the slot exactly once
        let out = generate_one("Conn<S>[Open]{ fd: int }").unwrap();
        assert_eq!(out.matches("_state").count(), 1);
    }
}

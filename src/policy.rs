// Decision table for what each strictness level emits. Kept in one place so
// the planner never branches on strictness directly.

use crate::ast::Strictness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictnessPolicy {
    pub emit_bound: bool,
    pub emit_seal: bool,
}

/// Three rows, exhaustive over `Strictness`.
pub fn policy_for(strictness: Strictness) -> StrictnessPolicy {
    match strictness {
        Strictness::Unconstrained => StrictnessPolicy { emit_bound: false, emit_seal: false },
        Strictness::Constrained => StrictnessPolicy { emit_bound: true, emit_seal: false },
        Strictness::Sealed => StrictnessPolicy { emit_bound: true, emit_seal: true },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_the_three_levels() {
        assert_eq!(
            policy_for(Strictness::Unconstrained),
            StrictnessPolicy { emit_bound: false, emit_seal: false }
        );
        assert_eq!(
            policy_for(Strictness::Constrained),
            StrictnessPolicy { emit_bound: true, emit_seal: false }
        );
        assert_eq!(
            policy_for(Strictness::Sealed),
            StrictnessPolicy { emit_bound: true, emit_seal: true }
        );
    }

    #[test]
    fn seal_implies_bound() {
        for s in [Strictness::Unconstrained, Strictness::Constrained, Strictness::Sealed] {
            let p = policy_for(s);
            assert!(!p.emit_seal || p.emit_bound);
        }
    }
}

//! Core traits for RelPlan
//!
//! The reference knowledge base is an external collaborator: the engine
//! only reads it through [`ReferenceCatalog`] and never mutates it.

use crate::catalog::{FailureModeDef, MaterialDef, MechanismDef, TestDef};

/// Read-only access to the static reference knowledge base.
pub trait ReferenceCatalog {
    /// All known mechanisms, in catalog order.
    fn mechanisms(&self) -> &[MechanismDef];

    /// All known tests, in catalog order.
    fn tests(&self) -> &[TestDef];

    /// All known failure modes, in catalog order.
    fn failure_modes(&self) -> &[FailureModeDef];

    /// Material lookup by id.
    fn material(&self, id: &str) -> Option<&MaterialDef>;

    /// Test lookup by id.
    fn test(&self, id: &str) -> Option<&TestDef> {
        self.tests().iter().find(|t| t.id == id)
    }

    /// Mechanism lookup by id.
    fn mechanism(&self, id: &str) -> Option<&MechanismDef> {
        self.mechanisms().iter().find(|m| m.id == id)
    }
}

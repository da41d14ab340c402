//! Core operator registry.

use tessera_core::OperatorRegistry;

use crate::operators::reduction;

/// Returns an operator registry pre-populated with the built-in operators.
///
/// The registry includes:
/// - custom_Reduction (Caffe)
///
/// Additional operators can be added to the returned registry via
/// `registry.register(registration)`.
pub fn core_operator_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();

    registry.register(reduction::registration());

    registry
}

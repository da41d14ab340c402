//! Custom operator implementations for Tessera.
//!
//! Each operator provides the three plugin stages (parameter translation,
//! shape/type inference, kernel build) and an [`OpRegistration`] tying them
//! to its source framework and operator type.
//!
//! # Operators
//!
//! - **custom_Reduction** (Caffe): SUM, ASUM, SUMSQ, MEAN over all
//!   dimensions from an axis onward, scaled by a coefficient.
//!
//! [`OpRegistration`]: tessera_core::OpRegistration

pub mod operators;

mod registry;

pub use operators::reduction::{self, ReductionOperation};
pub use registry::core_operator_registry;

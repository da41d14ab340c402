//! Individual custom operators.

pub mod reduction;

//! Core operator abstractions for Tessera custom operator plugins.
//!
//! This crate provides the pieces every plugin stage works against:
//! - Generic operator records with a typed attribute set (`OpRecord`)
//! - Tensor descriptors and the closed `DataType` enumeration
//! - Stage context with soft-failure diagnostics (`StageCtx`, `Diagnostics`)
//! - The registration table mapping (framework, operator type) to stage
//!   functions (`OperatorRegistry`)
//! - A pipeline driver that runs the stages in order (`Pipeline`)

pub mod attr;
pub mod config;
pub mod context;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod types;

pub use attr::AttributeValue;
pub use config::{AxisCompensation, BuildConfig};
pub use context::{BuildEnv, Diagnostics, StageCtx, Warning};
pub use pipeline::{OperatorOutcome, Pipeline};
pub use record::{AttrError, OpRecord};
pub use registry::{
    BuildKernelFn, Framework, ImplyType, InferShapeFn, OpRegistration, OperatorRegistry,
    ParseParamsFn, RegistryKey,
};
pub use types::{DataType, TensorDesc, TensorFormat};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for plugin stages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Layer '{layer}' is not a {expected} layer")]
    ParameterTypeMismatch { layer: String, expected: String },

    #[error("Unknown operation kind {value} in layer '{layer}'")]
    UnknownOperationKind { layer: String, value: i32 },

    #[error("Invalid axis {axis} for tensor of rank {rank}")]
    InvalidAxis { axis: i64, rank: usize },

    #[error("Unsupported input rank {rank} (expected {expected})")]
    UnsupportedRank { rank: usize, expected: usize },

    #[error("Input {index} out of range (operator has {count} inputs)")]
    MissingInput { index: usize, count: usize },

    #[error("No operator registered for {framework} type '{op_type}'")]
    UnregisteredOperator { framework: Framework, op_type: String },

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error(transparent)]
    Attribute(#[from] AttrError),

    #[error(transparent)]
    Codegen(#[from] tessera_codegen::CodegenError),
}

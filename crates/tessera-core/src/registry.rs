//! Registration table for custom operator plugins.
//!
//! Each plugin contributes an [`OpRegistration`]: the three stage functions
//! plus the identifiers the host dispatches on. The registry is an explicit
//! value owned by the host, keyed by source framework and source operator
//! type.

use crate::Result;
use crate::context::{BuildEnv, StageCtx};
use crate::record::OpRecord;
use crate::types::TensorDesc;
use std::collections::HashMap;
use std::fmt;
use tessera_caffe::LayerParameter;
use tessera_codegen::KernelBuildResult;

/// Translate source-layer parameters into the operator's attribute set.
pub type ParseParamsFn = fn(&LayerParameter, &mut OpRecord) -> Result<()>;

/// Infer output tensor descriptors from the attributes and inputs.
pub type InferShapeFn = fn(&mut StageCtx<'_>) -> Result<Vec<TensorDesc>>;

/// Build the operator's kernel and report where its artifacts live.
pub type BuildKernelFn = fn(&mut StageCtx<'_>, &BuildEnv<'_>) -> Result<KernelBuildResult>;

/// Source model framework an operator is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    Caffe,
    Tensorflow,
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framework::Caffe => f.write_str("caffe"),
            Framework::Tensorflow => f.write_str("tensorflow"),
        }
    }
}

/// How the operator's kernel is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplyType {
    /// Kernel generated through the TVM-based tensor engine.
    Tvm,
    /// Hand-written CCE kernel.
    Cce,
    /// Kernel executed on the AI CPU.
    AiCpu,
}

/// Key the host dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub framework: Framework,
    pub op_type: String,
}

/// Everything the host needs to process one custom operator type.
#[derive(Debug, Clone)]
pub struct OpRegistration {
    /// Operator type in the generated offline model.
    pub om_op_type: &'static str,

    /// Source framework of the operator.
    pub framework: Framework,

    /// Operator type in the source framework (case sensitive).
    pub origin_op_type: &'static str,

    /// Kernel implementation kind.
    pub imply_type: ImplyType,

    pub parse_params: ParseParamsFn,
    pub infer_shape_and_type: InferShapeFn,
    pub build_kernel: BuildKernelFn,
}

impl OpRegistration {
    /// Registry key of this registration.
    pub fn key(&self) -> RegistryKey {
        RegistryKey {
            framework: self.framework,
            op_type: self.origin_op_type.to_string(),
        }
    }
}

/// Registry of custom operator registrations.
///
/// # Example
///
/// ```ignore
/// let mut registry = OperatorRegistry::new();
/// registry.register(reduction::registration());
///
/// let reg = registry.get(Framework::Caffe, "custom_Reduction").unwrap();
/// (reg.parse_params)(&layer, &mut record)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<RegistryKey, OpRegistration>,
}

impl OperatorRegistry {
    /// Create a new empty operator registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator.
    ///
    /// A second registration for the same framework and operator type
    /// replaces the first. Returns `self` for method chaining.
    pub fn register(&mut self, registration: OpRegistration) -> &mut Self {
        let key = registration.key();
        if let Some(previous) = self.operators.insert(key, registration) {
            tracing::warn!(
                framework = %previous.framework,
                op_type = previous.origin_op_type,
                "replacing existing operator registration"
            );
        }
        self
    }

    /// Look up a registration by framework and source operator type.
    pub fn get(&self, framework: Framework, op_type: &str) -> Option<&OpRegistration> {
        self.operators.get(&RegistryKey {
            framework,
            op_type: op_type.to_string(),
        })
    }

    /// Check if an operator type is registered for the framework.
    pub fn contains(&self, framework: Framework, op_type: &str) -> bool {
        self.get(framework, op_type).is_some()
    }

    /// Get the number of registered operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Iterate over all registrations.
    pub fn registrations(&self) -> impl Iterator<Item = &OpRegistration> {
        self.operators.values()
    }
}

//! Per-stage context and soft-failure diagnostics.
//!
//! `StageCtx` gives a stage read access to the operator record and the input
//! tensor descriptors. Attribute reads that fall back to a default are
//! recorded as [`Warning`]s instead of aborting the stage.

use crate::attr::AttributeValue;
use crate::config::BuildConfig;
use crate::record::{AttrError, OpRecord};
use crate::types::TensorDesc;
use crate::{Error, Result};
use std::fmt;
use tessera_codegen::KernelBackend;

/// A non-fatal condition raised while running a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// An attribute could not be read and a default was substituted.
    MissingAttribute {
        op: String,
        name: String,
        default: String,
        reason: AttrError,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingAttribute {
                op,
                name,
                default,
                reason,
            } => write!(
                f,
                "{op}: attribute '{name}' unavailable ({reason}), using default {default}"
            ),
        }
    }
}

/// Warnings collected over one or more stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }
}

/// Context passed to shape inference and kernel build stages.
pub struct StageCtx<'a> {
    /// The operator being processed.
    pub op: &'a OpRecord,

    /// Input tensor descriptors, owned by the host.
    pub inputs: &'a [TensorDesc],

    diagnostics: Diagnostics,
}

impl<'a> StageCtx<'a> {
    /// Create a new stage context.
    pub fn new(op: &'a OpRecord, inputs: &'a [TensorDesc]) -> Self {
        Self {
            op,
            inputs,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Get the input descriptor for the given index.
    pub fn input(&self, index: usize) -> Result<&'a TensorDesc> {
        self.inputs.get(index).ok_or(Error::MissingInput {
            index,
            count: self.inputs.len(),
        })
    }

    /// Get a required typed attribute.
    pub fn attr<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<AttributeValue, Error = String>,
    {
        Ok(self.op.attr(name)?)
    }

    /// Get a typed attribute, substituting `default` when it cannot be read.
    ///
    /// The substitution is logged and recorded as a
    /// [`Warning::MissingAttribute`].
    pub fn attr_or<T>(&mut self, name: &str, default: T) -> T
    where
        T: TryFrom<AttributeValue, Error = String> + fmt::Debug,
    {
        match self.op.attr(name) {
            Ok(value) => value,
            Err(reason) => {
                tracing::warn!(
                    op = %self.op.name,
                    attribute = name,
                    default = ?default,
                    %reason,
                    "attribute unavailable, using default"
                );
                self.diagnostics.push(Warning::MissingAttribute {
                    op: self.op.name.clone(),
                    name: name.to_string(),
                    default: format!("{default:?}"),
                    reason,
                });
                default
            }
        }
    }

    /// Warnings recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consume the context, returning its warnings.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// Environment of the kernel build stage: host configuration and backend.
#[derive(Clone, Copy)]
pub struct BuildEnv<'a> {
    pub config: &'a BuildConfig,
    pub backend: &'a dyn KernelBackend,
}

impl<'a> BuildEnv<'a> {
    pub fn new(config: &'a BuildConfig, backend: &'a dyn KernelBackend) -> Self {
        Self { config, backend }
    }
}

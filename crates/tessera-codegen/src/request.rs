//! Kernel build requests and results.

use crate::error::{CodegenError, Result};
use crate::signature::{ArgKind, CallSignature, SignatureItem};
use serde::Serialize;
use std::path::PathBuf;

/// A positional argument passed to a kernel build function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KernelArg {
    Int(i64),
    Str(String),
    Float(f32),
    Bool(bool),
}

impl KernelArg {
    /// Signature kind of this argument.
    pub fn kind(&self) -> ArgKind {
        match self {
            KernelArg::Int(_) => ArgKind::Int,
            KernelArg::Str(_) => ArgKind::Str,
            KernelArg::Float(_) => ArgKind::Float,
            KernelArg::Bool(_) => ArgKind::Bool,
        }
    }
}

impl From<i64> for KernelArg {
    fn from(value: i64) -> Self {
        KernelArg::Int(value)
    }
}

impl From<&str> for KernelArg {
    fn from(value: &str) -> Self {
        KernelArg::Str(value.to_string())
    }
}

impl From<String> for KernelArg {
    fn from(value: String) -> Self {
        KernelArg::Str(value)
    }
}

impl From<f32> for KernelArg {
    fn from(value: f32) -> Self {
        KernelArg::Float(value)
    }
}

impl From<bool> for KernelArg {
    fn from(value: bool) -> Self {
        KernelArg::Bool(value)
    }
}

/// A request to build one kernel through a code-generation backend.
///
/// Constructed fresh for every operator instance. The positional arguments
/// are checked against the call signature when the request is created, so a
/// backend never sees a mismatched call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelBuildRequest {
    /// Backend version tag supplied by the host.
    pub ddk_version: String,

    /// Name of the operator instance being built.
    pub op_name: String,

    /// Canonical path of the kernel module, without extension.
    pub module_path: PathBuf,

    /// Function inside the module that builds the kernel.
    pub func_name: String,

    /// Positional call signature of `func_name`.
    pub signature: CallSignature,

    /// Flattened positional arguments, in signature order.
    pub args: Vec<KernelArg>,
}

impl KernelBuildRequest {
    /// Create a request, validating `args` against `signature`.
    pub fn new(
        ddk_version: impl Into<String>,
        op_name: impl Into<String>,
        module_path: PathBuf,
        func_name: impl Into<String>,
        signature: CallSignature,
        args: Vec<KernelArg>,
    ) -> Result<Self> {
        let expected = signature.flat_kinds();
        if expected.len() != args.len() {
            return Err(CodegenError::SignatureMismatch {
                signature: signature.to_string(),
                message: format!("expected {} arguments, got {}", expected.len(), args.len()),
            });
        }
        for (index, (kind, arg)) in expected.iter().zip(&args).enumerate() {
            if *kind != arg.kind() {
                return Err(CodegenError::SignatureMismatch {
                    signature: signature.to_string(),
                    message: format!(
                        "argument {index} should be '{}', got '{}'",
                        kind.code(),
                        arg.kind().code()
                    ),
                });
            }
        }

        Ok(Self {
            ddk_version: ddk_version.into(),
            op_name: op_name.into(),
            module_path,
            func_name: func_name.into(),
            signature,
            args,
        })
    }

    /// Group the flattened arguments by signature parameter.
    ///
    /// Each entry holds the arguments of one parameter: a single element for
    /// scalars, several for tuple parameters.
    pub fn grouped_args(&self) -> Vec<(&SignatureItem, &[KernelArg])> {
        let mut groups = Vec::with_capacity(self.signature.items().len());
        let mut offset = 0;
        for item in self.signature.items() {
            let end = offset + item.arity();
            groups.push((item, &self.args[offset..end]));
            offset = end;
        }
        groups
    }
}

/// Derive a kernel name from an operator literal and the input dimensions.
///
/// The name is the build cache key: `<literal>_<d0>_<d1>_..._<dn>`.
pub fn kernel_name(op_literal: &str, dims: &[usize]) -> String {
    let mut name = op_literal.to_string();
    for dim in dims {
        name.push('_');
        name.push_str(&dim.to_string());
    }
    name
}

/// Locations of the artifacts produced by a kernel build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelBuildResult {
    /// Compiled kernel binary.
    pub bin_file_path: String,

    /// Build metadata (JSON).
    pub json_file_path: String,
}

impl KernelBuildResult {
    /// Artifact paths for `kernel_name` under `meta_dir`.
    pub fn for_kernel(meta_dir: &str, kernel_name: &str) -> Self {
        let meta_dir = meta_dir.trim_end_matches('/');
        Self {
            bin_file_path: format!("{meta_dir}/{kernel_name}.o"),
            json_file_path: format!("{meta_dir}/{kernel_name}.json"),
        }
    }
}

//! Code-generation backends that turn build requests into kernels.

use crate::error::{CodegenError, Result};
use crate::request::{KernelArg, KernelBuildRequest};
use crate::signature::SignatureItem;
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Mutex, PoisonError};

/// A backend able to build kernels from requests.
///
/// The backend writes its artifacts wherever its toolchain puts them; the
/// caller derives the artifact paths from the kernel name.
pub trait KernelBackend: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Build the kernel described by `request`.
    fn build(&self, request: &KernelBuildRequest) -> Result<()>;
}

/// Backend that only logs requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunBackend;

impl KernelBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn build(&self, request: &KernelBuildRequest) -> Result<()> {
        tracing::info!(
            op = %request.op_name,
            module = %request.module_path.display(),
            func = %request.func_name,
            signature = %request.signature,
            args = ?request.args,
            "skipping kernel build"
        );
        Ok(())
    }
}

/// Backend that remembers every request it receives.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    requests: Mutex<Vec<KernelBuildRequest>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<KernelBuildRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KernelBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn build(&self, request: &KernelBuildRequest) -> Result<()> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }
}

/// Backend that calls the kernel's Python build function.
///
/// The module directory is put on `sys.path`, the module is imported, and
/// the build function is called with the request's arguments grouped as the
/// signature describes.
#[derive(Debug, Clone)]
pub struct PythonBackend {
    interpreter: PathBuf,
}

impl PythonBackend {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Render the Python script that performs the build call.
    pub fn render_script(&self, request: &KernelBuildRequest) -> Result<String> {
        let module_dir = request
            .module_path
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module_name = request
            .module_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CodegenError::BackendFailed {
                backend: self.name().to_string(),
                message: format!("module path {} has no file name", request.module_path.display()),
            })?;

        let params: Vec<String> = request
            .grouped_args()
            .into_iter()
            .map(|(item, args)| match item {
                SignatureItem::Single(_) => python_literal(&args[0]),
                SignatureItem::Tuple(_) => {
                    let inner: Vec<String> = args.iter().map(python_literal).collect();
                    format!("({})", inner.join(", "))
                }
            })
            .collect();

        Ok(format!(
            "import sys\nsys.path.insert(0, {dir})\nfrom {module} import {func}\n{func}({params})\n",
            dir = python_str(&module_dir),
            module = module_name,
            func = request.func_name,
            params = params.join(", "),
        ))
    }
}

impl Default for PythonBackend {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl KernelBackend for PythonBackend {
    fn name(&self) -> &str {
        "python"
    }

    #[tracing::instrument(skip_all, fields(op = %request.op_name, func = %request.func_name))]
    fn build(&self, request: &KernelBuildRequest) -> Result<()> {
        let script = self.render_script(request)?;
        tracing::debug!(%script, "running python kernel build");

        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(&script)
            .env("DDK_VERSION", &request.ddk_version)
            .output()?;

        if !output.status.success() {
            return Err(CodegenError::BackendFailed {
                backend: self.name().to_string(),
                message: format!(
                    "{} exited with {}: {}",
                    self.interpreter.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

fn python_str(value: &str) -> String {
    // JSON string escapes are a subset of Python's
    serde_json::Value::String(value.to_string()).to_string()
}

fn python_literal(arg: &KernelArg) -> String {
    match arg {
        KernelArg::Int(v) => v.to_string(),
        KernelArg::Str(v) => python_str(v),
        KernelArg::Float(v) if v.is_nan() => "float('nan')".to_string(),
        KernelArg::Float(v) if v.is_infinite() => {
            if *v > 0.0 {
                "float('inf')".to_string()
            } else {
                "float('-inf')".to_string()
            }
        }
        // Python floats are doubles
        KernelArg::Float(v) => format!("{:?}", f64::from(*v)),
        KernelArg::Bool(true) => "True".to_string(),
        KernelArg::Bool(false) => "False".to_string(),
    }
}

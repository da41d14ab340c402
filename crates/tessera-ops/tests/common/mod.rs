//! Common test utilities for operator tests.
//!
//! Kernel builds resolve their module relative to the working directory, so
//! each test gets a scratch tree:
//!
//! ```text
//! <tmp>/work/                          <- working_dir
//! <tmp>/operator/custom_Reduction.py   <- kernel module
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tessera_caffe::{CustomReductionParameter, LayerParameter, ReductionOp};
use tessera_core::{BuildConfig, DataType, TensorDesc};

pub struct KernelWorkspace {
    root: TempDir,
}

impl KernelWorkspace {
    /// Create a workspace with the reduction kernel module in place.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(root.path().join("work")).expect("create work dir");
        fs::create_dir_all(root.path().join("operator")).expect("create operator dir");
        fs::write(
            root.path().join("operator").join("custom_Reduction.py"),
            "def custom_Reduction(*args):\n    pass\n",
        )
        .expect("write kernel module");
        Self { root }
    }

    /// Create a workspace without the kernel module.
    pub fn without_module() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(root.path().join("work")).expect("create work dir");
        Self { root }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// Canonical module path as the backend should receive it.
    pub fn module_path(&self) -> PathBuf {
        self.root
            .path()
            .join("operator")
            .canonicalize()
            .expect("canonicalize operator dir")
            .join("custom_Reduction")
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn config(&self) -> BuildConfig {
        BuildConfig {
            ddk_version: "1.3.T21".to_string(),
            working_dir: Some(self.work_dir()),
            ..Default::default()
        }
    }
}

/// A custom_Reduction layer with the given parameters.
pub fn reduction_layer(name: &str, operation: ReductionOp, axis: i32, coeff: f32) -> LayerParameter {
    let mut param = CustomReductionParameter::default();
    param.set_operation(operation);
    param.axis = Some(axis);
    param.coeff = Some(coeff);
    LayerParameter::new(name, "custom_Reduction").with_custom_reduction(param)
}

pub fn input(shape: &[usize]) -> Vec<TensorDesc> {
    vec![TensorDesc::new(shape.to_vec(), DataType::Float).with_name("data")]
}

//! Host-supplied configuration for kernel builds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the kernel build stage treats a negative stored axis.
///
/// Models are padded to four dimensions upstream, so shape inference shifts
/// negative axes by two before resolving them. Deployed kernels expect the
/// stored axis unshifted (`AsObserved`); `Compensate` applies the shift in
/// the kernel build stage too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisCompensation {
    /// Pass the stored axis through unchanged.
    #[default]
    AsObserved,

    /// Subtract two from a negative stored axis.
    Compensate,
}

/// Configuration shared by all kernel builds of one host run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Backend version tag forwarded in every build request.
    pub ddk_version: String,

    /// Directory kernel module paths are resolved against.
    /// Defaults to the process working directory.
    pub working_dir: Option<PathBuf>,

    /// Directory the backend writes kernel artifacts to.
    pub kernel_meta_dir: String,

    /// Negative axis handling in the kernel build stage.
    pub kernel_axis_compensation: AxisCompensation,

    /// Interpreter used by the Python backend.
    pub python: PathBuf,
}

impl BuildConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            ddk_version: "unknown".to_string(),
            working_dir: None,
            kernel_meta_dir: "./kernel_meta".to_string(),
            kernel_axis_compensation: AxisCompensation::default(),
            python: PathBuf::from("python3"),
        }
    }
}

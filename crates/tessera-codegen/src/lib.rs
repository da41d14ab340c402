//! Kernel build requests and code-generation backends for Tessera.
//!
//! Operators describe the kernel they need as a [`KernelBuildRequest`]: a
//! module and function to call, a positional [`CallSignature`], and the
//! arguments. A [`KernelBackend`] performs the build, and the artifact paths
//! follow from the kernel name alone ([`KernelBuildResult::for_kernel`]), so
//! repeated builds of the same shape reuse the same files.
//!
//! # Example
//!
//! ```
//! use tessera_codegen::{KernelBuildResult, kernel_name};
//!
//! let name = kernel_name("custom_Reduction", &[2, 3, 4, 4]);
//! let result = KernelBuildResult::for_kernel("./kernel_meta", &name);
//! assert_eq!(result.bin_file_path, "./kernel_meta/custom_Reduction_2_3_4_4.o");
//! ```

pub mod backend;
pub mod error;
pub mod module;
pub mod request;
pub mod signature;

pub use backend::{DryRunBackend, KernelBackend, PythonBackend, RecordingBackend};
pub use error::{CodegenError, Result};
pub use module::resolve_module_path;
pub use request::{KernelArg, KernelBuildRequest, KernelBuildResult, kernel_name};
pub use signature::{ArgKind, CallSignature, SignatureItem};

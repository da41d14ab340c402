//! Host-side driver that runs the plugin stages in order.
//!
//! For each operator instance the stages run as:
//! 1. **Parameter translation** - source layer to attribute set
//! 2. **Shape/type inference** - attributes and inputs to output descriptors
//! 3. **Kernel build** - attributes and inputs to kernel artifacts
//!
//! The operator record is only mutated in stage 1; later stages borrow it.

use crate::config::BuildConfig;
use crate::context::{BuildEnv, Diagnostics, StageCtx};
use crate::record::OpRecord;
use crate::registry::{Framework, OperatorRegistry};
use crate::types::TensorDesc;
use crate::{Error, Result};
use tessera_caffe::{LayerParameter, NetParameter};
use tessera_codegen::{KernelBackend, KernelBuildResult};

/// Everything produced for one operator instance.
#[derive(Debug, Clone)]
pub struct OperatorOutcome {
    /// Operator record with translated attributes.
    pub record: OpRecord,

    /// Inferred output descriptors.
    pub outputs: Vec<TensorDesc>,

    /// Kernel artifact locations.
    pub build: KernelBuildResult,

    /// Soft failures raised by any stage.
    pub diagnostics: Diagnostics,
}

/// Runs registered operators through all three stages.
pub struct Pipeline<'r> {
    registry: &'r OperatorRegistry,
    config: BuildConfig,
}

impl<'r> Pipeline<'r> {
    pub fn new(registry: &'r OperatorRegistry, config: BuildConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Process one source layer.
    #[tracing::instrument(skip_all, fields(layer = layer.name(), op_type = layer.r#type()))]
    pub fn run(
        &self,
        framework: Framework,
        layer: &LayerParameter,
        inputs: &[TensorDesc],
        backend: &dyn KernelBackend,
    ) -> Result<OperatorOutcome> {
        let registration = self
            .registry
            .get(framework, layer.r#type())
            .ok_or_else(|| Error::UnregisteredOperator {
                framework,
                op_type: layer.r#type().to_string(),
            })?;

        let mut record = OpRecord::new(layer.name(), registration.om_op_type);
        {
            let _span = tracing::debug_span!("parse_params").entered();
            (registration.parse_params)(layer, &mut record)?;
        }

        let mut diagnostics = Diagnostics::new();

        let outputs = {
            let _span = tracing::debug_span!("infer_shape_and_type").entered();
            let mut ctx = StageCtx::new(&record, inputs);
            let outputs = (registration.infer_shape_and_type)(&mut ctx)?;
            diagnostics.extend(ctx.into_diagnostics());
            outputs
        };

        let build = {
            let _span = tracing::debug_span!("build_kernel", backend = backend.name()).entered();
            let env = BuildEnv::new(&self.config, backend);
            let mut ctx = StageCtx::new(&record, inputs);
            let build = (registration.build_kernel)(&mut ctx, &env)?;
            diagnostics.extend(ctx.into_diagnostics());
            build
        };

        tracing::info!(
            bin = %build.bin_file_path,
            warnings = diagnostics.len(),
            "operator processed"
        );

        Ok(OperatorOutcome {
            record,
            outputs,
            build,
            diagnostics,
        })
    }

    /// Process every registered layer of a network, in layer order.
    ///
    /// `inputs_for` supplies the input descriptors of each layer. Layers
    /// whose type is not registered are skipped. The first failing layer
    /// aborts the run.
    #[tracing::instrument(skip_all, fields(net = net.name(), layers = net.layer.len()))]
    pub fn run_model<F>(
        &self,
        framework: Framework,
        net: &NetParameter,
        mut inputs_for: F,
        backend: &dyn KernelBackend,
    ) -> Result<Vec<OperatorOutcome>>
    where
        F: FnMut(&LayerParameter) -> Vec<TensorDesc>,
    {
        let mut outcomes = Vec::new();
        for layer in &net.layer {
            if !self.registry.contains(framework, layer.r#type()) {
                tracing::debug!(layer = layer.name(), op_type = layer.r#type(), "skipping layer");
                continue;
            }
            let inputs = inputs_for(layer);
            outcomes.push(self.run(framework, layer, &inputs, backend)?);
        }
        Ok(outcomes)
    }
}

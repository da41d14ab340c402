//! custom_Reduction operator implementation.
//!
//! Reduces every dimension from `axis` to the last one, optionally scaling
//! the result by `coeff`.
//!
//! **Caffe layer:** `custom_Reduction`, parameters in `custom_reduction_param`
//! - operation (enum, default=SUM) - SUM, ASUM, SUMSQ or MEAN
//! - axis (int32, default=0) - first reduced axis
//! - coeff (float, default=1.0) - output scale
//!
//! **Offline model type:** `custom_reduction_param`
//!
//! **Kernel:** generated by the Python module `../operator/custom_Reduction.py`
//! (relative to the working directory), one kernel per 4-D input shape.

use std::fmt;
use std::str::FromStr;

use tessera_caffe::{LayerParameter, ReductionOp};
use tessera_codegen::{
    CallSignature, KernelArg, KernelBuildRequest, KernelBuildResult, kernel_name,
    resolve_module_path,
};
use tessera_core::{
    AxisCompensation, BuildEnv, Error, Framework, ImplyType, OpRecord, OpRegistration, Result,
    StageCtx, TensorDesc,
};

/// Operator type in the generated offline model.
pub const OM_OP_TYPE: &str = "custom_reduction_param";

/// Layer type in Caffe models, also the kernel name prefix.
pub const ORIGIN_OP_TYPE: &str = "custom_Reduction";

/// Positional signature of the kernel build function.
pub const CALL_SIGNATURE: &str = "(i,i,i,i),s, i, s, f, s,O";

const FUNC_NAME: &str = "custom_Reduction";
const MODULE_PATH: &str = "../operator/custom_Reduction";
const MODULE_EXTENSION: &str = "py";

/// Models are padded to 4-D upstream; the source layer had two fewer dims.
const PADDED_AXIS_SHIFT: i64 = 2;

const KERNEL_RANK: usize = 4;

/// Reduction kind, as stored in the `operation` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionOperation {
    Sum,
    Asum,
    Sumsq,
    Mean,
}

impl ReductionOperation {
    pub const ALL: [ReductionOperation; 4] = [
        ReductionOperation::Sum,
        ReductionOperation::Asum,
        ReductionOperation::Sumsq,
        ReductionOperation::Mean,
    ];

    /// Attribute string passed to the kernel.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionOperation::Sum => "SUM",
            ReductionOperation::Asum => "ASUM",
            ReductionOperation::Sumsq => "SUMSQ",
            ReductionOperation::Mean => "MEAN",
        }
    }

    pub fn from_proto(op: ReductionOp) -> Self {
        match op {
            ReductionOp::Sum => ReductionOperation::Sum,
            ReductionOp::Asum => ReductionOperation::Asum,
            ReductionOp::Sumsq => ReductionOperation::Sumsq,
            ReductionOp::Mean => ReductionOperation::Mean,
        }
    }

    pub fn to_proto(self) -> ReductionOp {
        match self {
            ReductionOperation::Sum => ReductionOp::Sum,
            ReductionOperation::Asum => ReductionOp::Asum,
            ReductionOperation::Sumsq => ReductionOp::Sumsq,
            ReductionOperation::Mean => ReductionOp::Mean,
        }
    }
}

impl fmt::Display for ReductionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ReductionOperation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown reduction operation '{s}'"))
    }
}

/// Registration tying the three stages to the Caffe layer type.
pub fn registration() -> OpRegistration {
    OpRegistration {
        om_op_type: OM_OP_TYPE,
        framework: Framework::Caffe,
        origin_op_type: ORIGIN_OP_TYPE,
        imply_type: ImplyType::Tvm,
        parse_params,
        infer_shape_and_type,
        build_kernel,
    }
}

/// Translate the Caffe layer parameters into `coeff`, `axis` and `operation`.
///
/// A layer without a `custom_reduction_param` block takes the declared
/// defaults. Nothing is written unless every parameter is valid.
pub fn parse_params(layer: &LayerParameter, op: &mut OpRecord) -> Result<()> {
    if layer.r#type() != ORIGIN_OP_TYPE {
        return Err(Error::ParameterTypeMismatch {
            layer: layer.name().to_string(),
            expected: ORIGIN_OP_TYPE.to_string(),
        });
    }
    let param = layer.custom_reduction_param.clone().unwrap_or_default();

    let raw_operation = param.operation.unwrap_or(ReductionOp::Sum as i32);
    let operation = ReductionOp::try_from(raw_operation)
        .map(ReductionOperation::from_proto)
        .map_err(|_| Error::UnknownOperationKind {
            layer: layer.name().to_string(),
            value: raw_operation,
        })?;

    op.set_attr("coeff", param.coeff());
    op.set_attr("axis", i64::from(param.axis()));
    op.set_attr("operation", operation.as_str());

    tracing::debug!(
        op = %op.name,
        coeff = param.coeff(),
        axis = param.axis(),
        %operation,
        "translated reduction parameters"
    );
    Ok(())
}

/// Resolve a stored axis against a tensor of rank `rank`.
///
/// A negative axis is first shifted by two to undo the 4-D padding, then
/// counted from the end. The result is never clamped.
pub fn normalize_axis(axis: i64, rank: usize) -> Result<usize> {
    let invalid = |axis| Error::InvalidAxis { axis, rank };
    let rank_i64 = rank as i64;
    let mut resolved = axis;
    if resolved < 0 {
        resolved = resolved
            .checked_sub(PADDED_AXIS_SHIFT)
            .ok_or_else(|| invalid(axis))?;
    }
    if resolved < 0 {
        resolved += rank_i64;
    }
    if resolved < 0 || resolved >= rank_i64 {
        return Err(invalid(resolved));
    }
    Ok(resolved as usize)
}

/// Infer the single output: input 0 with every dimension from `axis` set to 1.
#[tracing::instrument(skip_all, fields(op = %ctx.op.name))]
pub fn infer_shape_and_type(ctx: &mut StageCtx<'_>) -> Result<Vec<TensorDesc>> {
    let input = ctx.input(0)?;
    let axis = ctx.attr_or("axis", -1i64);
    let axis = normalize_axis(axis, input.rank())?;

    let mut output = input.clone();
    for dim in &mut output.shape[axis..] {
        *dim = 1;
    }

    tracing::debug!(axis, shape = ?output.shape, "inferred reduction output");
    Ok(vec![output])
}

/// Axis value forwarded to the kernel build function.
pub fn kernel_axis(stored: i64, compensation: AxisCompensation) -> i64 {
    match compensation {
        AxisCompensation::AsObserved => stored,
        AxisCompensation::Compensate if stored < 0 => stored.saturating_sub(PADDED_AXIS_SHIFT),
        AxisCompensation::Compensate => stored,
    }
}

/// Kernel name for a 4-D input shape, e.g. `custom_Reduction_2_3_4_4`.
pub fn reduction_kernel_name(dims: [usize; KERNEL_RANK]) -> String {
    kernel_name(ORIGIN_OP_TYPE, &dims)
}

/// Request a kernel build for input 0 and return its artifact paths.
///
/// Unreadable attributes fall back to `coeff=1.0`, `axis=0`,
/// `operation="SUM"` with a warning. Unlike shape inference, the axis is
/// not validated here; the kernel receives it as stored.
#[tracing::instrument(skip_all, fields(op = %ctx.op.name, backend = env.backend.name()))]
pub fn build_kernel(ctx: &mut StageCtx<'_>, env: &BuildEnv<'_>) -> Result<KernelBuildResult> {
    let coeff = ctx.attr_or("coeff", 1.0f32);
    let stored_axis = ctx.attr_or("axis", 0i64);
    let axis = kernel_axis(stored_axis, env.config.kernel_axis_compensation);
    let operation = ctx.attr_or("operation", ReductionOperation::Sum.as_str().to_string());

    let input = ctx.input(0)?;
    let dims: [usize; KERNEL_RANK] = input
        .shape
        .as_slice()
        .try_into()
        .map_err(|_| Error::UnsupportedRank {
            rank: input.rank(),
            expected: KERNEL_RANK,
        })?;

    let kernel = reduction_kernel_name(dims);
    let module_path = resolve_module_path(
        env.config.working_dir.as_deref(),
        MODULE_PATH,
        MODULE_EXTENSION,
    )?;
    tracing::debug!(%kernel, module = %module_path.display(), "prepared kernel build");

    let mut args: Vec<KernelArg> = dims.iter().map(|&dim| KernelArg::Int(dim as i64)).collect();
    args.extend([
        KernelArg::from(input.dtype.as_str()),
        KernelArg::from(axis),
        KernelArg::from(operation),
        KernelArg::from(coeff),
        KernelArg::from(kernel.as_str()),
        KernelArg::from(true),
    ]);

    let request = KernelBuildRequest::new(
        env.config.ddk_version.as_str(),
        ctx.op.name.as_str(),
        module_path,
        FUNC_NAME,
        CallSignature::parse(CALL_SIGNATURE)?,
        args,
    )?;
    env.backend.build(&request)?;

    Ok(KernelBuildResult::for_kernel(&env.config.kernel_meta_dir, &kernel))
}

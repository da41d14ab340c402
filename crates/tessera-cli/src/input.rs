//! Turning command-line arguments into pipeline inputs.

use anyhow::{Context, Result};
use std::path::Path;
use tessera_caffe::{CustomReductionParameter, LayerParameter, NetParameter};
use tessera_core::{BuildConfig, DataType, TensorDesc};
use tessera_ops::ReductionOperation;
use tessera_ops::reduction::ORIGIN_OP_TYPE;

/// Parse a comma separated shape such as `2,3,4,4`.
pub fn parse_shape(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(|dim| {
            let dim = dim.trim();
            dim.parse::<usize>()
                .with_context(|| format!("Invalid dimension '{}' in shape '{}'", dim, text))
        })
        .collect()
}

/// Parse a shape that must have exactly four dimensions.
pub fn parse_kernel_shape(text: &str) -> Result<[usize; 4]> {
    let shape = parse_shape(text)?;
    let rank = shape.len();
    shape
        .try_into()
        .map_err(|_| anyhow::anyhow!("Kernel shapes must have 4 dimensions, got {}", rank))
}

/// Parse an element type name such as `float32`.
pub fn parse_dtype(text: &str) -> Result<DataType> {
    text.parse::<DataType>()
        .with_context(|| format!("Invalid data type '{}'", text))
}

/// Build a single-layer network from inline reduction parameters.
///
/// Unset parameters stay absent so the declared defaults apply.
pub fn inline_reduction_net(
    operation: Option<&str>,
    axis: Option<i32>,
    coeff: Option<f32>,
) -> Result<NetParameter> {
    let mut param = CustomReductionParameter::default();
    if let Some(operation) = operation {
        let operation: ReductionOperation = operation.parse().map_err(anyhow::Error::msg)?;
        param.set_operation(operation.to_proto());
    }
    param.axis = axis;
    param.coeff = coeff;

    let mut layer = LayerParameter::new("reduction", ORIGIN_OP_TYPE).with_custom_reduction(param);
    layer.bottom.push("data".to_string());
    layer.top.push("reduction".to_string());

    Ok(NetParameter {
        name: Some("inline".to_string()),
        input: vec!["data".to_string()],
        layer: vec![layer],
    })
}

/// Input descriptor handed to a layer: the given shape, named after the
/// layer's first bottom blob.
pub fn layer_input(layer: &LayerParameter, shape: &[usize], dtype: DataType) -> TensorDesc {
    let desc = TensorDesc::new(shape.to_vec(), dtype);
    match layer.bottom.first() {
        Some(bottom) => desc.with_name(bottom.clone()),
        None => desc,
    }
}

/// Load the build configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<BuildConfig> {
    let Some(path) = path else {
        return Ok(BuildConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    BuildConfig::from_json(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

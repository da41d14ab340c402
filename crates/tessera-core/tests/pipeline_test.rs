//! Pipeline tests against a mock operator.

use std::path::PathBuf;
use tessera_caffe::{CustomReductionParameter, LayerParameter, NetParameter};
use tessera_codegen::{
    CallSignature, KernelArg, KernelBuildRequest, KernelBuildResult, RecordingBackend,
};
use tessera_core::{
    AttributeValue, BuildConfig, BuildEnv, DataType, Error, Framework, ImplyType, OpRecord,
    OpRegistration, OperatorRegistry, Pipeline, Result, StageCtx, TensorDesc, Warning,
};

fn parse_gain(layer: &LayerParameter, op: &mut OpRecord) -> Result<()> {
    let param = layer
        .custom_reduction_param
        .as_ref()
        .ok_or_else(|| Error::ParameterTypeMismatch {
            layer: layer.name().to_string(),
            expected: "Gain".to_string(),
        })?;
    op.set_attr("gain", param.coeff());
    Ok(())
}

fn infer_passthrough(ctx: &mut StageCtx<'_>) -> Result<Vec<TensorDesc>> {
    let input = ctx.input(0)?;
    let _bias = ctx.attr_or("bias", 0.0f32);
    Ok(vec![input.clone()])
}

fn build_gain(ctx: &mut StageCtx<'_>, env: &BuildEnv<'_>) -> Result<KernelBuildResult> {
    let gain: f32 = ctx.attr("gain")?;
    let request = KernelBuildRequest::new(
        env.config.ddk_version.clone(),
        ctx.op.name.clone(),
        PathBuf::from("/opt/kernels/gain"),
        "gain",
        CallSignature::parse("i, f")?,
        vec![KernelArg::Int(ctx.input(0)?.rank() as i64), KernelArg::Float(gain)],
    )?;
    env.backend.build(&request)?;
    Ok(KernelBuildResult::for_kernel(&env.config.kernel_meta_dir, "gain"))
}

fn gain_registration() -> OpRegistration {
    OpRegistration {
        om_op_type: "gain_param",
        framework: Framework::Caffe,
        origin_op_type: "Gain",
        imply_type: ImplyType::Tvm,
        parse_params: parse_gain,
        infer_shape_and_type: infer_passthrough,
        build_kernel: build_gain,
    }
}

fn gain_layer(name: &str, coeff: f32) -> LayerParameter {
    let param = CustomReductionParameter {
        coeff: Some(coeff),
        ..Default::default()
    };
    LayerParameter::new(name, "Gain").with_custom_reduction(param)
}

fn registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register(gain_registration());
    registry
}

#[test]
fn test_stages_run_in_order() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();
    let inputs = vec![TensorDesc::new(vec![1, 2, 3], DataType::Int8).with_name("x")];

    let outcome = pipeline
        .run(Framework::Caffe, &gain_layer("g1", 3.0), &inputs, &backend)
        .unwrap();

    assert_eq!(outcome.record.name, "g1");
    assert_eq!(outcome.record.op_type, "gain_param");
    assert_eq!(outcome.record.attributes["gain"], AttributeValue::Float(3.0));
    assert_eq!(outcome.outputs, inputs);
    assert_eq!(outcome.build.bin_file_path, "./kernel_meta/gain.o");

    // The missing bias is reported, not fatal.
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(matches!(
        &outcome.diagnostics.warnings()[0],
        Warning::MissingAttribute { op, name, .. } if op == "g1" && name == "bias"
    ));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].ddk_version, "unknown");
    assert_eq!(requests[0].args, vec![KernelArg::Int(3), KernelArg::Float(3.0)]);
}

#[test]
fn test_parse_failure_stops_pipeline() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();
    let inputs = vec![TensorDesc::new(vec![4], DataType::Float)];

    let err = pipeline
        .run(Framework::Caffe, &LayerParameter::new("g1", "Gain"), &inputs, &backend)
        .unwrap_err();
    assert!(matches!(err, Error::ParameterTypeMismatch { .. }));
    assert!(backend.requests().is_empty());
}

#[test]
fn test_missing_input_is_fatal() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();

    let err = pipeline
        .run(Framework::Caffe, &gain_layer("g1", 1.0), &[], &backend)
        .unwrap_err();
    assert!(matches!(err, Error::MissingInput { index: 0, count: 0 }));
}

#[test]
fn test_unregistered_operator() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();

    let err = pipeline
        .run(Framework::Tensorflow, &gain_layer("g1", 1.0), &[], &backend)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnregisteredOperator { framework: Framework::Tensorflow, ref op_type } if op_type == "Gain"
    ));
    assert_eq!(
        err.to_string(),
        "No operator registered for tensorflow type 'Gain'"
    );
}

#[test]
fn test_run_model_supplies_inputs_per_layer() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();

    let net = NetParameter {
        name: Some("gains".to_string()),
        input: vec![],
        layer: vec![
            gain_layer("g1", 1.0),
            LayerParameter::new("pool", "Pooling"),
            gain_layer("g2", 2.0),
        ],
    };

    let mut seen = Vec::new();
    let outcomes = pipeline
        .run_model(
            Framework::Caffe,
            &net,
            |layer| {
                seen.push(layer.name().to_string());
                vec![TensorDesc::new(vec![seen.len()], DataType::Float)]
            },
            &backend,
        )
        .unwrap();

    assert_eq!(seen, vec!["g1", "g2"]);
    assert_eq!(outcomes[0].outputs[0].shape, vec![1]);
    assert_eq!(outcomes[1].outputs[0].shape, vec![2]);
}

#[test]
fn test_run_model_aborts_on_first_failure() {
    let registry = registry();
    let pipeline = Pipeline::new(&registry, BuildConfig::default());
    let backend = RecordingBackend::new();

    let net = NetParameter {
        name: None,
        input: vec![],
        layer: vec![
            gain_layer("g1", 1.0),
            LayerParameter::new("g2", "Gain"),
            gain_layer("g3", 1.0),
        ],
    };

    let result = pipeline.run_model(
        Framework::Caffe,
        &net,
        |_| vec![TensorDesc::new(vec![8], DataType::Float)],
        &backend,
    );
    assert!(result.is_err());
    assert_eq!(backend.requests().len(), 1);
}

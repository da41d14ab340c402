//! End-to-end tests driving the reduction plugin through the host pipeline.

mod common;

use common::{KernelWorkspace, input, reduction_layer};
use tessera_caffe::{LayerParameter, NetParameter, ReductionOp};
use tessera_codegen::{KernelArg, RecordingBackend};
use tessera_core::{AttributeValue, Error, Framework, Pipeline, TensorDesc};
use tessera_ops::core_operator_registry;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_run_single_layer() {
    init_tracing();
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let layer = reduction_layer("reduce1", ReductionOp::Mean, 2, 0.5);
    let outcome = pipeline
        .run(Framework::Caffe, &layer, &input(&[2, 3, 4, 4]), &backend)
        .unwrap();

    assert_eq!(outcome.record.name, "reduce1");
    assert_eq!(outcome.record.op_type, "custom_reduction_param");
    assert_eq!(
        outcome.record.attributes.get("operation"),
        Some(&AttributeValue::String("MEAN".to_string()))
    );
    assert_eq!(outcome.outputs.len(), 1);
    assert_eq!(outcome.outputs[0].shape, vec![2, 3, 1, 1]);
    assert_eq!(outcome.outputs[0].name.as_deref(), Some("data"));
    assert_eq!(outcome.build.bin_file_path, "./kernel_meta/custom_Reduction_2_3_4_4.o");
    assert!(outcome.diagnostics.is_empty());

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].args[5], KernelArg::Int(2));
    assert_eq!(requests[0].args[6], KernelArg::Str("MEAN".to_string()));
}

#[test]
fn test_run_with_default_parameters() {
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let layer = LayerParameter::new("reduce1", "custom_Reduction")
        .with_custom_reduction(Default::default());
    let outcome = pipeline
        .run(Framework::Caffe, &layer, &input(&[2, 3, 4, 4]), &backend)
        .unwrap();

    // Declared defaults: SUM over axis 0 with coeff 1.
    assert_eq!(outcome.outputs[0].shape, vec![1, 1, 1, 1]);
    assert_eq!(
        outcome.record.attributes.get("coeff"),
        Some(&AttributeValue::Float(1.0))
    );
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(backend.requests()[0].args[6], KernelArg::Str("SUM".to_string()));
}

#[test]
fn test_layer_without_param_block() {
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let layer = LayerParameter::new("reduce1", "custom_Reduction");
    let outcome = pipeline
        .run(Framework::Caffe, &layer, &input(&[2, 3, 4, 4]), &backend)
        .unwrap();

    assert_eq!(outcome.outputs[0].shape, vec![1, 1, 1, 1]);
    assert!(outcome.diagnostics.is_empty());
    let args = &backend.requests()[0].args;
    assert_eq!(args[5], KernelArg::Int(0));
    assert_eq!(args[6], KernelArg::Str("SUM".to_string()));
    assert_eq!(args[7], KernelArg::Float(1.0));
}

#[test]
fn test_negative_axis_through_pipeline() {
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    // -1 shifts to -3, which resolves to axis 1 on a rank 4 input.
    let layer = reduction_layer("reduce1", ReductionOp::Asum, -1, 1.0);
    let outcome = pipeline
        .run(Framework::Caffe, &layer, &input(&[2, 3, 4, 4]), &backend)
        .unwrap();

    assert_eq!(outcome.outputs[0].shape, vec![2, 1, 1, 1]);
    assert_eq!(backend.requests()[0].args[5], KernelArg::Int(-1));
}

#[test]
fn test_invalid_axis_stops_before_build() {
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let layer = reduction_layer("reduce1", ReductionOp::Sum, 9, 1.0);
    let err = pipeline
        .run(Framework::Caffe, &layer, &input(&[2, 3, 4, 4]), &backend)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidAxis { axis: 9, rank: 4 }));
    assert!(backend.requests().is_empty());
}

#[test]
fn test_unregistered_operator() {
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let layer = LayerParameter::new("conv1", "Convolution");
    let err = pipeline
        .run(Framework::Caffe, &layer, &input(&[1, 3, 8, 8]), &backend)
        .unwrap_err();
    assert!(matches!(err, Error::UnregisteredOperator { framework: Framework::Caffe, .. }));

    // Lookup is case sensitive and framework specific.
    let layer = reduction_layer("reduce1", ReductionOp::Sum, 0, 1.0);
    assert!(pipeline
        .run(Framework::Tensorflow, &layer, &input(&[2, 3, 4, 4]), &backend)
        .is_err());
    let lowercase = LayerParameter::new("reduce1", "custom_reduction");
    assert!(pipeline
        .run(Framework::Caffe, &lowercase, &input(&[2, 3, 4, 4]), &backend)
        .is_err());
}

#[test]
fn test_run_model_skips_foreign_layers() {
    init_tracing();
    let workspace = KernelWorkspace::new();
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, workspace.config());
    let backend = RecordingBackend::new();

    let net = NetParameter {
        name: Some("reduction_net".to_string()),
        input: vec!["data".to_string()],
        layer: vec![
            LayerParameter::new("conv1", "Convolution"),
            reduction_layer("reduce_a", ReductionOp::Sumsq, 1, 2.0),
            LayerParameter::new("relu1", "ReLU"),
            reduction_layer("reduce_b", ReductionOp::Sum, 3, 1.0),
        ],
    };

    let outcomes = pipeline
        .run_model(
            Framework::Caffe,
            &net,
            |_layer| vec![TensorDesc::new(vec![1, 8, 16, 16], tessera_core::DataType::Float)],
            &backend,
        )
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].record.name, "reduce_a");
    assert_eq!(outcomes[0].outputs[0].shape, vec![1, 1, 1, 1]);
    assert_eq!(outcomes[1].record.name, "reduce_b");
    assert_eq!(outcomes[1].outputs[0].shape, vec![1, 8, 16, 1]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].op_name, "reduce_a");
    assert_eq!(requests[1].op_name, "reduce_b");
}

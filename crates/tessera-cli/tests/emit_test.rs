//! Integration tests for building inline layers through the emitting backend.

use std::fs;
use tessera_cli::emit::EmittingBackend;
use tessera_cli::input;
use tessera_codegen::{DryRunBackend, KernelArg};
use tessera_core::{BuildConfig, DataType, Framework, Pipeline};
use tessera_ops::core_operator_registry;

fn kernel_workspace() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("work")).unwrap();
    fs::create_dir_all(root.path().join("operator")).unwrap();
    fs::write(root.path().join("operator/custom_Reduction.py"), "").unwrap();
    root
}

#[test]
fn test_inline_build_emits_request() {
    let root = kernel_workspace();
    let config = BuildConfig {
        working_dir: Some(root.path().join("work")),
        ..Default::default()
    };
    let registry = core_operator_registry();
    let pipeline = Pipeline::new(&registry, config);
    let backend = EmittingBackend::new(&DryRunBackend);

    let net = input::inline_reduction_net(Some("sumsq"), Some(-1), Some(2.0)).unwrap();
    let shape = input::parse_shape("2,3,4,4").unwrap();
    let outcomes = pipeline
        .run_model(
            Framework::Caffe,
            &net,
            |layer| vec![input::layer_input(layer, &shape, DataType::Float)],
            &backend,
        )
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].outputs[0].shape, vec![2, 1, 1, 1]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].args[4], KernelArg::Str("float32".to_string()));
    assert_eq!(requests[0].args[6], KernelArg::Str("SUMSQ".to_string()));

    let json: serde_json::Value = serde_json::from_str(&backend.to_json().unwrap()).unwrap();
    assert_eq!(json[0]["op_name"], "reduction");
    assert_eq!(json[0]["signature"], "(i,i,i,i),s, i, s, f, s,O");
    assert_eq!(json[0]["args"][8], "custom_Reduction_2_3_4_4");
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build.json");
    fs::write(
        &path,
        r#"{ "ddk_version": "1.60.T17", "kernel_axis_compensation": "compensate" }"#,
    )
    .unwrap();

    let config = input::load_config(Some(&path)).unwrap();
    assert_eq!(config.ddk_version, "1.60.T17");
    assert_eq!(config.kernel_meta_dir, "./kernel_meta");

    assert!(input::load_config(Some(&dir.path().join("missing.json"))).is_err());
    assert_eq!(input::load_config(None).unwrap(), BuildConfig::default());
}

//! Tessera CLI - inspect Caffe models and build custom operator kernels.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tessera_caffe::NetParameter;
use tessera_cli::emit::EmittingBackend;
use tessera_cli::input;
use tessera_codegen::{DryRunBackend, KernelBackend, KernelBuildResult, PythonBackend};
use tessera_core::{AxisCompensation, Framework, OperatorOutcome, Pipeline};
use tessera_ops::{ReductionOperation, core_operator_registry, reduction};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Custom operator plugin host for Caffe models", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the layers of a binary Caffe model
    Inspect {
        /// Path to the .caffemodel file
        #[arg(value_name = "MODEL")]
        model: PathBuf,
    },
    /// Run the operator stages and build kernels
    Build {
        /// Path to the .caffemodel file (omit to build one inline reduction)
        #[arg(value_name = "MODEL")]
        model: Option<PathBuf>,

        /// Input shape of each layer (e.g., "2,3,4,4")
        #[arg(short, long)]
        shape: String,

        /// Input element type
        #[arg(long, default_value = "float32")]
        dtype: String,

        /// Only build the layer with this name
        #[arg(long, value_name = "NAME")]
        layer: Option<String>,

        /// Reduction operation for the inline layer: sum, asum, sumsq, mean
        #[arg(long, conflicts_with = "model")]
        operation: Option<String>,

        /// Reduction axis for the inline layer
        #[arg(long, allow_negative_numbers = true, conflicts_with = "model")]
        axis: Option<i32>,

        /// Output coefficient for the inline layer
        #[arg(long, conflicts_with = "model")]
        coeff: Option<f32>,

        /// Kernel build backend
        #[arg(short, long, value_enum, default_value_t = BackendKind::DryRun)]
        backend: BackendKind,

        /// JSON build configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory kernel modules are resolved against
        #[arg(long, value_name = "DIR")]
        working_dir: Option<PathBuf>,

        /// Backend version tag forwarded to the kernel build
        #[arg(long, value_name = "TAG")]
        ddk_version: Option<String>,

        /// Shift negative axes by two in the kernel build stage
        #[arg(long)]
        compensate_axis: bool,

        /// Print the kernel build requests as JSON
        #[arg(long)]
        emit_request: bool,
    },
    /// Print the kernel name and artifact paths for a shape
    KernelName {
        /// Input shape (e.g., "2,3,4,4")
        #[arg(short, long)]
        shape: String,

        /// Directory the artifacts are written to
        #[arg(long, default_value = "./kernel_meta")]
        kernel_meta_dir: String,
    },
    /// List registered operators
    Ops,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Log build requests without building
    DryRun,
    /// Call the kernel's Python build function
    Python,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { model } => {
            cmd_inspect(model)?;
        }
        Commands::Build {
            model,
            shape,
            dtype,
            layer,
            operation,
            axis,
            coeff,
            backend,
            config,
            working_dir,
            ddk_version,
            compensate_axis,
            emit_request,
        } => {
            let net = match &model {
                Some(path) => tessera_caffe::load_net(path)
                    .with_context(|| format!("Failed to load model from {}", path.display()))?,
                None => input::inline_reduction_net(operation.as_deref(), axis, coeff)?,
            };

            let mut build_config = input::load_config(config.as_deref())?;
            if let Some(dir) = working_dir {
                build_config.working_dir = Some(dir);
            }
            if let Some(tag) = ddk_version {
                build_config.ddk_version = tag;
            }
            if compensate_axis {
                build_config.kernel_axis_compensation = AxisCompensation::Compensate;
            }

            let options = BuildOptions {
                shape: input::parse_shape(&shape)?,
                dtype: input::parse_dtype(&dtype)?,
                layer,
                backend,
                emit_request,
            };
            cmd_build(&net, build_config, options)?;
        }
        Commands::KernelName {
            shape,
            kernel_meta_dir,
        } => {
            let dims = input::parse_kernel_shape(&shape)?;
            let name = reduction::reduction_kernel_name(dims);
            let result = KernelBuildResult::for_kernel(&kernel_meta_dir, &name);
            println!("{}", name);
            println!("  bin:  {}", result.bin_file_path);
            println!("  json: {}", result.json_file_path);
        }
        Commands::Ops => {
            cmd_ops();
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// List the layers of a Caffe model, marking registered operator types.
fn cmd_inspect(model_path: PathBuf) -> Result<()> {
    let net = tessera_caffe::load_net(&model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let registry = core_operator_registry();

    println!("Model: {}", net.name());
    println!("  Inputs: {:?}", net.input);
    println!("  Layers: {}", net.layer.len());
    println!();

    let mut custom = 0;
    for layer in &net.layer {
        let registered = registry.contains(Framework::Caffe, layer.r#type());
        if registered {
            custom += 1;
        }
        println!(
            "{} {} ({}) {:?} -> {:?}",
            if registered { "*" } else { " " },
            layer.name(),
            layer.r#type(),
            layer.bottom,
            layer.top
        );
        if let Some(param) = &layer.custom_reduction_param {
            let operation = match param.operation {
                Some(raw) => tessera_caffe::ReductionOp::try_from(raw)
                    .map(|op| ReductionOperation::from_proto(op).to_string())
                    .unwrap_or_else(|_| format!("<unknown {}>", raw)),
                None => ReductionOperation::Sum.to_string(),
            };
            println!(
                "      operation={} axis={} coeff={}",
                operation,
                param.axis(),
                param.coeff()
            );
        }
    }

    println!();
    println!("Custom operator layers: {}", custom);
    Ok(())
}

struct BuildOptions {
    shape: Vec<usize>,
    dtype: tessera_core::DataType,
    layer: Option<String>,
    backend: BackendKind,
    emit_request: bool,
}

/// Run the registered layers of `net` through the pipeline.
fn cmd_build(
    net: &NetParameter,
    config: tessera_core::BuildConfig,
    options: BuildOptions,
) -> Result<()> {
    let registry = core_operator_registry();
    let backend: Box<dyn KernelBackend> = match options.backend {
        BackendKind::DryRun => Box::new(DryRunBackend),
        BackendKind::Python => Box::new(PythonBackend::new(config.python.clone())),
    };
    let backend = EmittingBackend::new(backend.as_ref());
    let pipeline = Pipeline::new(&registry, config);

    let outcomes = match &options.layer {
        Some(name) => {
            let layer = net
                .layer_by_name(name)
                .with_context(|| format!("Layer '{}' not found", name))?;
            let inputs = vec![input::layer_input(layer, &options.shape, options.dtype)];
            let outcome = pipeline
                .run(Framework::Caffe, layer, &inputs, &backend)
                .with_context(|| format!("Failed to build layer '{}'", name))?;
            vec![outcome]
        }
        None => pipeline
            .run_model(
                Framework::Caffe,
                net,
                |layer| vec![input::layer_input(layer, &options.shape, options.dtype)],
                &backend,
            )
            .with_context(|| "Failed to build model")?,
    };

    if outcomes.is_empty() {
        eprintln!("No registered operator layers found");
    }
    for outcome in &outcomes {
        print_outcome(outcome);
    }

    if options.emit_request {
        println!("{}", backend.to_json()?);
    }
    Ok(())
}

fn print_outcome(outcome: &OperatorOutcome) {
    println!("{} ({})", outcome.record.name, outcome.record.op_type);
    for output in &outcome.outputs {
        println!("  output: {} {:?}", output.dtype, output.shape);
    }
    println!("  bin:  {}", outcome.build.bin_file_path);
    println!("  json: {}", outcome.build.json_file_path);
    for warning in outcome.diagnostics.warnings() {
        eprintln!("warning: {}", warning);
    }
}

/// List registered operators.
fn cmd_ops() {
    let registry = core_operator_registry();
    let mut registrations: Vec<_> = registry.registrations().collect();
    registrations.sort_by_key(|reg| (reg.framework.to_string(), reg.origin_op_type));

    println!("Registered operators ({}):", registrations.len());
    for reg in registrations {
        println!(
            "  {:<12} {:<20} -> {:<24} {:?}",
            reg.framework.to_string(),
            reg.origin_op_type,
            reg.om_op_type,
            reg.imply_type
        );
    }
}

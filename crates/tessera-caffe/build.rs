//! Build script for tessera-caffe.
//!
//! Generates Rust types from the Caffe protobuf subset using prost-build.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Rerun if the proto file changes
    println!("cargo::rerun-if-changed=proto/caffe.proto");
    println!("cargo::rerun-if-env-changed=PROTOC");

    let mut config = prost_build::Config::new();
    // Fall back to the bundled compiler when no protoc is configured
    if std::env::var_os("PROTOC").is_none() {
        config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);
    }
    config.compile_protos(&["proto/caffe.proto"], &["proto/"])?;

    Ok(())
}

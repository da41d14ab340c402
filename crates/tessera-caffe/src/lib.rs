//! Caffe model decoder for Tessera.
//!
//! This crate decodes binary Caffe models (`NetParameter` protobufs) and
//! exposes the layer records that custom operator plugins read their
//! parameters from. Only the subset of the Caffe schema the plugins need is
//! modelled; unknown fields are skipped by the decoder.
//!
//! # Example
//!
//! ```no_run
//! use tessera_caffe::load_net;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let net = load_net("model.caffemodel")?;
//!
//! for layer in net.layers_of_type("custom_Reduction") {
//!     println!("{} -> {:?}", layer.name(), layer.top);
//! }
//! # Ok(())
//! # }
//! ```

use prost::Message;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Generated Caffe protobuf types.
pub mod caffe {
    include!(concat!(env!("OUT_DIR"), "/caffe.rs"));
}

pub mod net;

pub use caffe::custom_reduction_parameter::ReductionOp;
pub use caffe::{CustomReductionParameter, LayerParameter, NetParameter};

/// Errors that can occur when loading or processing Caffe models.
#[derive(Debug, Error)]
pub enum CaffeError {
    #[error("Failed to read Caffe model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse Caffe protobuf: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Layer not found: {0}")]
    MissingLayer(String),
}

/// Result type for Caffe operations.
pub type Result<T> = std::result::Result<T, CaffeError>;

/// Load a binary Caffe model from a file.
pub fn load_net<P: AsRef<Path>>(path: P) -> Result<NetParameter> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let net = decode_net(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        layers = net.layer.len(),
        "loaded caffe model"
    );
    Ok(net)
}

/// Decode a `NetParameter` from raw protobuf bytes.
pub fn decode_net(bytes: &[u8]) -> Result<NetParameter> {
    Ok(NetParameter::decode(bytes)?)
}

/// Decode a single `LayerParameter` from raw protobuf bytes.
pub fn decode_layer(bytes: &[u8]) -> Result<LayerParameter> {
    Ok(LayerParameter::decode(bytes)?)
}

//! Lookup helpers over decoded Caffe networks.

use crate::caffe::{CustomReductionParameter, LayerParameter, NetParameter};
use crate::{CaffeError, Result};

impl NetParameter {
    /// Iterate over the layers whose `type` equals `layer_type`.
    ///
    /// Caffe layer types are case sensitive.
    pub fn layers_of_type<'a>(
        &'a self,
        layer_type: &'a str,
    ) -> impl Iterator<Item = &'a LayerParameter> + 'a {
        self.layer
            .iter()
            .filter(move |layer| layer.r#type() == layer_type)
    }

    /// Get a layer by name.
    pub fn layer_by_name(&self, name: &str) -> Result<&LayerParameter> {
        self.layer
            .iter()
            .find(|layer| layer.name() == name)
            .ok_or_else(|| CaffeError::MissingLayer(name.to_string()))
    }
}

impl LayerParameter {
    /// Create a layer with the given name and type and no parameters.
    pub fn new(name: impl Into<String>, layer_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            r#type: Some(layer_type.into()),
            ..Default::default()
        }
    }

    /// Attach a custom Reduction parameter block.
    pub fn with_custom_reduction(mut self, param: CustomReductionParameter) -> Self {
        self.custom_reduction_param = Some(param);
        self
    }
}

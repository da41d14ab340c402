//! Tensor descriptors and data types.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element data types understood by the code-generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Undefined,
    Float,
    Float16,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    Double,
    Dual,
    DualSubInt8,
    DualSubUint8,
}

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: [DataType; 16] = [
        DataType::Undefined,
        DataType::Float,
        DataType::Float16,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Bool,
        DataType::Double,
        DataType::Dual,
        DataType::DualSubInt8,
        DataType::DualSubUint8,
    ];

    /// Canonical lowercase name passed to the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Undefined => "undefined",
            DataType::Float => "float32",
            DataType::Float16 => "float16",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Bool => "bool",
            DataType::Double => "double",
            DataType::Dual => "dual",
            DataType::DualSubInt8 => "dual_sub_int8",
            DataType::DualSubUint8 => "dual_sub_uint8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dtype| dtype.as_str() == s)
            .ok_or_else(|| Error::UnknownDataType(s.to_string()))
    }
}

/// Memory layout tag carried with a tensor descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorFormat {
    #[default]
    Nchw,
    Nhwc,
    Nd,
}

/// Shape and type metadata of one tensor, without its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDesc {
    /// Tensor name, if the host assigned one.
    pub name: Option<String>,

    /// Dimension sizes.
    pub shape: Vec<usize>,

    /// Element type.
    pub dtype: DataType,

    /// Memory layout.
    pub format: TensorFormat,
}

impl TensorDesc {
    /// Create an unnamed NCHW descriptor.
    pub fn new(shape: Vec<usize>, dtype: DataType) -> Self {
        Self {
            name: None,
            shape,
            dtype,
            format: TensorFormat::default(),
        }
    }

    /// Set the tensor name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the memory layout.
    pub fn with_format(mut self, format: TensorFormat) -> Self {
        self.format = format;
        self
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_names() {
        let names: Vec<_> = DataType::ALL.iter().map(DataType::as_str).collect();
        assert_eq!(
            names,
            vec![
                "undefined",
                "float32",
                "float16",
                "int8",
                "int16",
                "int32",
                "int64",
                "uint8",
                "uint16",
                "uint32",
                "uint64",
                "bool",
                "double",
                "dual",
                "dual_sub_int8",
                "dual_sub_uint8",
            ]
        );
    }

    #[test]
    fn test_dtype_from_str() {
        for dtype in DataType::ALL {
            assert_eq!(dtype.as_str().parse::<DataType>().unwrap(), dtype);
        }
        assert!(matches!(
            "float".parse::<DataType>(),
            Err(Error::UnknownDataType(name)) if name == "float"
        ));
    }

    #[test]
    fn test_tensor_desc_builders() {
        let desc = TensorDesc::new(vec![2, 3, 4, 4], DataType::Float16)
            .with_name("data")
            .with_format(TensorFormat::Nd);
        assert_eq!(desc.rank(), 4);
        assert_eq!(desc.name.as_deref(), Some("data"));
        assert_eq!(desc.format, TensorFormat::Nd);
    }
}

//! Positional call signatures for backend build entry points.
//!
//! A signature is a compact format string describing the positional
//! arguments a kernel function accepts, e.g. `(i,i,i,i),s, i, s, f, s,O`:
//!
//! | code | argument |
//! |------|----------|
//! | `i`  | integer  |
//! | `s`  | string   |
//! | `f`  | float    |
//! | `O`  | boolean object |
//!
//! Parentheses group consecutive arguments into one tuple parameter. Commas
//! and whitespace only separate items. The literal text is kept so it can be
//! handed to the backend byte for byte.

use crate::error::{CodegenError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// Kind of a single positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Int,
    Str,
    Float,
    Bool,
}

impl ArgKind {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(ArgKind::Int),
            's' => Some(ArgKind::Str),
            'f' => Some(ArgKind::Float),
            'O' => Some(ArgKind::Bool),
            _ => None,
        }
    }

    /// Format code used in signature strings.
    pub fn code(&self) -> char {
        match self {
            ArgKind::Int => 'i',
            ArgKind::Str => 's',
            ArgKind::Float => 'f',
            ArgKind::Bool => 'O',
        }
    }
}

/// One parameter of the called function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureItem {
    /// A single scalar argument.
    Single(ArgKind),

    /// A tuple built from consecutive positional arguments.
    Tuple(Vec<ArgKind>),
}

impl SignatureItem {
    /// Number of flattened positional arguments this parameter consumes.
    pub fn arity(&self) -> usize {
        match self {
            SignatureItem::Single(_) => 1,
            SignatureItem::Tuple(kinds) => kinds.len(),
        }
    }
}

/// A parsed call signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    literal: String,
    items: Vec<SignatureItem>,
}

impl CallSignature {
    /// Parse a signature format string.
    pub fn parse(literal: &str) -> Result<Self> {
        let error = |message: String| CodegenError::SignatureParse {
            signature: literal.to_string(),
            message,
        };

        let mut items = Vec::new();
        let mut group: Option<Vec<ArgKind>> = None;

        for (pos, c) in literal.char_indices() {
            match c {
                ',' => {}
                c if c.is_whitespace() => {}
                '(' => {
                    if group.is_some() {
                        return Err(error(format!("nested group at offset {pos}")));
                    }
                    group = Some(Vec::new());
                }
                ')' => match group.take() {
                    Some(kinds) if kinds.is_empty() => {
                        return Err(error(format!("empty group at offset {pos}")));
                    }
                    Some(kinds) => items.push(SignatureItem::Tuple(kinds)),
                    None => return Err(error(format!("unmatched ')' at offset {pos}"))),
                },
                c => {
                    let kind = ArgKind::from_code(c)
                        .ok_or_else(|| error(format!("unknown format code '{c}' at offset {pos}")))?;
                    match group.as_mut() {
                        Some(kinds) => kinds.push(kind),
                        None => items.push(SignatureItem::Single(kind)),
                    }
                }
            }
        }

        if group.is_some() {
            return Err(error("unclosed group".to_string()));
        }

        Ok(Self {
            literal: literal.to_string(),
            items,
        })
    }

    /// The signature text exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// The function parameters described by this signature.
    pub fn items(&self) -> &[SignatureItem] {
        &self.items
    }

    /// Kinds of all positional arguments, with tuples flattened.
    pub fn flat_kinds(&self) -> Vec<ArgKind> {
        self.items
            .iter()
            .flat_map(|item| match item {
                SignatureItem::Single(kind) => vec![*kind],
                SignatureItem::Tuple(kinds) => kinds.clone(),
            })
            .collect()
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl Serialize for CallSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.literal)
    }
}

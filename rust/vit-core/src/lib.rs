//! Vision Transformer image classifier with an injected backbone.
//!
//! This crate provides the classifier module (patch embedding, class token,
//! positional embeddings, pooling and classification head) built on candle,
//! together with its YAML configuration and parameter summary. The sequence
//! transformer itself is supplied by the caller as any [`candle_nn::Module`]
//! that preserves the `[batch, seq, dim]` shape.
//!
//! ```ignore
//! use candle_core::{DType, Device, Module, Tensor};
//! use candle_nn::{VarBuilder, VarMap};
//! use vit_core::{Identity, ViTClassifier, ViTConfig};
//!
//! let varmap = VarMap::new();
//! let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
//! let model = ViTClassifier::new(&ViTConfig::new(224, 32, 10, 128), Identity, vb)?;
//! let img = Tensor::randn(0f32, 1.0, (2, 3, 224, 224), &Device::Cpu)?;
//! let logits = model.forward(&img)?; // [2, 10]
//! ```

mod config;
mod error;
mod model;
mod patch;

pub use config::{ModelSummary, Pool, ViTConfig};
pub use error::{Error, Result};
pub use model::{Identity, ViTClassifier};
pub use patch::{patchify, unpatchify};

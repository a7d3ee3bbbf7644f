//! ViT classifier over an injected sequence backbone.
//!
//! Forward pass:
//!   1. `patchify`: `[B, C, H, W]` -> `[B, N, C*p*p]`
//!   2. Patch embedding linear -> `[B, N, dim]`
//!   3. Prepend the class token -> `[B, N+1, dim]`
//!   4. Add positional embeddings
//!   5. Backbone (shape preserving)
//!   6. Pool (class token or mean) -> `[B, dim]`
//!   7. Latent hook
//!   8. LayerNorm + linear head -> `[B, num_classes]` logits

use candle_core::{IndexOp, Module, Tensor};
use candle_nn::{Init, LayerNorm, Linear, VarBuilder};
use tracing::{debug, trace};

use crate::config::{Pool, ViTConfig};
use crate::error::Result;
use crate::patch::patchify;

const LAYER_NORM_EPS: f64 = 1e-5;

/// Standard normal, as used for the class token and positional table.
const RANDN: Init = Init::Randn {
    mean: 0.0,
    stdev: 1.0,
};

/// Module that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Module for Identity {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        Ok(xs.clone())
    }
}

/// Layer norm followed by the class projection.
#[derive(Debug, Clone)]
struct ClassifierHead {
    norm: LayerNorm,
    linear: Linear,
}

impl ClassifierHead {
    fn new(dim: usize, num_classes: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        let norm = candle_nn::layer_norm(dim, LAYER_NORM_EPS, vb.pp("norm"))?;
        let linear = candle_nn::linear(dim, num_classes, vb.pp("linear"))?;
        Ok(Self { norm, linear })
    }
}

impl Module for ClassifierHead {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        xs.apply(&self.norm)?.apply(&self.linear)
    }
}

/// Vision Transformer image classifier.
///
/// The backbone `T` is any module mapping `[B, S, dim]` to a tensor of the
/// same shape. Parameters are read-only during `forward`, so a shared
/// reference can serve concurrent callers when `T: Sync`.
pub struct ViTClassifier<T> {
    config: ViTConfig,
    patch_to_embedding: Linear,
    /// `[1, 1, dim]`
    cls_token: Tensor,
    /// `[1, num_patches + 1, dim]`
    pos_embedding: Tensor,
    transformer: T,
    to_latent: Box<dyn Module + Send + Sync>,
    mlp_head: ClassifierHead,
}

impl<T: Module> ViTClassifier<T> {
    /// Validate `config` and allocate every learned tensor through `vb`.
    ///
    /// With a `VarMap`-backed builder the tensors are freshly initialized;
    /// with a loaded builder they take the stored values.
    pub fn new(config: &ViTConfig, transformer: T, vb: VarBuilder) -> Result<Self> {
        config.validate()?;

        let num_patches = config.num_patches();
        let patch_dim = config.patch_dim();
        let dim = config.dim;

        let patch_to_embedding = candle_nn::linear(patch_dim, dim, vb.pp("patch_to_embedding"))?;
        let cls_token = vb.get_with_hints((1, 1, dim), "cls_token", RANDN)?;
        let pos_embedding = vb.get_with_hints((1, num_patches + 1, dim), "pos_embedding", RANDN)?;
        let mlp_head = ClassifierHead::new(dim, config.num_classes, vb.pp("mlp_head"))?;

        debug!(
            image_size = config.image_size,
            patch_size = config.patch_size,
            num_patches,
            patch_dim,
            dim,
            num_classes = config.num_classes,
            pool = %config.pool,
            "built ViT classifier"
        );

        Ok(Self {
            config: config.clone(),
            patch_to_embedding,
            cls_token,
            pos_embedding,
            transformer,
            to_latent: Box::new(Identity),
            mlp_head,
        })
    }
}

impl<T> ViTClassifier<T> {
    /// Replace the latent hook applied between pooling and the head.
    ///
    /// Defaults to [`Identity`]. The hook receives and should return
    /// `[B, dim]`.
    pub fn with_latent<L>(mut self, hook: L) -> Self
    where
        L: Module + Send + Sync + 'static,
    {
        self.to_latent = Box::new(hook);
        self
    }

    pub fn config(&self) -> &ViTConfig {
        &self.config
    }

    pub fn pool(&self) -> Pool {
        self.config.pool
    }

    pub fn patch_size(&self) -> usize {
        self.config.patch_size
    }

    pub fn num_patches(&self) -> usize {
        self.config.num_patches()
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }
}

impl<T: Module> Module for ViTClassifier<T> {
    fn forward(&self, img: &Tensor) -> candle_core::Result<Tensor> {
        trace!(shape = ?img.dims(), "ViT forward");

        let x = patchify(img, self.config.patch_size)?;
        let x = self.patch_to_embedding.forward(&x)?;
        let (b, n, d) = x.dims3()?;

        let cls_tokens = self.cls_token.broadcast_as((b, 1, d))?;
        let x = Tensor::cat(&[&cls_tokens, &x], 1)?;
        let x = x.broadcast_add(&self.pos_embedding.narrow(1, 0, n + 1)?)?;

        let x = self.transformer.forward(&x)?;

        let x = match self.config.pool {
            Pool::Mean => x.mean(1)?,
            Pool::Cls => x.i((.., 0))?,
        };

        let x = self.to_latent.forward(&x)?;
        self.mlp_head.forward(&x)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ViTClassifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViTClassifier")
            .field("config", &self.config)
            .field("transformer", &self.transformer)
            .finish()
    }
}

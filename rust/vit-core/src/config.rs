//! ViT classifier configuration and parameter accounting.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the transformer output sequence is reduced to one vector per image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    /// Take the post-transformer representation of the class token.
    #[default]
    Cls,
    /// Average over every sequence position.
    Mean,
}

impl Pool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Cls => "cls",
            Pool::Mean => "mean",
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cls" => Ok(Pool::Cls),
            "mean" => Ok(Pool::Mean),
            other => Err(Error::Configuration(format!(
                "pool type must be either cls (cls token) or mean (mean pooling), got '{}'",
                other
            ))),
        }
    }
}

fn default_channels() -> usize {
    3
}

/// Vision Transformer classifier configuration.
///
/// Loadable from YAML; `pool` and `channels` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViTConfig {
    /// Side length of the square input image.
    pub image_size: usize,
    /// Side length of each square patch.
    pub patch_size: usize,
    /// Number of output logits.
    pub num_classes: usize,
    /// Embedding width seen by the backbone.
    pub dim: usize,
    #[serde(default)]
    pub pool: Pool,
    #[serde(default = "default_channels")]
    pub channels: usize,
}

impl ViTConfig {
    /// Create a config with class-token pooling and three input channels.
    pub fn new(image_size: usize, patch_size: usize, num_classes: usize, dim: usize) -> Self {
        Self {
            image_size,
            patch_size,
            num_classes,
            dim,
            pool: Pool::default(),
            channels: default_channels(),
        }
    }

    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Load a ViTConfig from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse a ViTConfig from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: ViTConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("image_size", self.image_size),
            ("patch_size", self.patch_size),
            ("num_classes", self.num_classes),
            ("dim", self.dim),
            ("channels", self.channels),
        ] {
            if value == 0 {
                return Err(Error::Configuration(format!("{} must be > 0", name)));
            }
        }

        if self.image_size % self.patch_size != 0 {
            return Err(Error::Configuration(format!(
                "image dimensions must be divisible by the patch size \
                 (image_size {}, patch_size {})",
                self.image_size, self.patch_size
            )));
        }

        Ok(())
    }

    /// Number of patches along one side of the image.
    pub fn grid_size(&self) -> usize {
        self.image_size / self.patch_size
    }

    /// Compute the number of patches produced from one image.
    pub fn num_patches(&self) -> usize {
        self.grid_size() * self.grid_size()
    }

    /// Length of a flattened patch vector.
    pub fn patch_dim(&self) -> usize {
        self.channels * self.patch_size * self.patch_size
    }

    /// Sequence length handed to the backbone (patches plus class token).
    pub fn seq_length(&self) -> usize {
        self.num_patches() + 1
    }

    /// Compute a summary of the classifier's own parameters.
    ///
    /// The backbone is opaque and is not counted.
    pub fn compute_summary(&self) -> ModelSummary {
        let num_patches = self.num_patches();
        let seq_length = self.seq_length();
        let patch_dim = self.patch_dim();

        // Linear weight + bias
        let patch_embed_params = patch_dim * self.dim + self.dim;
        let cls_token_params = self.dim;
        let pos_embed_params = seq_length * self.dim;

        // LayerNorm weight + bias, then Linear weight + bias
        let head_norm_params = 2 * self.dim;
        let head_linear_params = self.dim * self.num_classes + self.num_classes;

        let total_params = patch_embed_params
            + cls_token_params
            + pos_embed_params
            + head_norm_params
            + head_linear_params;

        ModelSummary {
            total_params,
            patch_embed_params,
            cls_token_params,
            pos_embed_params,
            head_norm_params,
            head_linear_params,
            image_size: self.image_size,
            patch_size: self.patch_size,
            channels: self.channels,
            dim: self.dim,
            num_classes: self.num_classes,
            patch_dim,
            num_patches,
            seq_length,
            pool: self.pool,
        }
    }
}

/// Summary of classifier architecture and parameter counts.
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub total_params: usize,
    pub patch_embed_params: usize,
    pub cls_token_params: usize,
    pub pos_embed_params: usize,
    pub head_norm_params: usize,
    pub head_linear_params: usize,
    pub image_size: usize,
    pub patch_size: usize,
    pub channels: usize,
    pub dim: usize,
    pub num_classes: usize,
    pub patch_dim: usize,
    pub num_patches: usize,
    pub seq_length: usize,
    pub pool: Pool,
}

impl ModelSummary {
    /// Parameters are allocated as f32.
    pub fn param_memory_bytes(&self) -> usize {
        self.total_params * std::mem::size_of::<f32>()
    }

    /// Format the summary as a human-readable string.
    pub fn display(&self) -> String {
        let param_mb = self.param_memory_bytes() as f64 / 1_000_000.0;
        let total_m = self.total_params as f64 / 1_000_000.0;

        format!(
            r#"Model Summary
=============
Architecture:
  Image Size:         {}
  Patch Size:         {}
  Channels:           {}
  Embedding Dim:      {}
  Num Classes:        {}
  Pooling:            {}

Sequence:
  Patch Dim:          {}
  Num Patches:        {}
  Sequence Length:    {}

Parameters (backbone excluded):
  Total:              {:.2}M
  Patch Embedding:    {}
  Class Token:        {}
  Position Embedding: {}
  Head Norm:          {}
  Head Linear:        {}

Memory:
  Parameters:         {:.2} MB (float32)"#,
            self.image_size,
            self.patch_size,
            self.channels,
            self.dim,
            self.num_classes,
            self.pool,
            self.patch_dim,
            self.num_patches,
            self.seq_length,
            total_m,
            self.patch_embed_params,
            self.cls_token_params,
            self.pos_embed_params,
            self.head_norm_params,
            self.head_linear_params,
            param_mb,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
image_size: 224
patch_size: 32
num_classes: 10
dim: 128
"#;
        let config = ViTConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.dim, 128);
        assert_eq!(config.pool, Pool::Cls);
        assert_eq!(config.channels, 3);
        assert_eq!(config.num_patches(), 49); // (224/32) * (224/32)
        assert_eq!(config.seq_length(), 50);
        assert_eq!(config.patch_dim(), 3072);
    }

    #[test]
    fn test_parse_mean_pool() {
        let yaml = r#"
image_size: 32
patch_size: 4
num_classes: 10
dim: 64
pool: mean
channels: 1
"#;
        let config = ViTConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.pool, Pool::Mean);
        assert_eq!(config.channels, 1);
        assert_eq!(config.patch_dim(), 16);
    }

    #[test]
    fn test_parse_unknown_pool() {
        let yaml = r#"
image_size: 224
patch_size: 32
num_classes: 10
dim: 128
pool: max
"#;
        let result = ViTConfig::from_yaml_str(yaml);
        assert!(matches!(result, Err(Error::ParseYaml(_))));
    }

    #[test]
    fn test_pool_from_str() {
        assert_eq!("cls".parse::<Pool>().unwrap(), Pool::Cls);
        assert_eq!("mean".parse::<Pool>().unwrap(), Pool::Mean);
        assert!(matches!("max".parse::<Pool>(), Err(Error::Configuration(_))));
        assert!(matches!("CLS".parse::<Pool>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_indivisible() {
        let config = ViTConfig::new(225, 16, 10, 64);
        let result = config.validate();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_zero_patch_size() {
        let config = ViTConfig::new(224, 0, 10, 64);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_divisible_sizes() {
        for (image_size, patch_size) in [(224, 32), (224, 16), (32, 4), (7, 7), (9, 1)] {
            let config = ViTConfig::new(image_size, patch_size, 10, 8);
            config.validate().unwrap();
            let side = image_size / patch_size;
            assert_eq!(config.num_patches(), side * side);
        }
    }

    #[test]
    fn test_compute_summary() {
        let config = ViTConfig::new(224, 32, 10, 128);
        let summary = config.compute_summary();
        assert_eq!(summary.patch_embed_params, 3072 * 128 + 128);
        assert_eq!(summary.cls_token_params, 128);
        assert_eq!(summary.pos_embed_params, 50 * 128);
        assert_eq!(summary.head_norm_params, 256);
        assert_eq!(summary.head_linear_params, 128 * 10 + 10);
        assert_eq!(summary.total_params, 401_418);
        assert_eq!(summary.param_memory_bytes(), 401_418 * 4);
        assert!(summary.display().contains("Num Patches:        49"));
    }
}

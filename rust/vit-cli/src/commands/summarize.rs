//! Summarize command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use vit_core::ViTConfig;

/// Run the summarize command.
pub fn run(config_path: &Path, format: &str) -> Result<()> {
    let config = ViTConfig::from_yaml(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    let summary = config.compute_summary();

    match format {
        "json" => {
            let result = serde_json::json!({
                "config_path": config_path.display().to_string(),
                "architecture": {
                    "image_size": summary.image_size,
                    "patch_size": summary.patch_size,
                    "channels": summary.channels,
                    "dim": summary.dim,
                    "num_classes": summary.num_classes,
                    "pool": summary.pool.as_str(),
                },
                "sequence": {
                    "patch_dim": summary.patch_dim,
                    "num_patches": summary.num_patches,
                    "seq_length": summary.seq_length,
                },
                "parameters": {
                    "total": summary.total_params,
                    "total_millions": summary.total_params as f64 / 1_000_000.0,
                    "patch_embed": summary.patch_embed_params,
                    "cls_token": summary.cls_token_params,
                    "pos_embedding": summary.pos_embed_params,
                    "head_norm": summary.head_norm_params,
                    "head_linear": summary.head_linear_params,
                },
                "memory": {
                    "params_bytes": summary.param_memory_bytes(),
                    "params_mb": summary.param_memory_bytes() as f64 / 1_000_000.0,
                    "dtype": "float32",
                },
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("{}", summary.display());
        }
    }

    Ok(())
}

//! Validate command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use vit_core::ViTConfig;

/// Run the validate command.
pub fn run(config_path: &Path, format: &str) -> Result<()> {
    // Load the config
    let config = ViTConfig::from_yaml(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate the config
    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    // Output result
    match format {
        "json" => {
            let result = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "image_size": config.image_size,
                "patch_size": config.patch_size,
                "num_classes": config.num_classes,
                "dim": config.dim,
                "pool": config.pool.as_str(),
                "channels": config.channels,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Config is valid: {:?}", config_path);
            println!("  Image Size: {}", config.image_size);
            println!("  Patch Size: {}", config.patch_size);
            println!("  Channels: {}", config.channels);
            println!("  Embedding Dim: {}", config.dim);
            println!("  Num Classes: {}", config.num_classes);
            println!("  Pooling: {}", config.pool);
        }
    }

    Ok(())
}

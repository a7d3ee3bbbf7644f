//! Infer command implementation.

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{VarBuilder, VarMap};
use tracing::{debug, info};
use vit_core::{Identity, Pool, ViTClassifier, ViTConfig};

/// Run the infer command.
pub fn run(
    config_path: &Path,
    batch: usize,
    pool: Option<&str>,
    warmup: usize,
    iterations: usize,
) -> Result<()> {
    if batch == 0 {
        bail!("Batch size must be > 0");
    }
    if iterations == 0 {
        bail!("At least one timed iteration is required");
    }

    let mut config = ViTConfig::from_yaml(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    if let Some(pool) = pool {
        config.pool = pool.parse::<Pool>()?;
    }

    let device = Device::Cpu;
    let shape = (batch, config.channels, config.image_size, config.image_size);

    println!("Inference Configuration:");
    println!("  Config: {:?}", config_path);
    println!("  Device: cpu");
    println!("  Backbone: identity");
    println!("  Pooling: {}", config.pool);
    println!("  Shape: {:?}", shape);
    println!("  Warmup: {}", warmup);
    println!("  Iterations: {}", iterations);
    println!();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let model = ViTClassifier::new(&config, Identity, vb)
        .with_context(|| "Failed to build classifier")?;
    info!(
        num_patches = model.num_patches(),
        params = config.compute_summary().total_params,
        "classifier initialized"
    );

    let input = Tensor::randn(0f32, 1.0, shape, &device)
        .with_context(|| "Failed to create input tensor")?;

    if warmup > 0 {
        println!("Running {} warmup iteration(s)...", warmup);
        for i in 0..warmup {
            model
                .forward(&input)
                .with_context(|| format!("Warmup iteration {} failed", i + 1))?;
        }
    }

    println!("Running {} timed iteration(s)...", iterations);
    let mut latencies = Vec::with_capacity(iterations);
    let mut output_shape = vec![];

    for i in 0..iterations {
        let start = Instant::now();
        let logits = model
            .forward(&input)
            .with_context(|| format!("Inference iteration {} failed", i + 1))?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(iteration = i + 1, latency_ms, "forward complete");

        latencies.push(latency_ms);
        if i == 0 {
            output_shape = logits.dims().to_vec();
        }
    }

    let mean_latency: f64 = latencies.iter().sum::<f64>() / latencies.len() as f64;
    let std_latency: f64 = if latencies.len() > 1 {
        let variance: f64 = latencies
            .iter()
            .map(|x| (x - mean_latency).powi(2))
            .sum::<f64>()
            / (latencies.len() - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };
    let min_latency = latencies.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_latency = latencies.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    println!();
    println!("Results:");
    println!("  Output shape: {:?}", output_shape);
    println!("  Latency:");
    println!("    Mean:   {:.3} ms", mean_latency);
    println!("    Std:    {:.3} ms", std_latency);
    println!("    Min:    {:.3} ms", min_latency);
    println!("    Max:    {:.3} ms", max_latency);

    let throughput = batch as f64 / (mean_latency / 1000.0);
    println!("  Throughput: {:.1} samples/sec", throughput);

    Ok(())
}

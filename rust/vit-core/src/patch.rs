//! Image to patch-sequence reshaping.
//!
//! A `[B, C, H, W]` image becomes `[B, (H/p)*(W/p), p*p*C]`: patches are
//! ordered row-major over the grid and each patch vector is laid out as
//! (row, column, channel) with the channel innermost.

use candle_core::{Result, Tensor};

/// Unfold `[B, C, H, W]` into `[B, (H/p)*(W/p), p*p*C]`.
pub fn patchify(images: &Tensor, patch_size: usize) -> Result<Tensor> {
    let (b, c, h, w) = images.dims4()?;
    let p = patch_size;
    if p == 0 || h % p != 0 || w % p != 0 {
        candle_core::bail!("image {h}x{w} is not a multiple of patch size {p}")
    }
    let gh = h / p;
    let gw = w / p;

    // [B, C, gh*p, gw*p] -> [B, C, gh, p, gw, p]
    let x = images.reshape((b, c, gh, p, gw, p))?;
    // -> [B, gh, gw, p, p, C]
    let x = x.permute((0, 2, 4, 3, 5, 1))?;
    x.reshape((b, gh * gw, p * p * c))
}

/// Fold `[B, (H/p)*(W/p), p*p*C]` back into `[B, C, H, W]`.
///
/// Exact inverse of [`patchify`] for the same `patch_size`.
pub fn unpatchify(patches: &Tensor, patch_size: usize, height: usize, width: usize) -> Result<Tensor> {
    let (b, n, patch_dim) = patches.dims3()?;
    let p = patch_size;
    if p == 0 || height % p != 0 || width % p != 0 {
        candle_core::bail!("image {height}x{width} is not a multiple of patch size {p}")
    }
    let gh = height / p;
    let gw = width / p;
    if n != gh * gw || patch_dim % (p * p) != 0 {
        candle_core::bail!(
            "patch sequence [{b}, {n}, {patch_dim}] does not fold into {height}x{width} with patch size {p}"
        )
    }
    let c = patch_dim / (p * p);

    // [B, gh*gw, p*p*C] -> [B, gh, gw, p, p, C]
    let x = patches.reshape((b, gh, gw, p, p, c))?;
    // -> [B, C, gh, p, gw, p]
    let x = x.permute((0, 5, 1, 3, 2, 4))?;
    x.reshape((b, c, height, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn patchify_shape() {
        let img = Tensor::zeros((2, 3, 16, 16), DType::F32, &Device::Cpu).unwrap();
        let patches = patchify(&img, 4).unwrap();
        // 16/4 * 16/4 = 16 patches, each 4*4*3=48 values
        assert_eq!(patches.dims(), &[2, 16, 48]);
    }

    #[test]
    fn patchify_row_major_order() {
        // Single channel 4x4 image holding 0..16
        let img = Tensor::arange(0f32, 16f32, &Device::Cpu)
            .unwrap()
            .reshape((1, 1, 4, 4))
            .unwrap();
        let patches: Vec<Vec<f32>> = patchify(&img, 2)
            .unwrap()
            .squeeze(0)
            .unwrap()
            .to_vec2()
            .unwrap();

        assert_eq!(patches[0], vec![0.0, 1.0, 4.0, 5.0]);
        assert_eq!(patches[1], vec![2.0, 3.0, 6.0, 7.0]);
        assert_eq!(patches[2], vec![8.0, 9.0, 12.0, 13.0]);
        assert_eq!(patches[3], vec![10.0, 11.0, 14.0, 15.0]);
    }

    #[test]
    fn patchify_channel_innermost() {
        // Channel 0 holds 0..16, channel 1 holds 16..32
        let img = Tensor::arange(0f32, 32f32, &Device::Cpu)
            .unwrap()
            .reshape((1, 2, 4, 4))
            .unwrap();
        let patches: Vec<Vec<f32>> = patchify(&img, 2)
            .unwrap()
            .squeeze(0)
            .unwrap()
            .to_vec2()
            .unwrap();

        assert_eq!(
            patches[0],
            vec![0.0, 16.0, 1.0, 17.0, 4.0, 20.0, 5.0, 21.0]
        );
    }

    #[test]
    fn patchify_rejects_indivisible() {
        let img = Tensor::zeros((1, 3, 10, 10), DType::F32, &Device::Cpu).unwrap();
        assert!(patchify(&img, 4).is_err());
    }

    #[test]
    fn patchify_rejects_wrong_rank() {
        let img = Tensor::zeros((3, 16, 16), DType::F32, &Device::Cpu).unwrap();
        assert!(patchify(&img, 4).is_err());
    }

    #[test]
    fn unpatchify_restores_image() {
        for (c, size, p) in [(1, 4, 2), (3, 16, 4), (3, 12, 12), (2, 9, 1)] {
            let img = Tensor::randn(0f32, 1.0, (2, c, size, size), &Device::Cpu).unwrap();
            let restored = unpatchify(&patchify(&img, p).unwrap(), p, size, size).unwrap();

            assert_eq!(restored.dims(), img.dims());
            let a: Vec<f32> = img.flatten_all().unwrap().to_vec1().unwrap();
            let b: Vec<f32> = restored.flatten_all().unwrap().to_vec1().unwrap();
            assert_eq!(a, b, "round trip mismatch for c={c} size={size} p={p}");
        }
    }

    #[test]
    fn unpatchify_rejects_wrong_patch_count() {
        let patches = Tensor::zeros((1, 5, 48), DType::F32, &Device::Cpu).unwrap();
        assert!(unpatchify(&patches, 4, 16, 16).is_err());
    }
}

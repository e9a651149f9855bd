//! Volume rendering.

pub use burn::{
    config::Config,
    tensor::{backend::Backend, Tensor},
};

use crate::function::TensorFloatExtension;
use burn::tensor::activation;
use std::f32::consts::PI;

/// Distance assigned to the last sample of every ray.
pub const DISTANCE_FAR: f32 = 1e10;

/// Added to every transmittance factor.
pub const TRANSMITTANCE_EPSILON: f32 = 1e-10;

/// Mapping from the rectified density to the density used for opacity.
#[derive(Config, Copy, Debug, PartialEq)]
pub enum DensityTransform {
    /// `σ`
    Identity,
    /// `exp(-σ^2 / 2) / sqrt(2π)`, the standard normal kernel.
    Gaussian,
}

/// Compositing samples along rays with the absorption model.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VolumeRenderer {
    pub density_transform: DensityTransform,
}

#[derive(Clone, Debug)]
pub struct VolumeRenderOutput<B: Backend> {
    /// `[R, 3]`
    pub colors_rgb: Tensor<B, 2>,
    /// `[R, S]`
    pub weights: Tensor<B, 2>,
}

impl DensityTransform {
    pub fn forward<B: Backend, const D: usize>(
        &self,
        densities: Tensor<B, D>,
    ) -> Tensor<B, D> {
        match self {
            Self::Identity => densities,
            Self::Gaussian => densities
                .powf_scalar(2.0)
                .mul_scalar(-0.5)
                .exp()
                .div_scalar((2.0 * PI).sqrt()),
        }
    }
}

impl VolumeRenderer {
    /// Rendering the raw field outputs sampled along the rays.
    ///
    /// ## Shapes
    ///
    /// * `raw` - `[R, S, 4]`, `[r, g, b, σ]` before activation.
    /// * `depths` - `[R, S]`, ascending.
    /// * `directions` - `[R, 3]`, not necessarily normalized.
    ///
    /// ## Details
    ///
    /// The weights are non-negative and sum to at most `1` for each ray.
    /// The process is completely differentiable.
    pub fn render<B: Backend>(
        &self,
        raw: Tensor<B, 3>,
        depths: Tensor<B, 2>,
        directions: Tensor<B, 2>,
    ) -> VolumeRenderOutput<B> {
        let [ray_count, sample_count, channel_count] = raw.dims();
        assert_eq!(
            channel_count, 4,
            "raw.dims()[2] should be 4, but got {:?}",
            raw.dims()
        );
        assert_eq!(
            depths.dims(),
            [ray_count, sample_count],
            "depths.dims() should be [{ray_count}, {sample_count}], but got {:?}",
            depths.dims(),
        );
        let device = raw.device();

        // [R, S, 3]
        let colors = activation::sigmoid(
            raw.to_owned().slice([0..ray_count, 0..sample_count, 0..3]),
        );
        // [R, S]
        let densities = self.density_transform.forward(activation::relu(
            raw.slice([0..ray_count, 0..sample_count, 3..4]).squeeze::<2>(2),
        ));

        // [R, S]
        let distance_far = Tensor::full([ray_count, 1], DISTANCE_FAR, &device);
        let distances = if sample_count > 1 {
            let depths_near =
                depths.to_owned().slice([0..ray_count, 0..sample_count - 1]);
            let depths_far = depths.slice([0..ray_count, 1..sample_count]);
            Tensor::cat(vec![depths_far - depths_near, distance_far], 1)
        } else {
            distance_far
        };
        // [R, 1]
        let direction_norms = directions.powf_scalar(2.0).sum_dim(1).sqrt();
        let distances = distances * direction_norms;

        // [R, S]
        let alphas = (densities * distances).neg().exp().neg().add_scalar(1.0);
        let transmittances = alphas
            .to_owned()
            .neg()
            .add_scalar(1.0 + TRANSMITTANCE_EPSILON)
            .prod_cumulative_exclusive(1);
        let weights = alphas * transmittances;

        // [R, 3] <- [R, S, 3]
        let colors_rgb = (weights.to_owned().unsqueeze_dim::<3>(2) * colors)
            .sum_dim(1)
            .squeeze::<2>(1);

        VolumeRenderOutput {
            colors_rgb,
            weights,
        }
    }
}

impl Default for DensityTransform {
    #[inline]
    fn default() -> Self {
        Self::Gaussian
    }
}

//! Stratified sampling for the coarse pass.

pub use super::*;

/// Sampling one depth per equal-width bin in `[near, far]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StratifiedSampler {
    /// The far bound.
    pub far: f32,
    /// The near bound.
    pub near: f32,
    /// `N`
    pub sample_count: usize,
}

impl StratifiedSampler {
    /// Width of each bin.
    ///
    /// `(far - near) / N`
    #[inline]
    pub fn bin_size(&self) -> f32 {
        (self.far - self.near) / self.sample_count as f32
    }

    /// Sampling depths for every ray.
    ///
    /// The depths are at the bin midpoints unless `is_perturbed` is set,
    /// in which case each depth is uniformly distributed within its bin.
    ///
    /// ## Shapes
    ///
    /// * `output` - `[R, N]`, ascending along the last dimension.
    pub fn sample<B: Backend, R: Rng + ?Sized>(
        &self,
        ray_count: usize,
        is_perturbed: bool,
        rng: &mut R,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        let shape = [ray_count, self.sample_count];

        // [R, N]
        let offsets = if is_perturbed {
            uniform_variates(shape, rng, device)
        } else {
            Tensor::full(shape, 0.5, device)
        };
        // [1, N]
        let bins = Tensor::<B, 1, Int>::arange(0..self.sample_count as i64, device)
            .float()
            .unsqueeze_dim::<2>(0);

        (offsets + bins)
            .mul_scalar(self.bin_size())
            .add_scalar(self.near)
    }
}

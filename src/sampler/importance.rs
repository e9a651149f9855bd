//! Importance sampling for the fine pass.

pub use super::*;

use crate::function::TensorFloatExtension;

/// Threshold below which a CDF interval is considered empty.
pub const DENOMINATOR_EPSILON: f32 = 1e-5;

/// Added to every weight so that all-zero weights still form a distribution.
pub const WEIGHT_EPSILON: f32 = 1e-5;

/// Sampling depths from the piecewise-constant distribution
/// given by the weights of a previous pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportanceSampler {
    /// `N`
    pub sample_count: usize,
}

impl ImportanceSampler {
    /// Sampling depths by inverting the CDF of the weights.
    ///
    /// The variates are evenly spaced in `[0, 1]` unless `is_perturbed` is set,
    /// in which case they are drawn from `rng`.
    ///
    /// ## Shapes
    ///
    /// * `bins` - `[R, K + 1]`, the bin edges, ascending.
    /// * `weights` - `[R, K]`, non-negative.
    /// * `output` - `[R, N]`, within the bin edges, not sorted.
    ///
    /// ## Details
    ///
    /// The output is detached from the computation graph.
    pub fn sample<B: Backend, R: Rng + ?Sized>(
        &self,
        bins: Tensor<B, 2>,
        weights: Tensor<B, 2>,
        is_perturbed: bool,
        rng: &mut R,
    ) -> Tensor<B, 2> {
        let device = weights.device();
        let [ray_count, bin_count] = weights.dims();
        assert_eq!(
            bins.dims(),
            [ray_count, bin_count + 1],
            "bins.dims() should be [{ray_count}, {}], but got {:?}",
            bin_count + 1,
            bins.dims(),
        );

        let bins = bins.detach();
        let weights = weights.detach().add_scalar(WEIGHT_EPSILON);

        // [R, K + 1]
        let pdf = weights.to_owned() / weights.sum_dim(1);
        let cdf = Tensor::cat(
            vec![Tensor::zeros([ray_count, 1], &device), pdf.sum_cumulative(1)],
            1,
        );

        // [R, N]
        let shape = [ray_count, self.sample_count];
        let variates = if is_perturbed {
            uniform_variates(shape, rng, &device)
        } else {
            Tensor::<B, 1, Int>::arange(0..self.sample_count as i64, &device)
                .float()
                .div_scalar((self.sample_count.max(2) - 1) as f32)
                .unsqueeze_dim::<2>(0)
                .expand(shape)
        };

        // Counting the CDF values no greater than each variate,
        // one CDF column at a time to keep the search within [R, N].
        let indices = cdf.to_owned().iter_dim(1).fold(
            Tensor::<B, 2, Int>::zeros(shape, &device),
            |indices, cdf_column| {
                let is_above = variates
                    .to_owned()
                    .greater_equal(cdf_column.expand(shape));
                indices + is_above.int()
            },
        );
        let indices_below = indices.to_owned().sub_scalar(1).clamp_min(0);
        let indices_above = indices.clamp_max(bin_count as i64);

        let cdf_below = cdf.to_owned().gather(1, indices_below.to_owned());
        let cdf_above = cdf.gather(1, indices_above.to_owned());
        let bins_below = bins.to_owned().gather(1, indices_below);
        let bins_above = bins.gather(1, indices_above);

        let denominators = cdf_above - cdf_below.to_owned();
        let denominators = denominators
            .to_owned()
            .mask_fill(denominators.lower_elem(DENOMINATOR_EPSILON), 1.0);
        let ratios = (variates - cdf_below) / denominators;

        (bins_below.to_owned() + ratios * (bins_above - bins_below)).detach()
    }
}

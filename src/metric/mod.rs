//! Image reconstruction metrics.

pub use burn::tensor::{backend::Backend, Tensor};

use burn::nn::loss::{MseLoss, Reduction};

/// Mean squared error of the rendered colors.
///
/// ## Shapes
///
/// * `output` - `[N, 3]`
/// * `target` - `[N, 3]`
/// * Return - `[1]`
pub fn mean_squared_error<B: Backend>(
    output: Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Tensor<B, 1> {
    MseLoss::new().forward(output, target, Reduction::Mean)
}

/// Peak signal-to-noise ratio in decibels for colors ranging from `0` to `1`.
///
/// It is infinite if `mse` is zero.
#[inline]
pub fn psnr(mse: f64) -> f64 {
    -10.0 * mse.log10()
}

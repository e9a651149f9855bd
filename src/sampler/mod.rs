//! Depth sampling along rays.

pub mod importance;
pub mod stratified;

pub use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
pub use importance::*;
pub use rand::Rng;
pub use stratified::*;

use rand_distr::{Distribution, Uniform};

/// Midpoints between consecutive depths.
///
/// ## Shapes
///
/// * `depths` - `[R, S]`
/// * `output` - `[R, S - 1]`
pub fn midpoints<B: Backend>(depths: Tensor<B, 2>) -> Tensor<B, 2> {
    let [ray_count, sample_count] = depths.dims();
    let depths_near = depths.to_owned().slice([0..ray_count, 0..sample_count - 1]);
    let depths_far = depths.slice([0..ray_count, 1..sample_count]);
    (depths_near + depths_far).mul_scalar(0.5)
}

/// Uniform variates in `[0, 1)` drawn from `rng` in row-major order.
pub(crate) fn uniform_variates<B: Backend, R: Rng + ?Sized>(
    shape: [usize; 2],
    rng: &mut R,
    device: &B::Device,
) -> Tensor<B, 2> {
    let count = shape[0] * shape[1];
    let variates = Uniform::new(0.0_f32, 1.0)
        .sample_iter(&mut *rng)
        .take(count)
        .collect::<Vec<_>>();
    Tensor::from_data(TensorData::new(variates, shape), device)
}

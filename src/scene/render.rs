//! Scene model rendering.

pub use super::*;
pub use rand::Rng;

use crate::{function::split_rows, sampler::midpoints, volume::VolumeRenderOutput};

/// Whether the model is rendered for training or evaluation.
///
/// Stochastic sampling only happens in training.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    #[default]
    Evaluation,
    Training,
}

#[derive(Clone)]
pub struct SceneRenderOutput<B: Backend> {
    /// Final colors.
    ///
    /// The shape is `[N, 3]`, ranging from `0.0` to `1.0`.
    pub colors_rgb: Tensor<B, 2>,
    /// Colors of the coarse pass.
    ///
    /// The shape is `[N, 3]`.
    /// They are the same as [`Self::colors_rgb`] without hierarchical sampling.
    pub colors_rgb_coarse: Tensor<B, 2>,
    /// Depths of the final pass.
    ///
    /// The shape is `[N, S]`, ascending.
    pub depths: Tensor<B, 2>,
    /// Weights of the final pass.
    ///
    /// The shape is `[N, S]`.
    pub weights: Tensor<B, 2>,
}

impl Mode {
    #[inline]
    pub const fn is_training(&self) -> bool {
        matches!(self, Self::Training)
    }
}

impl<B: Backend> SceneModel<B> {
    /// Rendering the colors of the rays.
    ///
    /// ## Arguments
    ///
    /// * `rays_o` - Origins of the rays in world space, `[N, 3]`.
    /// * `rays_d` - Directions of the rays in world space, `[N, 3]`.
    /// * `mode` - See [`Mode`].
    /// * `rng` - The random source of stochastic sampling.
    ///
    /// ## Details
    ///
    /// The colors are differentiable with respect to the network parameters,
    /// except through the depths drawn by importance sampling.
    pub fn render<R: Rng + ?Sized>(
        &self,
        rays_o: Tensor<B, 2>,
        rays_d: Tensor<B, 2>,
        mode: Mode,
        rng: &mut R,
    ) -> Result<SceneRenderOutput<B>, Error> {
        let ray_count = rays_o.dims()[0];
        if ray_count == 0 || rays_o.dims()[1] != 3 {
            return Err(Error::Shape("rays_o".into(), rays_o.dims().to_vec()));
        }
        if rays_d.dims() != [ray_count, 3] {
            return Err(Error::Shape(
                format!("rays_d (N = {ray_count})"),
                rays_d.dims().to_vec(),
            ));
        }

        let config = self.config();
        let device = rays_o.device();

        #[cfg(debug_assertions)]
        log::debug!(
            target: "nerf_renderer::scene",
            "render > coarse ({ray_count} rays, {mode:?})",
        );

        // [N, S_c]
        let depths_coarse = self.sampler_stratified().sample(
            ray_count,
            mode.is_training() && config.is_stratified_perturbed,
            rng,
            &device,
        );
        let output_coarse = self.render_pass(
            &self.coarse,
            rays_o.to_owned(),
            rays_d.to_owned(),
            depths_coarse.to_owned(),
        );

        let Some(fine) = &self.fine else {
            return Ok(SceneRenderOutput {
                colors_rgb: output_coarse.colors_rgb.to_owned(),
                colors_rgb_coarse: output_coarse.colors_rgb,
                depths: depths_coarse,
                weights: output_coarse.weights,
            });
        };

        #[cfg(debug_assertions)]
        log::debug!(target: "nerf_renderer::scene", "render > fine");

        // [N, S_c - 2]
        let sample_count_coarse = depths_coarse.dims()[1];
        let weights_coarse = output_coarse
            .weights
            .slice([0..ray_count, 1..sample_count_coarse - 1]);
        // [N, S_f]
        let depths_fine = self.sampler_importance().sample(
            midpoints(depths_coarse.to_owned()),
            weights_coarse,
            mode.is_training() && config.is_importance_perturbed,
            rng,
        );
        // [N, S_c + S_f]
        let depths = Tensor::cat(vec![depths_coarse, depths_fine], 1).sort(1);

        let output_fine =
            self.render_pass(fine, rays_o, rays_d, depths.to_owned());

        Ok(SceneRenderOutput {
            colors_rgb: output_fine.colors_rgb,
            colors_rgb_coarse: output_coarse.colors_rgb,
            depths,
            weights: output_fine.weights,
        })
    }

    /// Evaluating the network at the encoded inputs chunk by chunk.
    ///
    /// ## Shapes
    ///
    /// * `positions` - `[P, dim_position]`
    /// * `directions` - `[P, dim_direction]`
    /// * `output` - `[P, 4]`
    pub fn forward_chunked(
        &self,
        network: &FieldNetwork<B>,
        positions: Tensor<B, 2>,
        directions: Option<Tensor<B, 2>>,
    ) -> Tensor<B, 2> {
        let chunk_size = self.config().chunk_size;
        let mut chunks_direction =
            directions.map(|directions| split_rows(directions, chunk_size).into_iter());

        let outputs = split_rows(positions, chunk_size)
            .into_iter()
            .map(|chunk_position| {
                let chunk_direction =
                    chunks_direction.as_mut().and_then(|chunks| chunks.next());
                network.forward(chunk_position, chunk_direction)
            })
            .collect::<Vec<_>>();

        #[cfg(debug_assertions)]
        log::debug!(
            target: "nerf_renderer::scene",
            "forward_chunked > {} chunk(s) of size {chunk_size}",
            outputs.len(),
        );

        Tensor::cat(outputs, 0)
    }

    /// Rendering the rays with the network evaluated at the given depths.
    fn render_pass(
        &self,
        network: &FieldNetwork<B>,
        rays_o: Tensor<B, 2>,
        rays_d: Tensor<B, 2>,
        depths: Tensor<B, 2>,
    ) -> VolumeRenderOutput<B> {
        let [ray_count, sample_count] = depths.dims();
        let point_count = ray_count * sample_count;
        let shape = [ray_count, sample_count, 3];

        // [N * S, 3] <- [N, S, 3]
        let points = rays_o.unsqueeze_dim::<3>(1).expand(shape)
            + rays_d.to_owned().unsqueeze_dim::<3>(1).expand(shape)
                * depths.to_owned().unsqueeze_dim::<3>(2).expand(shape);
        let positions = self
            .encoder_position
            .forward(points.reshape([point_count, 3]));

        // [N * S, 3] <- [N, 3]
        let directions = self.encoder_direction.as_ref().map(|encoder| {
            let norms = rays_d
                .to_owned()
                .powf_scalar(2.0)
                .sum_dim(1)
                .sqrt()
                .clamp_min(f32::EPSILON);
            let directions = (rays_d.to_owned() / norms)
                .unsqueeze_dim::<3>(1)
                .expand(shape)
                .reshape([point_count, 3]);
            encoder.forward(directions)
        });

        // [N, S, 4]
        let raw = self
            .forward_chunked(network, positions, directions)
            .reshape([ray_count, sample_count, 4]);

        self.volume_renderer().render(raw, depths, rays_d)
    }
}

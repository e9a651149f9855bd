//! Optimization of the scene model on batches of rays.

pub use crate::{
    error::Error,
    metric::{mean_squared_error, psnr},
    scene::{Mode, SceneModel},
};
pub use burn::{
    config::Config,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Tensor,
    },
};
pub use rand::Rng;

use rand::{rngs::StdRng, SeedableRng};

/// The configuration for [`SceneTrainer`].
#[derive(Config)]
pub struct SceneTrainerConfig {
    #[config(default = 5e-4)]
    pub learning_rate: f64,
    #[config(default = "AdamConfig::new()")]
    pub optimizer: AdamConfig,
}

/// Updating the scene model with one batch of rays at a time.
#[derive(Clone)]
pub struct SceneTrainer<O> {
    pub learning_rate: f64,
    pub optimizer: O,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutput {
    /// The optimized loss.
    ///
    /// It includes the coarse error with hierarchical sampling.
    pub loss: f64,
    /// PSNR of the final colors in decibels.
    pub psnr: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluateOutput {
    pub mse: f64,
    /// In decibels.
    pub psnr: f64,
}

impl SceneTrainerConfig {
    pub fn init<AB: AutodiffBackend>(
        &self
    ) -> SceneTrainer<impl Optimizer<SceneModel<AB>, AB>> {
        SceneTrainer {
            learning_rate: self.learning_rate,
            optimizer: self.optimizer.init::<AB, SceneModel<AB>>(),
        }
    }
}

impl<O> SceneTrainer<O> {
    /// Rendering the rays in training mode and taking one optimizer step
    /// on the squared error against `target`.
    ///
    /// The loss is the error of the final colors plus, with hierarchical
    /// sampling, the error of the coarse colors. Training on the final colors
    /// alone, as the classic two-network setup reports it, would leave the
    /// coarse network untrained since the fine depths are detached.
    ///
    /// ## Shapes
    ///
    /// * `rays_o` - `[N, 3]`
    /// * `rays_d` - `[N, 3]`
    /// * `target` - `[N, 3]`, colors ranging from `0.0` to `1.0`.
    pub fn step<AB: AutodiffBackend, R: Rng + ?Sized>(
        &mut self,
        model: SceneModel<AB>,
        rays_o: Tensor<AB, 2>,
        rays_d: Tensor<AB, 2>,
        target: Tensor<AB, 2>,
        rng: &mut R,
    ) -> Result<(SceneModel<AB>, StepOutput), Error>
    where
        O: Optimizer<SceneModel<AB>, AB>,
    {
        check_target(&rays_o, &target)?;

        let output = model.render(rays_o, rays_d, Mode::Training, rng)?;

        let loss_fine = mean_squared_error(output.colors_rgb, target.to_owned());
        let mse = loss_fine.to_owned().into_scalar().elem::<f64>();
        let loss = if model.is_hierarchical() {
            loss_fine + mean_squared_error(output.colors_rgb_coarse, target)
        } else {
            loss_fine
        };
        let loss_value = loss.to_owned().into_scalar().elem::<f64>();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let model = self.optimizer.step(self.learning_rate, model, grads);

        #[cfg(debug_assertions)]
        log::debug!(
            target: "nerf_renderer::train",
            "step > loss ({loss_value:.6}), psnr ({:.3})",
            psnr(mse),
        );

        Ok((
            model,
            StepOutput {
                loss: loss_value,
                psnr: psnr(mse),
            },
        ))
    }
}

/// Rendering the holdout rays in evaluation mode and measuring the final colors.
pub fn evaluate<B: Backend>(
    model: &SceneModel<B>,
    rays_o: Tensor<B, 2>,
    rays_d: Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Result<EvaluateOutput, Error> {
    check_target(&rays_o, &target)?;

    // Evaluation never draws from it.
    let rng = &mut StdRng::seed_from_u64(0);
    let output = model.render(rays_o, rays_d, Mode::Evaluation, rng)?;
    let mse = mean_squared_error(output.colors_rgb, target)
        .into_scalar()
        .elem::<f64>();
    let psnr = psnr(mse);

    log::info!(
        target: "nerf_renderer::train",
        "evaluate > mse ({mse:.6}), psnr ({psnr:.3} dB)",
    );

    Ok(EvaluateOutput { mse, psnr })
}

fn check_target<B: Backend>(
    rays_o: &Tensor<B, 2>,
    target: &Tensor<B, 2>,
) -> Result<(), Error> {
    let ray_count = rays_o.dims()[0];
    if target.dims() != [ray_count, 3] {
        return Err(Error::Shape(
            format!("target (N = {ray_count})"),
            target.dims().to_vec(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::Autodiff,
        camera::Camera,
        field::FieldNetworkConfig,
        scene::SceneModelConfig,
    };
    use burn::backend::NdArray;

    type AB = Autodiff<NdArray<f32>>;

    fn config_small() -> SceneModelConfig {
        let network = FieldNetworkConfig::new(15)
            .with_depth(2)
            .with_width(8)
            .with_skips(vec![]);
        SceneModelConfig::new(2.0, 6.0)
            .with_sample_count_coarse(8)
            .with_sample_count_fine(8)
            .with_band_count_position(2)
            .with_is_view_dependent(false)
            .with_coarse(network.to_owned())
            .with_fine(Some(network))
    }

    fn rays<B: Backend>(device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        Camera::from_3x4(
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 4.0],
            ],
            1.5,
            2,
            2,
        )
        .rays::<B>(device)
        .unwrap()
        .flatten()
    }

    fn weights<B: Backend>(model: &SceneModel<B>) -> [Vec<f32>; 2] {
        let fine = model.fine.as_ref().unwrap();
        [&model.coarse, fine].map(|network| {
            network
                .input
                .weight
                .val()
                .into_data()
                .to_vec::<f32>()
                .unwrap()
        })
    }

    #[test]
    fn config_default() {
        let config = SceneTrainerConfig::new();
        assert_eq!(config.learning_rate, 5e-4);

        let json = config.to_string();
        assert!(json.contains("learning_rate"), "{json}");
        assert!(json.contains("optimizer"), "{json}");
    }

    #[test]
    fn step() {
        let device = &Default::default();
        let rng = &mut StdRng::seed_from_u64(0x3D65);
        let (rays_o, rays_d) = rays::<AB>(device);
        let target = Tensor::<AB, 2>::full([4, 3], 0.75, device);

        let model = config_small().init::<AB>(device).unwrap();
        let weights_before = weights(&model);
        let mut trainer = SceneTrainerConfig::new().init::<AB>();

        let (model, output) = trainer
            .step(model, rays_o, rays_d, target, rng)
            .unwrap();
        assert!(output.loss.is_finite() && output.loss > 0.0, "{output:?}");
        assert!(output.psnr.is_finite(), "{output:?}");

        let weights_after = weights(&model);
        assert_ne!(weights_before[0], weights_after[0]);
        assert_ne!(weights_before[1], weights_after[1]);
    }

    #[test]
    fn step_invalid_target() {
        let device = &Default::default();
        let rng = &mut StdRng::seed_from_u64(0x3D65);
        let (rays_o, rays_d) = rays::<AB>(device);
        let target = Tensor::<AB, 2>::zeros([3, 3], device);

        let model = config_small().init::<AB>(device).unwrap();
        let mut trainer = SceneTrainerConfig::new().init::<AB>();

        let output = trainer.step(model, rays_o, rays_d, target, rng);
        assert!(matches!(output, Err(Error::Shape(..))));
    }

    #[test]
    fn evaluate_rendered() {
        type B = NdArray<f32>;

        let device = &Default::default();
        let rng = &mut StdRng::seed_from_u64(0x3D65);
        let (rays_o, rays_d) = rays::<B>(device);

        let model = config_small().init::<B>(device).unwrap();
        let target = model
            .render(rays_o.to_owned(), rays_d.to_owned(), Mode::Evaluation, rng)
            .unwrap()
            .colors_rgb;

        let output =
            evaluate(&model, rays_o.to_owned(), rays_d.to_owned(), target)
                .unwrap();
        assert_eq!(output.mse, 0.0);
        assert_eq!(output.psnr, f64::INFINITY);

        let target = Tensor::<B, 2>::zeros([4, 3], device);
        let output = evaluate(&model, rays_o, rays_d, target).unwrap();
        assert!(output.mse > 0.0 && output.psnr.is_finite(), "{output:?}");
    }
}

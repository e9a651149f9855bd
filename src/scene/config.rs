pub use super::*;

/// The configuration for [`SceneModel`].
#[derive(Config, Debug)]
pub struct SceneModelConfig {
    /// The near bound of every ray.
    pub near: f32,
    /// The far bound of every ray.
    pub far: f32,
    /// Number of stratified samples per ray.
    #[config(default = 64)]
    pub sample_count_coarse: usize,
    /// Number of importance samples per ray.
    #[config(default = 128)]
    pub sample_count_fine: usize,
    /// Maximum number of points evaluated by a network at once.
    ///
    /// It does not affect the rendered colors.
    #[config(default = "1 << 15")]
    pub chunk_size: usize,
    /// Number of frequency bands to encode positions.
    #[config(default = 10)]
    pub band_count_position: usize,
    /// Number of frequency bands to encode view directions.
    #[config(default = 4)]
    pub band_count_direction: usize,
    /// Whether the colors depend on view directions.
    #[config(default = true)]
    pub is_view_dependent: bool,
    /// Whether the stratified samples are jittered in training.
    #[config(default = true)]
    pub is_stratified_perturbed: bool,
    /// Whether the importance samples are drawn randomly in training.
    #[config(default = false)]
    pub is_importance_perturbed: bool,
    /// See [`DensityTransform`].
    #[config(default = "DensityTransform::Gaussian")]
    pub density_transform: DensityTransform,
    /// The coarse network.
    #[config(default = "FieldNetworkConfig::new(63).with_dim_direction(27)")]
    pub coarse: FieldNetworkConfig,
    /// The fine network. Hierarchical sampling is disabled if it is `None`.
    pub fine: Option<FieldNetworkConfig>,
}

/// Presets
impl SceneModelConfig {
    /// The full NeRF model for capable GPUs.
    ///
    /// 64 coarse and 128 fine samples, view-dependent colors,
    /// and 8-layer networks with a skip connection at layer 4.
    ///
    /// The fine network is 2 units wider than the coarse one.
    pub fn full(
        near: f32,
        far: f32,
    ) -> Self {
        let config = Self::new(near, far);
        let fine = config.coarse.to_owned().with_width(258);
        config.with_fine(Some(fine))
    }

    /// A light model for CPUs and small GPUs.
    ///
    /// 32 coarse and 32 fine samples, view-independent colors,
    /// a shallow coarse network and a 6-layer fine network.
    pub fn tiny(
        near: f32,
        far: f32,
    ) -> Self {
        let dim_position = PositionalEncoderConfig::new()
            .with_band_count(6)
            .dim_output();
        Self::new(near, far)
            .with_sample_count_coarse(32)
            .with_sample_count_fine(32)
            .with_band_count_position(6)
            .with_is_view_dependent(false)
            .with_is_stratified_perturbed(false)
            .with_coarse(
                FieldNetworkConfig::new(dim_position)
                    .with_depth(2)
                    .with_width(128)
                    .with_skips(vec![]),
            )
            .with_fine(Some(
                FieldNetworkConfig::new(dim_position)
                    .with_depth(6)
                    .with_width(128)
                    .with_skips(vec![3]),
            ))
    }
}

impl SceneModelConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<SceneModel<B>, Error> {
        self.validate()?;

        if let Some(fine) = &self.fine {
            if fine.width != self.coarse.width {
                log::warn!(
                    target: "nerf_renderer::scene",
                    "The fine network width ({}) differs from the coarse one ({})",
                    fine.width,
                    self.coarse.width,
                );
            }
        }

        let encoder_position = self.encoder_position().init();
        let encoder_direction = self
            .is_view_dependent
            .then(|| self.encoder_direction().init());
        let coarse = self.coarse.init(device)?;
        let fine = self
            .fine
            .as_ref()
            .map(|fine| fine.init(device))
            .transpose()?;

        log::debug!(
            target: "nerf_renderer::scene",
            "SceneModelConfig::init > coarse ({} params), fine ({:?} params)",
            coarse.num_params(),
            fine.as_ref().map(Module::num_params),
        );

        Ok(SceneModel {
            coarse,
            fine,
            encoder_position,
            encoder_direction,
            config: Ignored(self.to_owned()),
        })
    }

    /// The configuration of the position encoder.
    #[inline]
    pub fn encoder_position(&self) -> PositionalEncoderConfig {
        PositionalEncoderConfig::new().with_band_count(self.band_count_position)
    }

    /// The configuration of the view direction encoder.
    #[inline]
    pub fn encoder_direction(&self) -> PositionalEncoderConfig {
        PositionalEncoderConfig::new().with_band_count(self.band_count_direction)
    }

    /// Checking the bounds, the sample counts and the network input dimensions.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.near < self.far) {
            return Err(Error::Validation(
                format!("near ({})", self.near),
                format!("less than far ({})", self.far),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::Validation(
                "chunk_size".into(),
                "positive".into(),
            ));
        }
        if self.sample_count_coarse == 0 {
            return Err(Error::Validation(
                "sample_count_coarse".into(),
                "positive".into(),
            ));
        }
        if self.fine.is_some() {
            // The importance sampler takes the weights between the first and the last.
            if self.sample_count_coarse < 3 {
                return Err(Error::Validation(
                    format!("sample_count_coarse ({})", self.sample_count_coarse),
                    "at least 3 with hierarchical sampling".into(),
                ));
            }
            if self.sample_count_fine == 0 {
                return Err(Error::Validation(
                    "sample_count_fine".into(),
                    "positive with hierarchical sampling".into(),
                ));
            }
        }

        let dim_position = self.encoder_position().dim_output();
        let dim_direction = if self.is_view_dependent {
            self.encoder_direction().dim_output()
        } else {
            0
        };
        let networks = [("coarse", Some(&self.coarse)), ("fine", self.fine.as_ref())];
        for (name, network) in networks {
            let Some(network) = network else {
                continue;
            };
            if network.dim_position != dim_position {
                return Err(Error::Validation(
                    format!("{name}.dim_position ({})", network.dim_position),
                    format!(
                        "{dim_position} for {} position bands",
                        self.band_count_position
                    ),
                ));
            }
            if network.dim_direction != dim_direction {
                return Err(Error::Validation(
                    format!("{name}.dim_direction ({})", network.dim_direction),
                    if self.is_view_dependent {
                        format!(
                            "{dim_direction} for {} direction bands",
                            self.band_count_direction
                        )
                    } else {
                        "0 without view dependence".into()
                    },
                ));
            }
            network.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn presets() {
        use super::*;

        let config = SceneModelConfig::full(2.0, 6.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.coarse.width, 256);
        assert_eq!(config.fine.as_ref().map(|fine| fine.width), Some(258));

        let config = SceneModelConfig::tiny(2.0, 6.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.coarse.dim_position, 39);
        assert!(!config.is_view_dependent);
    }

    #[test]
    fn init_tiny() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let model = SceneModelConfig::tiny(2.0, 6.0).init::<B>(device).unwrap();
        assert!(model.is_hierarchical());
        assert!(!model.is_view_dependent());
        assert_eq!(model.coarse.hiddens.len(), 1);
        assert_eq!(model.fine.as_ref().map(|fine| fine.hiddens.len()), Some(5));
        assert_eq!(model.encoder_position.dim_output(), 39);
    }

    #[test]
    fn validate() {
        use super::*;

        let config = SceneModelConfig::full(6.0, 2.0);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::full(2.0, 2.0);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::full(2.0, 6.0).with_chunk_size(0);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::full(2.0, 6.0).with_sample_count_coarse(2);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::full(2.0, 6.0)
            .with_sample_count_coarse(2)
            .with_fine(None);
        assert!(config.validate().is_ok());

        let config = SceneModelConfig::full(2.0, 6.0).with_band_count_position(6);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::full(2.0, 6.0).with_is_view_dependent(false);
        assert!(matches!(config.validate(), Err(Error::Validation(..))));

        let config = SceneModelConfig::tiny(2.0, 6.0).with_band_count_direction(0);
        assert!(config.validate().is_ok());
    }
}

//! Scene model property implementation.

pub use super::*;

use crate::{
    sampler::{ImportanceSampler, StratifiedSampler},
    volume::VolumeRenderer,
};
use humansize::{format_size, BINARY};

/// Attribute getters
impl<B: Backend> SceneModel<B> {
    /// The configuration.
    #[inline]
    pub fn config(&self) -> &SceneModelConfig {
        &self.config.0
    }

    /// The device.
    #[inline]
    pub fn device(&self) -> B::Device {
        self.devices().first().expect("A device").to_owned()
    }

    /// Whether the fine network refines the coarse samples.
    #[inline]
    pub fn is_hierarchical(&self) -> bool {
        self.fine.is_some()
    }

    /// Whether the colors depend on view directions.
    #[inline]
    pub fn is_view_dependent(&self) -> bool {
        self.encoder_direction.is_some()
    }

    /// Size of the parameters in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.num_params() * size_of::<B::FloatElem>()
    }

    /// Readable size of the parameters.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

/// Rendering stages
impl<B: Backend> SceneModel<B> {
    /// The sampler for the coarse pass.
    #[inline]
    pub fn sampler_stratified(&self) -> StratifiedSampler {
        let config = self.config();
        StratifiedSampler {
            far: config.far,
            near: config.near,
            sample_count: config.sample_count_coarse,
        }
    }

    /// The sampler for the fine pass.
    #[inline]
    pub fn sampler_importance(&self) -> ImportanceSampler {
        ImportanceSampler {
            sample_count: self.config().sample_count_fine,
        }
    }

    /// The volume renderer for both passes.
    #[inline]
    pub fn volume_renderer(&self) -> VolumeRenderer {
        VolumeRenderer {
            density_transform: self.config().density_transform,
        }
    }
}

/// Attribute setters
impl<B: Backend> SceneModel<B> {
    /// Changing the number of points evaluated by a network at once.
    pub fn with_chunk_size(
        mut self,
        chunk_size: usize,
    ) -> Result<Self, Error> {
        if chunk_size == 0 {
            return Err(Error::Validation(
                "chunk_size".into(),
                "positive".into(),
            ));
        }
        self.config.0.chunk_size = chunk_size;
        Ok(self)
    }
}

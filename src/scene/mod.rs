//! NeRF scene model with coarse and fine field networks.

pub mod config;
pub mod property;
pub mod render;

pub use crate::{
    encoder::{PositionalEncoder, PositionalEncoderConfig},
    error::Error,
    field::{FieldNetwork, FieldNetworkConfig},
    volume::DensityTransform,
};
pub use burn::{
    config::Config,
    module::{Ignored, Module},
    tensor::{backend::Backend, Tensor},
};
pub use config::*;
pub use render::*;

use std::fmt;

/// A radiance field rendered by hierarchical volume sampling.
///
/// ## Details
///
/// The fine network is present if hierarchical sampling is enabled.
#[derive(Module)]
pub struct SceneModel<B: Backend> {
    /// Network evaluated at the stratified samples.
    pub coarse: FieldNetwork<B>,
    /// Network evaluated at the stratified and importance samples.
    pub fine: Option<FieldNetwork<B>>,
    /// Encoder of the sample positions.
    pub encoder_position: PositionalEncoder,
    /// Encoder of the normalized view directions.
    pub encoder_direction: Option<PositionalEncoder>,
    /// The validated configuration.
    pub config: Ignored<SceneModelConfig>,
}

impl<B: Backend> fmt::Debug for SceneModel<B> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct(&format!("SceneModel<{}>", B::name()))
            .field("device", &self.device())
            .field("size", &self.size_readable())
            .field("coarse.num_params()", &self.coarse.num_params())
            .field(
                "fine.num_params()",
                &self.fine.as_ref().map(Module::num_params),
            )
            .field("near", &self.config.0.near)
            .field("far", &self.config.0.far)
            .field("chunk_size", &self.config.0.chunk_size)
            .finish()
    }
}

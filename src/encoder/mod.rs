//! Positional encoding.

pub use burn::{
    config::Config,
    module::Module,
    tensor::{backend::Backend, Tensor},
};

/// The configuration for [`PositionalEncoder`].
#[derive(Config, Copy, Debug)]
pub struct PositionalEncoderConfig {
    /// Number of frequency bands.
    #[config(default = 10)]
    pub band_count: usize,
    /// Input dimension.
    #[config(default = 3)]
    pub dim_input: usize,
}

/// Frequency encoding of low-dimensional coordinates.
///
/// `[x, sin(2^0 * x), cos(2^0 * x), ..., sin(2^(L-1) * x), cos(2^(L-1) * x)]`
///
/// ## Details
///
/// It has no learnable parameters.
/// With no frequency bands, it passes the input through.
#[derive(Clone, Debug, Module)]
pub struct PositionalEncoder {
    /// `L`
    pub band_count: usize,
    /// `D`
    pub dim_input: usize,
}

impl PositionalEncoderConfig {
    /// Initialize from the configuration.
    pub fn init(&self) -> PositionalEncoder {
        PositionalEncoder {
            band_count: self.band_count,
            dim_input: self.dim_input,
        }
    }

    /// Output dimension of the encoder.
    #[inline]
    pub const fn dim_output(&self) -> usize {
        self.dim_input * (1 + 2 * self.band_count)
    }
}

impl PositionalEncoder {
    /// Output dimension.
    ///
    /// `D * (1 + 2 * L)`
    #[inline]
    pub const fn dim_output(&self) -> usize {
        self.dim_input * (1 + 2 * self.band_count)
    }

    /// Encode the input coordinates.
    ///
    /// ## Shapes
    ///
    /// * `input` - `[..., D]`
    /// * `output` - [`[..., D * (1 + 2 * L)]`](Self::dim_output)
    pub fn forward<B: Backend, const D: usize>(
        &self,
        input: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let dim_last = D - 1;
        let dim_input = input.dims()[dim_last];
        assert_eq!(
            dim_input, self.dim_input,
            "The last dimension of input should be {}, but got {:?}",
            self.dim_input,
            input.dims(),
        );

        if self.band_count == 0 {
            return input;
        }

        let mut features = Vec::with_capacity(1 + 2 * self.band_count);
        features.push(input.to_owned());
        for band in 0..self.band_count {
            let input_scaled = input.to_owned().mul_scalar(2.0_f32.powi(band as i32));
            features.push(input_scaled.to_owned().sin());
            features.push(input_scaled.cos());
        }

        Tensor::cat(features, dim_last)
    }
}

impl Default for PositionalEncoderConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

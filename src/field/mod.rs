//! Density and color field network.

pub use crate::error::Error;
pub use burn::{
    config::Config,
    module::Module,
    nn::{Linear, Relu},
    tensor::{backend::Backend, Tensor},
};

use burn::nn::LinearConfig;

/// The configuration for [`FieldNetwork`].
#[derive(Config, Debug)]
pub struct FieldNetworkConfig {
    /// Dimension of the encoded position.
    pub dim_position: usize,
    /// Dimension of the encoded view direction.
    ///
    /// The network is view-independent if it is zero.
    #[config(default = 0)]
    pub dim_direction: usize,
    /// Number of linear layers before the output heads.
    #[config(default = 8)]
    pub depth: usize,
    /// Hidden dimension.
    #[config(default = 256)]
    pub width: usize,
    /// Indices of the hidden layers receiving the encoded position again.
    #[config(default = "vec![4]")]
    pub skips: Vec<usize>,
}

/// Feed-forward network mapping encoded positions (and view directions)
/// to raw colors and densities.
///
/// ## Details
///
/// The raw output is `[r, g, b, σ]` before any activation.
#[derive(Debug, Module)]
pub struct FieldNetwork<B: Backend> {
    /// The input linear layer.
    pub input: Linear<B>,
    /// The hidden linear layers.
    pub hiddens: Vec<Linear<B>>,
    /// The output head of view-independent network.
    pub head: Option<Linear<B>>,
    /// The output heads of view-dependent network.
    pub head_view: Option<ViewDependentHead<B>>,
    /// The ReLU activation.
    pub activation: Relu,
    /// See [`FieldNetworkConfig::dim_direction`].
    pub dim_direction: usize,
    /// See [`FieldNetworkConfig::dim_position`].
    pub dim_position: usize,
    /// See [`FieldNetworkConfig::skips`].
    pub skips: Vec<usize>,
}

/// Output heads separating density from view-dependent color.
#[derive(Debug, Module)]
pub struct ViewDependentHead<B: Backend> {
    /// Density from the hidden features.
    pub density: Linear<B>,
    /// Projection of the hidden features before the branch.
    pub filter: Linear<B>,
    /// Branch taking the projected features and the encoded view direction.
    pub branch: Linear<B>,
    /// Color from the branch.
    pub color: Linear<B>,
}

impl FieldNetworkConfig {
    /// Initialize from the configuration.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<FieldNetwork<B>, Error> {
        self.validate()?;

        let width = self.width;
        let input = LinearConfig::new(self.dim_position, width).init(device);
        let hiddens = (0..self.depth - 1)
            .map(|index| {
                let dim_input = if self.skips.contains(&index) {
                    width + self.dim_position
                } else {
                    width
                };
                LinearConfig::new(dim_input, width).init(device)
            })
            .collect();

        let (head, head_view) = if self.is_view_dependent() {
            let head_view = ViewDependentHead {
                density: LinearConfig::new(width, 1).init(device),
                filter: LinearConfig::new(width, width).init(device),
                branch: LinearConfig::new(width + self.dim_direction, width / 2)
                    .init(device),
                color: LinearConfig::new(width / 2, 3).init(device),
            };
            (None, Some(head_view))
        } else {
            (Some(LinearConfig::new(width, 4).init(device)), None)
        };

        Ok(FieldNetwork {
            input,
            hiddens,
            head,
            head_view,
            activation: Relu::new(),
            dim_direction: self.dim_direction,
            dim_position: self.dim_position,
            skips: self.skips.to_owned(),
        })
    }

    /// Whether the network takes view directions.
    #[inline]
    pub fn is_view_dependent(&self) -> bool {
        self.dim_direction != 0
    }

    /// Checking the network shape.
    pub fn validate(&self) -> Result<(), Error> {
        if self.dim_position == 0 {
            return Err(Error::Validation(
                "dim_position".into(),
                "positive".into(),
            ));
        }
        if self.depth == 0 {
            return Err(Error::Validation("depth".into(), "positive".into()));
        }
        if self.width < 2 {
            return Err(Error::Validation(
                "width".into(),
                "at least 2".into(),
            ));
        }
        // The activation is concatenated after the previous hidden layer,
        // so neither the first nor the output can receive it.
        if let Some(skip) = self
            .skips
            .iter()
            .find(|&&skip| skip == 0 || skip + 1 >= self.depth)
        {
            return Err(Error::Validation(
                format!("skip index {skip}"),
                format!("in the range 1..{}", self.depth.saturating_sub(1)),
            ));
        }
        Ok(())
    }
}

impl<B: Backend> FieldNetwork<B> {
    /// Applies the forward pass on the encoded inputs.
    ///
    /// ## Shapes
    ///
    /// * `positions` - [`[..., dim_position]`](FieldNetworkConfig::dim_position)
    /// * `directions` - [`[..., dim_direction]`](FieldNetworkConfig::dim_direction)
    /// * `output` - `[..., 4]`
    ///
    /// ## Panics
    ///
    /// If the input dimensions do not match the configuration,
    /// or `directions` is not given exactly when the network is view-dependent.
    pub fn forward<const D: usize>(
        &self,
        positions: Tensor<B, D>,
        directions: Option<Tensor<B, D>>,
    ) -> Tensor<B, D> {
        let dim_last = D - 1;
        assert_eq!(
            positions.dims()[dim_last],
            self.dim_position,
            "The last dimension of positions should be {}, but got {:?}",
            self.dim_position,
            positions.dims(),
        );

        let mut output = self
            .activation
            .forward(self.input.forward(positions.to_owned()));
        for (index, hidden) in self.hiddens.iter().enumerate() {
            output = self.activation.forward(hidden.forward(output));
            if self.skips.contains(&(index + 1)) {
                output = Tensor::cat(vec![output, positions.to_owned()], dim_last);
            }
        }

        match (&self.head, &self.head_view, directions) {
            (Some(head), None, None) => head.forward(output),
            (None, Some(head), Some(directions)) => {
                assert_eq!(
                    directions.dims()[dim_last],
                    self.dim_direction,
                    "The last dimension of directions should be {}, but got {:?}",
                    self.dim_direction,
                    directions.dims(),
                );

                let densities = head.density.forward(output.to_owned());
                output = head.filter.forward(output);
                output = Tensor::cat(vec![output, directions], dim_last);
                output = self.activation.forward(head.branch.forward(output));
                let colors = head.color.forward(output);

                Tensor::cat(vec![colors, densities], dim_last)
            },
            (_, _, directions) => panic!(
                "directions should be given only to a view-dependent network \
                (dim_direction = {}), but got {:?}",
                self.dim_direction,
                directions.map(|directions| directions.dims()),
            ),
        }
    }

    /// Whether the network takes view directions.
    #[inline]
    pub fn is_view_dependent(&self) -> bool {
        self.head_view.is_some()
    }
}

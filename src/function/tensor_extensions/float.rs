use burn::tensor::{backend, Float, Tensor};

pub trait TensorFloatExtension {
    /// `y[i] = x[0] + x[1] + ... + x[i]`
    fn sum_cumulative(
        self,
        dim: usize,
    ) -> Self;

    /// `y[0] = 1, y[i] = x[0] * x[1] * ... * x[i - 1]`
    fn prod_cumulative_exclusive(
        self,
        dim: usize,
    ) -> Self;
}

impl<B: backend::Backend, const D: usize> TensorFloatExtension
    for Tensor<B, D, Float>
{
    fn sum_cumulative(
        self,
        dim: usize,
    ) -> Self {
        assert!(dim < D, "dim should be less than self.dims().len()");
        assert!(self.dims()[dim] > 0, "self.dims()[dim] should be positive");

        let dims_batch = {
            let mut dims = self.dims();
            dims[dim] = 1;
            dims
        };
        let mut state_batch = Tensor::zeros(dims_batch, &self.device());

        let result = self
            .iter_dim(dim)
            .map(|value_batch| {
                state_batch = state_batch.to_owned() + value_batch;
                state_batch.to_owned()
            })
            .collect::<Vec<_>>();

        Tensor::cat(result, dim)
    }

    fn prod_cumulative_exclusive(
        self,
        dim: usize,
    ) -> Self {
        assert!(dim < D, "dim should be less than self.dims().len()");
        assert!(self.dims()[dim] > 0, "self.dims()[dim] should be positive");

        let dims_batch = {
            let mut dims = self.dims();
            dims[dim] = 1;
            dims
        };
        let mut state_batch = Tensor::ones(dims_batch, &self.device());

        let result = self
            .iter_dim(dim)
            .map(|value_batch| {
                let output = state_batch.to_owned();
                state_batch = state_batch.to_owned() * value_batch;
                output
            })
            .collect::<Vec<_>>();

        Tensor::cat(result, dim)
    }
}

//! Chunking along the batch dimension.

use burn::tensor::{backend::Backend, Tensor};

/// Splitting `input` into consecutive chunks of at most `chunk_size` rows.
///
/// The chunks are in order, so concatenating them along dimension `0`
/// restores `input`.
pub fn split_rows<B: Backend, const D: usize>(
    input: Tensor<B, D>,
    chunk_size: usize,
) -> Vec<Tensor<B, D>> {
    assert!(chunk_size > 0, "chunk_size should be positive");

    let count = input.dims()[0];
    (0..count)
        .step_by(chunk_size)
        .map(|index| {
            input
                .to_owned()
                .slice([index..(index + chunk_size).min(count)])
        })
        .collect()
}

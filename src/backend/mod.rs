//! Backend presets.

pub use burn::{
    backend::wgpu::{WgpuDevice, WgpuRuntime},
    tensor::backend::{AutodiffBackend, Backend},
};

use burn::backend::autodiff;

/// Backend with gradient tracking, used for training.
pub type Autodiff<B> = autodiff::Autodiff<B>;

/// GPU backend.
pub type Wgpu = burn_jit::JitBackend<WgpuRuntime, f32, i32>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation Error: {0} should be {1}")]
    Validation(String, String),

    #[error("Shape Error: {0} should be [N, 3], but got {1:?}")]
    Shape(String, Vec<usize>),
}

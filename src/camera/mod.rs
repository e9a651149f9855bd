//! Pinhole camera and ray casting.

pub use crate::error::Error;
pub use burn::tensor::{backend::Backend, Int, Tensor, TensorData};

/// A pinhole camera in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Affine transformation from camera space to world space.
    ///
    /// It is in **row-major order**, i.e., `M[row][col]`.
    ///
    /// # Format
    ///
    /// ```plaintext
    /// [R_c   | T_c]
    /// [...   | ...]
    /// [0 0 0 | 1  ]
    /// ```
    pub camera_to_world: [[f64; 4]; 4],
    /// Focal length in pixels.
    pub focal_length: f64,
    /// Image height.
    pub image_height: u32,
    /// Image width.
    pub image_width: u32,
}

/// Per-pixel rays in world space.
#[derive(Clone, Debug)]
pub struct Rays<B: Backend> {
    /// `[H, W, 3]`
    pub directions: Tensor<B, 3>,
    /// `[H, W, 3]`
    pub origins: Tensor<B, 3>,
}

impl Camera {
    /// Making a camera from a `3 x 4` camera-to-world matrix.
    pub const fn from_3x4(
        camera_to_world: [[f64; 4]; 3],
        focal_length: f64,
        image_height: u32,
        image_width: u32,
    ) -> Self {
        let m = camera_to_world;
        Self {
            camera_to_world: [m[0], m[1], m[2], [0.0, 0.0, 0.0, 1.0]],
            focal_length,
            image_height,
            image_width,
        }
    }

    /// The `3 x 3` rotation block.
    #[inline]
    pub const fn rotation(&self) -> [[f64; 3]; 3] {
        let m = &self.camera_to_world;
        [
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ]
    }

    /// Position of the camera in world space.
    #[inline]
    pub const fn translation(&self) -> [f64; 3] {
        let m = &self.camera_to_world;
        [m[0][3], m[1][3], m[2][3]]
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.focal_length.is_finite() && self.focal_length > 0.0) {
            return Err(Error::Validation(
                format!("focal_length ({})", self.focal_length),
                "finite and positive".into(),
            ));
        }
        if self.image_height == 0 || self.image_width == 0 {
            return Err(Error::Validation(
                format!(
                    "image size ({} x {})",
                    self.image_width, self.image_height
                ),
                "positive".into(),
            ));
        }
        Ok(())
    }
}

/// Dimension operations
impl Camera {
    /// Returns the aspect ratio (`width / height`).
    #[inline]
    pub const fn aspect_ratio(&self) -> f32 {
        self.image_width as f32 / self.image_height as f32
    }

    /// Resizing the image to the maximum side length of `to`.
    ///
    /// The focal length is scaled by the same factor.
    pub fn resize_max(
        &mut self,
        to: u32,
    ) -> &mut Self {
        let side_max = self.image_width.max(self.image_height);
        let ratio = self.aspect_ratio();
        if ratio > 1.0 {
            self.image_width = to;
            self.image_height = (to as f32 / ratio).ceil() as u32;
        } else {
            self.image_width = (to as f32 * ratio).ceil() as u32;
            self.image_height = to;
        }
        self.focal_length *= to as f64 / side_max as f64;
        self
    }
}

/// Ray casting
impl Camera {
    /// Casting one ray through every pixel.
    ///
    /// The camera looks down `-Z` with `+Y` up.
    /// The direction of pixel `(u, v)` in camera space is
    /// `((u - W / 2) / f, -(v - H / 2) / f, -1)`.
    /// The directions are not normalized.
    pub fn rays<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<Rays<B>, Error> {
        self.validate()?;

        let focal_length = self.focal_length as f32;
        let image_height = self.image_height as usize;
        let image_width = self.image_width as usize;
        let shape = [image_height, image_width];

        // [H, W]
        let pixels_x = Tensor::<B, 1, Int>::arange(0..image_width as i64, device)
            .float()
            .unsqueeze_dim::<2>(0)
            .expand(shape);
        let pixels_y = Tensor::<B, 1, Int>::arange(0..image_height as i64, device)
            .float()
            .unsqueeze_dim::<2>(1)
            .expand(shape);

        // [H, W, 3]
        let directions_camera = Tensor::stack::<3>(
            vec![
                pixels_x
                    .sub_scalar(image_width as f32 * 0.5)
                    .div_scalar(focal_length),
                pixels_y
                    .sub_scalar(image_height as f32 * 0.5)
                    .div_scalar(focal_length)
                    .neg(),
                Tensor::full(shape, -1.0, device),
            ],
            2,
        );

        // [3, 3]
        let rotation = Tensor::<B, 2>::from_data(
            TensorData::new(
                self.rotation()
                    .concat()
                    .into_iter()
                    .map(|c| c as f32)
                    .collect::<Vec<_>>(),
                [3, 3],
            ),
            device,
        );

        // [H * W, 3] <- [H * W, 3] * [3, 3]^T
        let directions = directions_camera
            .reshape([image_height * image_width, 3])
            .matmul(rotation.transpose())
            .reshape([image_height, image_width, 3]);

        let origins = Tensor::<B, 1>::from_floats(
            self.translation().map(|c| c as f32),
            device,
        )
        .reshape([1, 1, 3])
        .expand([image_height, image_width, 3]);

        Ok(Rays {
            directions,
            origins,
        })
    }
}

impl<B: Backend> Rays<B> {
    /// Flattening the rays into `([H * W, 3], [H * W, 3])` as `(origins, directions)`.
    pub fn flatten(self) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (self.origins.flatten(0, 1), self.directions.flatten(0, 1))
    }
}

impl Default for Camera {
    #[inline]
    fn default() -> Self {
        Self {
            camera_to_world: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            focal_length: 1.0,
            image_height: 1,
            image_width: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    fn assert_close(
        output: &[f32],
        target: &[f32],
    ) {
        assert_eq!(output.len(), target.len());
        output.iter().zip(target).for_each(|(o, t)| {
            assert!((o - t).abs() < 1e-6, "{output:?} should be {target:?}");
        });
    }

    #[test]
    fn rays_center_pixel() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let camera = Camera {
            focal_length: 3.5,
            image_height: 4,
            image_width: 4,
            ..Default::default()
        };
        let rays = camera.rays::<B>(device).unwrap();
        assert_eq!(rays.directions.dims(), [4, 4, 3]);
        assert_eq!(rays.origins.dims(), [4, 4, 3]);

        let direction = rays
            .directions
            .to_owned()
            .slice([2..3, 2..3])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_close(&direction, &[0.0, 0.0, -1.0]);

        let corner = rays
            .directions
            .slice([0..1, 0..1])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_close(&corner, &[-2.0 / 3.5, 2.0 / 3.5, -1.0]);

        let origins = rays.origins.into_data().to_vec::<f32>().unwrap();
        assert!(origins.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn rays_transformed() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        // Rotating 90 degrees about +Y, then translating.
        let camera = Camera::from_3x4(
            [
                [0.0, 0.0, 1.0, 0.5],
                [0.0, 1.0, 0.0, -1.0],
                [-1.0, 0.0, 0.0, 4.0],
            ],
            2.0,
            2,
            2,
        );
        assert_eq!(camera.translation(), [0.5, -1.0, 4.0]);

        let (origins, directions) = camera.rays::<B>(device).unwrap().flatten();
        assert_eq!(origins.dims(), [4, 3]);
        assert_eq!(directions.dims(), [4, 3]);

        // The center pixel looks down the rotated forward axis.
        let direction = directions
            .to_owned()
            .slice([3..4])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_close(&direction, &[-1.0, 0.0, -0.0]);

        // Pixel (0, 0) in camera space is (-0.5, 0.5, -1).
        let direction = directions
            .slice([0..1])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_close(&direction, &[-1.0, 0.5, 0.5]);

        let origins = origins.into_data().to_vec::<f32>().unwrap();
        assert_close(&origins, &[0.5, -1.0, 4.0].repeat(4));
    }

    #[test]
    fn rays_invalid() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        let camera = Camera {
            focal_length: 0.0,
            image_height: 4,
            image_width: 4,
            ..Default::default()
        };
        assert!(matches!(
            camera.rays::<B>(device),
            Err(Error::Validation(..))
        ));

        let camera = Camera {
            image_height: 0,
            ..Default::default()
        };
        assert!(camera.validate().is_err());
    }

    #[test]
    fn resize_max() {
        use super::*;

        let mut camera = Camera {
            focal_length: 1000.0,
            image_width: 1920,
            image_height: 1080,
            ..Default::default()
        };
        camera.resize_max(1080);
        assert_eq!(camera.image_width, 1080);
        assert_eq!(camera.image_height, 608);
        assert_eq!(camera.focal_length, 562.5);

        let mut camera = Camera {
            focal_length: 100.0,
            image_width: 50,
            image_height: 100,
            ..Default::default()
        };
        camera.resize_max(200);
        assert_eq!(camera.image_width, 100);
        assert_eq!(camera.image_height, 200);
        assert_eq!(camera.focal_length, 200.0);
    }

    #[test]
    fn rays_after_resize_max() {
        use super::*;
        use burn::backend::NdArray;

        type B = NdArray<f32>;
        let device = &Default::default();

        // The field of view is kept, so the corner ray does not move.
        let mut camera = Camera {
            focal_length: 500.0,
            image_height: 400,
            image_width: 400,
            ..Default::default()
        };
        camera.resize_max(4);
        assert_eq!(camera.focal_length, 5.0);

        let corner = camera
            .rays::<B>(device)
            .unwrap()
            .directions
            .slice([0..1, 0..1])
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_close(&corner, &[-200.0 / 500.0, 200.0 / 500.0, -1.0]);
    }
}

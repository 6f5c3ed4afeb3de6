use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use super::backend::RuntimeError;

/// Spatial size used when the model does not declare a static one.
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// ImageNet channel statistics.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// How a decoded image is turned into the model's input tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessing {
    pub width: u32,
    pub height: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            width: DEFAULT_INPUT_SIZE,
            height: DEFAULT_INPUT_SIZE,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl Preprocessing {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_normalization(mut self, mean: [f32; 3], std: [f32; 3]) -> Self {
        self.mean = mean;
        self.std = std;
        self
    }

    /// Converts `image` into a `[1, 3, height, width]` tensor.
    ///
    /// The image is resized to the exact target size, converted to RGB,
    /// scaled to [0, 1] and normalised per channel.
    pub fn to_tensor(&self, image: &DynamicImage) -> Result<Array4<f32>, RuntimeError> {
        if self.width == 0 || self.height == 0 {
            return Err(RuntimeError::Input(format!(
                "invalid input size {}x{}",
                self.width, self.height
            )));
        }
        if self.std.iter().any(|&s| s == 0.0) {
            return Err(RuntimeError::Input("normalization std cannot be zero".into()));
        }

        let rgb = image
            .resize_exact(self.width, self.height, FilterType::Triangle)
            .to_rgb8();

        let (width, height) = (self.width as usize, self.height as usize);
        let mut tensor = Array4::<f32>::zeros((1, 3, height, width));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..3 {
                let value = pixel[channel] as f32 / 255.0;
                tensor[[0, channel, y as usize, x as usize]] =
                    (value - self.mean[channel]) / self.std[channel];
            }
        }
        Ok(tensor)
    }
}

use image::imageops::{self, FilterType};
use image::RgbaImage;
use ndarray::Array4;

/// MoveNet用の入力サイズ
pub const MOVENET_INPUT_SIZE: u32 = 192;

/// RGBA フレームを MoveNet 用の入力テンソルに変換
///
/// - 192x192 にリサイズ
/// - アルファを捨てて [1, 192, 192, 3] の f32 テンソル (0.0-255.0)
pub fn preprocess_for_movenet(frame: &RgbaImage) -> Array4<f32> {
    let resized = imageops::resize(frame, MOVENET_INPUT_SIZE, MOVENET_INPUT_SIZE, FilterType::Triangle);
    let side = MOVENET_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = pixel[0] as f32;
        tensor[[0, y, x, 1]] = pixel[1] as f32;
        tensor[[0, y, x, 2]] = pixel[2] as f32;
    }

    tensor
}

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::{ImageFormat, ImageResult, Rgba, RgbaImage};
use std::io::Cursor;

use super::clip::{ellipse_polygon, point_in_polygon};
use crate::config::Config;
use crate::geometry::{BodyDescriptors, BodyPartDescriptor};
use crate::transform::{Affine, Orientation, ResolvedTransform};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 肩の平滑化値から決まるグラフィックの配置
///
/// ボックス座標系（左上原点、幅 `width`・高さ `height`）からキャンバス座標への
/// 変換と、ボックス座標系での顔の切り抜き多角形を持つ。
#[derive(Debug, Clone)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub to_canvas: Affine,
    pub hole: Vec<(f32, f32)>,
}

impl Placement {
    /// span が 0 以下・非有限なら配置できない
    pub fn compute(
        shoulders: &BodyPartDescriptor,
        transform: &ResolvedTransform,
        clip_points: usize,
    ) -> Option<Self> {
        let span = shoulders.span;
        if !shoulders.is_finite() || span <= 0.0 {
            return None;
        }

        let vertical = transform.orientation == Orientation::Vertical;
        let a = transform.base.0[0];

        let x = shoulders.right_x - span * 1.5 + span * shoulders.angle;
        let y_factor = if vertical || a > 1.0 { 1.0 } else { 1.5 };
        let y = shoulders.right_y - span * y_factor;
        let width = span * 4.0;
        let height = span * if vertical { 2.0 } else { 4.0 };

        // 基準変換の線形部分をボックス中心まわりに適用
        let to_canvas = Affine::translation(x + width / 2.0, y + height / 2.0)
            .compose(&transform.overlay())
            .compose(&Affine::translation(-width / 2.0, -height / 2.0));

        let hole_ry = span * if vertical { 0.25 } else { 0.5 };
        let hole = ellipse_polygon(span * 2.0, span, span * 0.4, hole_ry, clip_points);

        Some(Self {
            x,
            y,
            width,
            height,
            to_canvas,
            hole,
        })
    }

    /// ボックス座標の点にグラフィックを描くか（ボックス内かつ切り抜き外）
    pub fn covers(&self, lx: f32, ly: f32) -> bool {
        lx >= 0.0
            && ly >= 0.0
            && lx < self.width
            && ly < self.height
            && !point_in_polygon(&self.hole, lx, ly)
    }

    /// キャンバス上の外接矩形 (x0, y0, x1, y1)
    fn canvas_bounds(&self) -> (f32, f32, f32, f32) {
        let corners = [
            self.to_canvas.apply(0.0, 0.0),
            self.to_canvas.apply(self.width, 0.0),
            self.to_canvas.apply(0.0, self.height),
            self.to_canvas.apply(self.width, self.height),
        ];
        corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), &(cx, cy)| (x0.min(cx), y0.min(cy), x1.max(cx), y1.max(cy)),
        )
    }
}

/// 背景フレームとグラフィックを合成して静止画を作る
#[derive(Debug, Clone)]
pub struct Compositor {
    feed_size: u32,
    clip_points: usize,
}

impl Compositor {
    pub fn new(feed_size: u32, clip_points: usize) -> Self {
        Self {
            feed_size: feed_size.max(1),
            clip_points,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.feed.feed_size, config.overlay.clip_points)
    }

    pub fn feed_size(&self) -> u32 {
        self.feed_size
    }

    /// 変換や平滑化値がなければ背景のみ
    pub fn compose(
        &self,
        frame: &RgbaImage,
        smoothed: Option<&BodyDescriptors>,
        transform: Option<&ResolvedTransform>,
        graphic: &RgbaImage,
    ) -> RgbaImage {
        let mut canvas = self.draw_background(frame);
        if let (Some(body), Some(transform)) = (smoothed, transform) {
            if let Some(placement) = Placement::compute(body.shoulders(), transform, self.clip_points) {
                draw_graphic(&mut canvas, graphic, &placement);
            }
        }
        canvas
    }

    /// 左右反転・高さ合わせで拡大し、水平中央に置いた背景
    pub fn draw_background(&self, frame: &RgbaImage) -> RgbaImage {
        let size = self.feed_size;
        let mut canvas = RgbaImage::from_pixel(size, size, BACKGROUND);
        let (fw, fh) = frame.dimensions();
        if fw == 0 || fh == 0 {
            return canvas;
        }

        let scale = size as f32 / fh as f32;
        let offset = (size as f32 - scale * fw as f32) / 2.0;

        for (cx, cy, pixel) in canvas.enumerate_pixels_mut() {
            let u = fw as f32 - (cx as f32 + 0.5 - offset) / scale;
            let v = (cy as f32 + 0.5) / scale;
            if u < 0.0 || v < 0.0 {
                continue;
            }
            let (ui, vi) = (u as u32, v as u32);
            if ui < fw && vi < fh {
                let mut src = *frame.get_pixel(ui, vi);
                src[3] = 255;
                *pixel = src;
            }
        }
        canvas
    }
}

fn draw_graphic(canvas: &mut RgbaImage, graphic: &RgbaImage, placement: &Placement) {
    let (gw, gh) = graphic.dimensions();
    if gw == 0 || gh == 0 {
        return;
    }
    let to_local = match placement.to_canvas.inverse() {
        Some(inv) => inv,
        None => return,
    };

    let (cw, ch) = canvas.dimensions();
    let (bx0, by0, bx1, by1) = placement.canvas_bounds();
    let x_start = bx0.floor().max(0.0) as u32;
    let y_start = by0.floor().max(0.0) as u32;
    let x_end = (bx1.ceil().max(0.0) as u32).min(cw);
    let y_end = (by1.ceil().max(0.0) as u32).min(ch);

    let sx = gw as f32 / placement.width;
    let sy = gh as f32 / placement.height;

    for cy in y_start..y_end {
        for cx in x_start..x_end {
            let (lx, ly) = to_local.apply(cx as f32 + 0.5, cy as f32 + 0.5);
            if !placement.covers(lx, ly) {
                continue;
            }
            let gx = ((lx * sx) as u32).min(gw - 1);
            let gy = ((ly * sy) as u32).min(gh - 1);
            let src = graphic.get_pixel(gx, gy);
            blend_over(canvas.get_pixel_mut(cx, cy), src);
        }
    }
}

/// src-over 合成（背景は不透明）
fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let alpha = src[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    for i in 0..3 {
        let blended = src[i] as f32 * alpha + dst[i] as f32 * (1.0 - alpha);
        dst[i] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = 255;
}

/// PNG にエンコードして `data:image/png;base64,...` を返す
pub fn encode_data_url(image: &RgbaImage) -> ImageResult<String> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&bytes)))
}

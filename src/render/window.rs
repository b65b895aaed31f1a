use anyhow::Result;
use image::RgbaImage;
use minifb::{Key, Window, WindowOptions};

use crate::capture::{CaptureSession, FallingItem, Phase};

const ITEM_COLOR: u32 = 0x00FFC04D;
const COUNT_COLOR: u32 = 0x00FFFFFF;

/// minifbを使用したプレビューウィンドウ
pub struct PreviewWindow {
    window: Window,
    buffer: Vec<u32>,
    size: usize,
}

impl PreviewWindow {
    /// 正方形のウィンドウを作成（一辺はフィードサイズ）
    pub fn new(title: &str, size: usize) -> Result<Self> {
        let window = Window::new(
            title,
            size,
            size,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: vec![0u32; size * size],
            size,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.window.is_key_down(key)
    }

    /// セッションの状態に応じて描画
    pub fn draw_session(&mut self, session: &CaptureSession) {
        self.buffer.fill(0);
        match session.phase() {
            Phase::Positioning => {
                for item in session.falling_items().items() {
                    self.draw_item(item, session.falling_items().item_size(), &session.graphic().image);
                }
            }
            _ => {
                if let Some(image) = session.preview() {
                    self.draw_image(&image);
                }
                if let Some(count) = session.machine().display_count() {
                    self.draw_count(count);
                }
            }
        }
    }

    /// RGBA画像をバッファにコピー（はみ出しはクロップ）
    pub fn draw_image(&mut self, image: &RgbaImage) {
        let w = self.size.min(image.width() as usize);
        let h = self.size.min(image.height() as usize);
        for y in 0..h {
            for x in 0..w {
                let p = image.get_pixel(x as u32, y as u32);
                self.buffer[y * self.size + x] = ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32;
            }
        }
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.size, self.size)?;
        Ok(())
    }

    /// 回転したグラフィックを描く。グラフィックが空なら塗りつぶしの四角
    fn draw_item(&mut self, item: &FallingItem, size: f32, graphic: &RgbaImage) {
        let half = size / 2.0;
        let (sin, cos) = item.rotation.sin_cos();
        let cx = item.x + half;
        let cy = item.y + half;
        let reach = (half * std::f32::consts::SQRT_2).ceil() as i32;
        let (gw, gh) = graphic.dimensions();

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                // キャンバス → アイテム座標（逆回転）
                let lx = cos * dx as f32 + sin * dy as f32 + half;
                let ly = -sin * dx as f32 + cos * dy as f32 + half;
                if lx < 0.0 || ly < 0.0 || lx >= size || ly >= size {
                    continue;
                }
                let color = if gw == 0 || gh == 0 {
                    ITEM_COLOR
                } else {
                    let gx = ((lx / size * gw as f32) as u32).min(gw - 1);
                    let gy = ((ly / size * gh as f32) as u32).min(gh - 1);
                    let p = graphic.get_pixel(gx, gy);
                    if p[3] < 128 {
                        continue;
                    }
                    ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
                };
                self.set_pixel(cx as i32 + dx, cy as i32 + dy, color);
            }
        }
    }

    /// カウントダウン数字の代わりに残りtick数ぶんの丸を上部に並べる
    fn draw_count(&mut self, count: u32) {
        let radius = (self.size / 40).max(3) as i32;
        let spacing = radius * 3;
        for i in 0..count as i32 {
            self.draw_circle(spacing * (i + 1), spacing, radius, COUNT_COLOR);
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.size as i32 && y >= 0 && y < self.size as i32 {
            self.buffer[y as usize * self.size + x as usize] = color;
        }
    }
}

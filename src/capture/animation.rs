use rand::Rng;
use std::f32::consts::TAU;

use crate::config::AnimationConfig;

/// 位置合わせ中に画面を落ちていくアイテム（フィード座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingItem {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone)]
pub struct FallingItems {
    items: Vec<FallingItem>,
    /// アイテムの一辺（ピクセル）
    size: f32,
    feed_size: f32,
    fall_speed: f32,
    spin_speed: f32,
}

impl FallingItems {
    pub fn new<R: Rng + ?Sized>(config: &AnimationConfig, feed_size: u32, rng: &mut R) -> Self {
        let feed = feed_size as f32;
        let size = config.item_size * feed;
        let count = config.falling_items;

        let items = (1..=count)
            .map(|i| {
                let upper = feed + size;
                let y = if upper > -size { rng.gen_range(-size..upper) } else { -size };
                FallingItem {
                    x: feed * i as f32 / (count + 1) as f32,
                    y,
                    rotation: rng.gen_range(0.0..TAU),
                }
            })
            .collect();

        Self {
            items,
            size,
            feed_size: feed,
            fall_speed: config.fall_speed,
            spin_speed: config.spin_speed,
        }
    }

    /// 1描画tick進める。画面下に抜けたアイテムは上から再登場する
    pub fn advance(&mut self) {
        let period = self.feed_size + self.size * 2.0;
        for item in &mut self.items {
            item.y = if period > 0.0 {
                (self.size + item.y + self.fall_speed).rem_euclid(period) - self.size
            } else {
                item.y
            };
            item.rotation = (item.rotation + self.spin_speed).rem_euclid(TAU);
        }
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn item_size(&self) -> f32 {
        self.size
    }
}

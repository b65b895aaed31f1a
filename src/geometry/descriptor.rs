use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// キーポイント1点の座標
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// キャプチャ座標 → フィード座標の線形スケール（フィードサイズ ÷ キャプチャサイズ）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedScale {
    pub factor: f32,
}

impl FeedScale {
    pub fn new(feed_size: u32, capture_size: u32) -> Self {
        Self {
            factor: feed_size as f32 / capture_size.max(1) as f32,
        }
    }

    pub fn apply(&self, point: LandmarkPoint) -> LandmarkPoint {
        LandmarkPoint::new(point.x * self.factor, point.y * self.factor)
    }
}

/// 左右ランドマーク対から求めた部位の幾何量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyPartDescriptor {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    /// left_x - right_x
    pub width: f32,
    /// right_y - left_y
    pub height: f32,
    /// 2点間のユークリッド距離
    pub span: f32,
    /// 傾き (-π, π]
    pub angle: f32,
}

impl BodyPartDescriptor {
    pub const FIELD_COUNT: usize = 8;

    pub fn fields(&self) -> [f32; Self::FIELD_COUNT] {
        [
            self.left_x,
            self.left_y,
            self.right_x,
            self.right_y,
            self.width,
            self.height,
            self.span,
            self.angle,
        ]
    }

    pub fn from_fields(f: [f32; Self::FIELD_COUNT]) -> Self {
        Self {
            left_x: f[0],
            left_y: f[1],
            right_x: f[2],
            right_y: f[3],
            width: f[4],
            height: f[5],
            span: f[6],
            angle: f[7],
        }
    }

    /// フィールドごとに二項演算を適用
    pub fn zip_with(&self, other: &Self, op: impl Fn(f32, f32) -> f32) -> Self {
        let a = self.fields();
        let b = other.fields();
        Self::from_fields(std::array::from_fn(|i| op(a[i], b[i])))
    }

    /// 平滑化に使えるか（NaN / 無限大を含まない）
    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|v| v.is_finite())
    }
}

/// 角度を (-π, π] に正規化
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// 左右ランドマークから部位記述子を導出する（純関数）
///
/// 補正の符号は height > 0 なら -π/2、それ以外（height == 0 を含む）は +π/2。
/// atan(±∞) = ±π/2 なのでゼロ除算の特別扱いは不要。
/// 入力が非有限、または2点が一致する場合は NaN を含む記述子を返す。
pub fn derive(left: LandmarkPoint, right: LandmarkPoint) -> BodyPartDescriptor {
    let width = left.x - right.x;
    let height = right.y - left.y;
    let span = (width * width + height * height).sqrt();

    let sign = if height > 0.0 { -1.0 } else { 1.0 };
    let angle = wrap_angle((width / height).atan() + sign * FRAC_PI_2);

    BodyPartDescriptor {
        left_x: left.x,
        left_y: left.y,
        right_x: right.x,
        right_y: right.y,
        width,
        height,
        span,
        angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_level_shoulders() {
        // 鏡像座標系: 左肩が画面右側。height == 0 は +π/2 側
        let d = derive(LandmarkPoint::new(500.0, 300.0), LandmarkPoint::new(300.0, 300.0));
        assert_eq!(d.width, 200.0);
        assert_eq!(d.height, 0.0);
        assert!(approx_eq_f32(d.span, 200.0, 1e-4));
        assert!(approx_eq_f32(d.angle, PI, 1e-6));
    }

    #[test]
    fn test_nearly_level_shoulders_near_zero() {
        // height の符号によらず 0 付近。厳密に 0 のときだけ π になる
        let above = derive(LandmarkPoint::new(500.0, 300.0), LandmarkPoint::new(300.0, 300.5));
        assert!(approx_eq_f32(above.angle, 0.0, 1e-2));
        let below = derive(LandmarkPoint::new(500.0, 300.5), LandmarkPoint::new(300.0, 300.0));
        assert!(approx_eq_f32(below.angle, 0.0, 1e-2));
    }

    #[test]
    fn test_tilted_shoulders() {
        let d = derive(LandmarkPoint::new(400.0, 300.0), LandmarkPoint::new(300.0, 400.0));
        assert_eq!(d.width, 100.0);
        assert_eq!(d.height, 100.0);
        assert!(approx_eq_f32(d.span, 100.0 * std::f32::consts::SQRT_2, 1e-3));
        // atan(1) - π/2
        assert!(approx_eq_f32(d.angle, -std::f32::consts::FRAC_PI_4, 1e-6));
    }

    #[test]
    fn test_negative_height_branch() {
        let d = derive(LandmarkPoint::new(400.0, 400.0), LandmarkPoint::new(300.0, 300.0));
        assert_eq!(d.height, -100.0);
        assert!(approx_eq_f32(d.angle, std::f32::consts::FRAC_PI_4, 1e-6));
    }

    #[test]
    fn test_zero_height_negative_width_stays_in_range() {
        let d = derive(LandmarkPoint::new(300.0, 300.0), LandmarkPoint::new(500.0, 300.0));
        assert!(d.angle.is_finite());
        // atan(-∞) + π/2
        assert!(approx_eq_f32(d.angle, 0.0, 1e-6));
        assert!(d.angle > -PI && d.angle <= PI);
    }

    #[test]
    fn test_coincident_points_propagate_nan() {
        let p = LandmarkPoint::new(100.0, 100.0);
        let d = derive(p, p);
        assert_eq!(d.span, 0.0);
        assert!(d.angle.is_nan());
        assert!(!d.is_finite());
    }

    #[test]
    fn test_non_finite_input_propagates_nan() {
        let d = derive(LandmarkPoint::new(f32::NAN, 1.0), LandmarkPoint::new(2.0, 3.0));
        assert!(d.width.is_nan());
        assert!(d.span.is_nan());
        assert!(!d.is_finite());
    }

    #[test]
    fn test_derive_is_pure() {
        let l = LandmarkPoint::new(412.5, 288.1);
        let r = LandmarkPoint::new(250.25, 301.7);
        assert_eq!(derive(l, r), derive(l, r));
    }

    #[test]
    fn test_wrap_angle() {
        assert!(approx_eq_f32(wrap_angle(-PI), PI, 1e-6));
        assert!(approx_eq_f32(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, 1e-5));
        assert!(approx_eq_f32(wrap_angle(0.5), 0.5, 1e-6));
        assert!(wrap_angle(f32::NAN).is_nan());
    }

    #[test]
    fn test_feed_scale() {
        let scale = FeedScale::new(768, 200);
        let p = scale.apply(LandmarkPoint::new(100.0, 50.0));
        assert!(approx_eq_f32(p.x, 384.0, 1e-3));
        assert!(approx_eq_f32(p.y, 192.0, 1e-3));
    }

    #[test]
    fn test_fields_roundtrip_order() {
        let d = derive(LandmarkPoint::new(4.0, 1.0), LandmarkPoint::new(1.0, 5.0));
        let f = d.fields();
        assert_eq!(f[0], 4.0);
        assert_eq!(f[3], 5.0);
        assert_eq!(BodyPartDescriptor::from_fields(f), d);
    }
}

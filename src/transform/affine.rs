use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// グラフィックの向き。変換の水平スケール `a` が 0 なら縦向き扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// 2Dアフィン変換 `[a, b, c, d, e, f]`
///
/// Canvas / CSS の `matrix()` と同じ並び:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Affine(pub [f32; 6]);

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self([a, b, c, d, e, f])
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    /// 平行移動成分 (e, f) を 0 にしたもの
    pub fn without_translation(self) -> Self {
        let [a, b, c, d, _, _] = self.0;
        Self([a, b, c, d, 0.0, 0.0])
    }

    pub fn orientation(&self) -> Orientation {
        if self.0[0] == 0.0 {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    /// 一様スケール。`a` が 0 なら `b` を使う
    pub fn uniform_scale(&self) -> f32 {
        let [a, b, ..] = self.0;
        if a != 0.0 {
            a.abs()
        } else {
            b.abs()
        }
    }

    pub fn to_matrix(&self) -> Matrix3<f32> {
        let [a, b, c, d, e, f] = self.0;
        Matrix3::new(
            a, c, e,
            b, d, f,
            0.0, 0.0, 1.0,
        )
    }

    pub fn from_matrix(m: &Matrix3<f32>) -> Self {
        Self([m[(0, 0)], m[(1, 0)], m[(0, 1)], m[(1, 1)], m[(0, 2)], m[(1, 2)]])
    }

    /// `self ∘ inner`（inner を先に適用）
    pub fn compose(&self, inner: &Affine) -> Self {
        Self::from_matrix(&(self.to_matrix() * inner.to_matrix()))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.to_matrix().try_inverse().map(|m| Self::from_matrix(&m))
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_f32(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_without_translation() {
        let t = Affine::new(0.0, 1.4, -1.4, 0.0, -35.0, 90.0).without_translation();
        assert_eq!(t.0, [0.0, 1.4, -1.4, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_orientation_from_horizontal_scale() {
        assert_eq!(Affine::new(0.0, 1.2, -1.2, 0.0, 0.0, 0.0).orientation(), Orientation::Vertical);
        assert_eq!(Affine::new(0.7, 0.0, 0.0, 0.7, 0.0, 0.0).orientation(), Orientation::Horizontal);
    }

    #[test]
    fn test_uniform_scale() {
        assert_eq!(Affine::new(0.0, 1.4, -1.4, 0.0, 0.0, 0.0).uniform_scale(), 1.4);
        assert_eq!(Affine::new(1.05, 0.0, 0.0, 1.05, 0.0, 0.0).uniform_scale(), 1.05);
    }

    #[test]
    fn test_quarter_turn() {
        // [0, 1, -1, 0] は +90° 回転
        let r = Affine::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let (x, y) = r.apply(1.0, 0.0);
        assert!(approx_eq_f32(x, 0.0, 1e-6));
        assert!(approx_eq_f32(y, 1.0, 1e-6));
    }

    #[test]
    fn test_compose_order() {
        let t = Affine::translation(10.0, 0.0);
        let s = Affine::scaling(2.0, 2.0);
        // scale first, then translate
        let (x, y) = t.compose(&s).apply(1.0, 1.0);
        assert!(approx_eq_f32(x, 12.0, 1e-6));
        assert!(approx_eq_f32(y, 2.0, 1e-6));
    }

    #[test]
    fn test_inverse_roundtrip_point() {
        let m = Affine::new(0.0, 1.4, -1.4, 0.0, 30.0, -12.0);
        let inv = m.inverse().unwrap();
        let (x, y) = m.apply(3.0, 4.0);
        let (bx, by) = inv.apply(x, y);
        assert!(approx_eq_f32(bx, 3.0, 1e-4));
        assert!(approx_eq_f32(by, 4.0, 1e-4));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Affine::scaling(0.0, 1.0).inverse().is_none());
    }
}

/// 楕円を n 角形で近似した頂点列（始点と終点は同じ点）
///
/// 角度 0 が楕円の下端、x は sin・y は cos で回る。
pub fn ellipse_polygon(cx: f32, cy: f32, rx: f32, ry: f32, points: usize) -> Vec<(f32, f32)> {
    let n = points.max(3);
    (0..=n)
        .map(|i| {
            let t = i as f32 / n as f32 * std::f32::consts::TAU;
            (cx + rx * t.sin(), cy + ry * t.cos())
        })
        .collect()
}

/// 偶奇規則による点の内外判定
pub fn point_in_polygon(polygon: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipse_point_count_and_closure() {
        let poly = ellipse_polygon(0.0, 0.0, 2.0, 1.0, 40);
        assert_eq!(poly.len(), 41);
        let first = poly[0];
        let last = poly[40];
        assert!((first.0 - last.0).abs() < 1e-4);
        assert!((first.1 - last.1).abs() < 1e-4);
        // 始点は下端
        assert!((first.1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_ellipse() {
        let poly = ellipse_polygon(10.0, 10.0, 4.0, 2.0, 40);
        assert!(point_in_polygon(&poly, 10.0, 10.0));
        assert!(point_in_polygon(&poly, 13.0, 10.0));
        assert!(!point_in_polygon(&poly, 15.0, 10.0));
        assert!(!point_in_polygon(&poly, 10.0, 12.5));
    }

    #[test]
    fn test_degenerate_polygon() {
        assert!(!point_in_polygon(&[(0.0, 0.0), (1.0, 1.0)], 0.5, 0.5));
    }
}

use serde::{Deserialize, Serialize};

use super::affine::{Affine, Orientation};
use crate::config::Config;

/// グループ名・マッチ用トークン・基準変換の1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformGroup {
    pub group: String,
    pub tokens: Vec<String>,
    pub matrix: Affine,
}

impl TransformGroup {
    pub fn new(group: &str, tokens: &[&str], matrix: [f32; 6]) -> Self {
        Self {
            group: group.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            matrix: Affine(matrix),
        }
    }

    /// グラフィックIDがいずれかのトークンを含むか
    pub fn matches(&self, graphic_id: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| !token.is_empty() && graphic_id.contains(token.as_str()))
    }
}

/// 解決済みの変換。向きは変換と同時に一度だけ決める
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransform {
    pub group: String,
    /// テーブル上の基準変換（平行移動込み）
    pub base: Affine,
    pub orientation: Orientation,
}

impl ResolvedTransform {
    /// オーバーレイ描画用の変換。平行移動は肩位置から毎フレーム計算するので捨てる
    pub fn overlay(&self) -> Affine {
        self.base.without_translation()
    }
}

/// グラフィックID → 基準変換の解決器
///
/// 部分文字列一致を表の順に評価し、最初に一致したグループを返す。
/// 複数グループに一致するIDは先に並んだグループになる。
#[derive(Debug, Clone)]
pub struct TransformResolver {
    groups: Vec<TransformGroup>,
}

impl TransformResolver {
    pub fn new(groups: Vec<TransformGroup>) -> Self {
        Self { groups }
    }

    /// 設定に表があればそれを、なければ組み込み表を使う
    pub fn from_config(config: &Config) -> Self {
        if config.transforms.is_empty() {
            Self::default()
        } else {
            Self::new(config.transforms.clone())
        }
    }

    pub fn groups(&self) -> &[TransformGroup] {
        &self.groups
    }

    pub fn resolve(&self, graphic_id: &str) -> Option<ResolvedTransform> {
        if graphic_id.is_empty() {
            return None;
        }
        self.groups
            .iter()
            .find(|g| g.matches(graphic_id))
            .map(|g| ResolvedTransform {
                group: g.group.clone(),
                base: g.matrix,
                orientation: g.matrix.orientation(),
            })
    }
}

impl Default for TransformResolver {
    fn default() -> Self {
        Self::new(builtin_groups())
    }
}

/// 組み込みの優先順位表
pub fn builtin_groups() -> Vec<TransformGroup> {
    vec![
        TransformGroup::new(
            "wide-long",
            &[
                "boost", "crunchie", "curly-wurly", "mentos", "panda-liquorice", "twix",
                "winegums", "wrigleys",
            ],
            [0.0, 1.4, -1.4, 0.0, -35.0, 90.0],
        ),
        TransformGroup::new(
            "wide-short",
            &[
                "getbuzzing-mint-choc-high-protein",
                "getbuzzing-mixed-berries",
                "kit-kat-chunky",
                "mars",
                "misc-bar",
                "misc-big-bar",
                "nakd-apple-crunch",
                "nakd-berry-delight",
                "nakd-cashew-cookie",
                "nakd-cocoa-orange",
                "nature-valley-maple-syrup",
                "nature-valley-oats-dark-chocolate",
                "nature-valley-oats-n-honey",
                "smarties",
                "snickers",
                "trek-banana-bread-flapjack",
                "trek-peanut-power",
            ],
            [0.0, 1.2, -1.2, 0.0, -35.0, -10.0],
        ),
        TransformGroup::new(
            "very-wide",
            &["nakd-coconut-bliss-nibbles", "skittles"],
            [0.0, 1.0, -1.0, 0.0, -30.0, -10.0],
        ),
        TransformGroup::new(
            "narrow",
            &["fruit-pastilles-roll"],
            [0.0, 1.4, -1.4, 0.0, -35.0, 10.0],
        ),
        TransformGroup::new(
            "right-aligned",
            &[
                "coca-cola-can",
                "coca-cola-zero-can",
                "diet-cola-can",
                "diet-pepsi-can",
                "fruit-n-nuts-cranberry",
                "good4u-superseed-coconut-berry",
                "misc-can",
                "pepsi-max-can",
                "propercorn-fiery-worcester",
                "propercorn-lightly-salted",
                "propercorn-sweet-coconut-vanilla",
                "smokey-almonds-corn-cranberry",
            ],
            [1.05, 0.0, 0.0, 1.05, -30.0, -20.0],
        ),
        TransformGroup::new("left-aligned", &["freddo"], [1.05, 0.0, 0.0, 1.05, 40.0, -20.0]),
        TransformGroup::new("tall", &["misc-bottle"], [1.4, 0.0, 0.0, 1.4, -35.0, -30.0]),
        TransformGroup::new(
            "small-square",
            &[
                "love-corn-habanero",
                "love-corn-sea-salt",
                "love-corn-smoked-bbq",
                "misc-crisps",
                "popchips-ridges-salt-vinegar",
                "popchips-ridges-smokey-bacon",
                "popchips-salt-pepper",
                "popchips-sour-cream-onion",
                "sun-maid",
                "walkers-cheese-onion",
                "walkers-ready-salted",
                "walkers-salt-vinegar",
            ],
            [0.7, 0.0, 0.0, 0.7, -25.0, 10.0],
        ),
        TransformGroup::new(
            "large-square",
            &["mccoys", "mini-cheddars", "nude-popcorn-blue", "nude-popcorn", "snack-a-jacks"],
            [0.7, 0.0, 0.0, 0.7, -22.0, -30.0],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twix_resolves_wide_long() {
        let resolver = TransformResolver::default();
        let t = resolver.resolve("twix-family-bag").unwrap();
        assert_eq!(t.group, "wide-long");
        assert_eq!(t.overlay().0, [0.0, 1.4, -1.4, 0.0, 0.0, 0.0]);
        assert_eq!(t.orientation, Orientation::Vertical);
    }

    #[test]
    fn test_unknown_is_none() {
        let resolver = TransformResolver::default();
        assert!(resolver.resolve("unknown-snack-xyz").is_none());
        assert!(resolver.resolve("").is_none());
    }

    #[test]
    fn test_priority_order_for_ambiguous_id() {
        // "mars" (wide-short) と "misc-can" (right-aligned) の両方を含む
        let resolver = TransformResolver::default();
        let t = resolver.resolve("mars-misc-can").unwrap();
        assert_eq!(t.group, "wide-short");
    }

    #[test]
    fn test_right_aligned_before_left_aligned() {
        let resolver = TransformResolver::default();
        let t = resolver.resolve("freddo-coca-cola-can").unwrap();
        assert_eq!(t.group, "right-aligned");
    }

    #[test]
    fn test_nude_popcorn_blue_is_large_square() {
        let resolver = TransformResolver::default();
        let t = resolver.resolve("nude-popcorn-blue").unwrap();
        assert_eq!(t.group, "large-square");
        assert_eq!(t.orientation, Orientation::Horizontal);
        assert_eq!(t.base.0, [0.7, 0.0, 0.0, 0.7, -22.0, -30.0]);
    }

    #[test]
    fn test_builtin_group_order() {
        let names: Vec<String> = builtin_groups().into_iter().map(|g| g.group).collect();
        assert_eq!(
            names,
            vec![
                "wide-long",
                "wide-short",
                "very-wide",
                "narrow",
                "right-aligned",
                "left-aligned",
                "tall",
                "small-square",
                "large-square",
            ]
        );
    }

    #[test]
    fn test_custom_table() {
        let resolver = TransformResolver::new(vec![TransformGroup::new(
            "mugs",
            &["mug"],
            [1.0, 0.0, 0.0, 1.0, 3.0, 4.0],
        )]);
        assert_eq!(resolver.resolve("big-mug").unwrap().group, "mugs");
        assert!(resolver.resolve("twix").is_none());
    }

    #[test]
    fn test_empty_token_never_matches() {
        let group = TransformGroup::new("blank", &[""], [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(!group.matches("anything"));
    }
}

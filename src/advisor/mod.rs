//! 虫害防治建议表
//!
//! 每种已知虫害对应一组化学药剂（含价格）、一个有机替代方案和土壤影响说明。
//! 无法识别的标签返回 `Recommendation::Unknown`，而不是报错。

use serde::{Deserialize, Serialize};

pub const NO_RECOMMENDATION: &str = "No recommendation available";
pub const NO_ORGANIC: &str = "No organic alternatives";
pub const NO_SOIL_INFO: &str = "No soil impact information available";

/// 已知的水稻虫害种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PestKind {
    GreenLeafhopper,
    Planthopper,
    RiceBug,
    RiceLeafRoller,
    RiceStemBorer,
}

impl PestKind {
    pub const ALL: [PestKind; 5] = [
        PestKind::GreenLeafhopper,
        PestKind::Planthopper,
        PestKind::RiceBug,
        PestKind::RiceLeafRoller,
        PestKind::RiceStemBorer,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            PestKind::GreenLeafhopper => "Green Leafhopper",
            PestKind::Planthopper => "Planthopper",
            PestKind::RiceBug => "Rice Bug",
            PestKind::RiceLeafRoller => "Rice Leaf Roller",
            PestKind::RiceStemBorer => "Rice Stem Borer",
        }
    }

    /// 标签先规范化再匹配
    pub fn from_label(label: &str) -> Option<Self> {
        let canonical = canonicalize_label(label);
        Self::ALL
            .into_iter()
            .find(|kind| kind.display_name() == canonical)
    }

    fn remedies(self) -> &'static [(&'static str, f64)] {
        match self {
            PestKind::GreenLeafhopper => &[("Imidacloprid", 10.0)],
            PestKind::Planthopper => &[("Buprofezin", 15.0)],
            PestKind::RiceBug => &[("Lambda-cyhalothrin", 20.0)],
            PestKind::RiceLeafRoller => &[("Chlorpyrifos", 25.0)],
            PestKind::RiceStemBorer => &[("Fipronil", 30.0)],
        }
    }

    pub fn organic(self) -> &'static str {
        match self {
            PestKind::GreenLeafhopper => "Neem Oil",
            PestKind::Planthopper => "Beauveria bassiana",
            PestKind::RiceBug => "Pyrethrin",
            PestKind::RiceLeafRoller => "Bacillus thuringiensis",
            PestKind::RiceStemBorer => "Trichogramma",
        }
    }

    pub fn soil_effect(self) -> &'static str {
        match self {
            PestKind::GreenLeafhopper => {
                "Highly toxic to soil microbes, reduces beneficial bacteria and fungi, affecting soil fertility."
            }
            PestKind::Planthopper => {
                "Minimal direct impact on soil but reduces beneficial soil arthropods, affecting soil aeration."
            }
            PestKind::RiceBug => {
                "Binds to soil, toxic to earthworms, disrupts soil food web, lowers organic matter decomposition."
            }
            PestKind::RiceLeafRoller => {
                "Persistent in soil for over a year, disrupts soil enzymes, kills beneficial nematodes, can leach into groundwater."
            }
            PestKind::RiceStemBorer => {
                "Long-term soil toxicity, reduces microbial balance and earthworms, alters nitrogen cycle."
            }
        }
    }
}

/// 化学药剂及价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remedy {
    pub name: String,
    pub price: f64,
}

/// 查表结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Known(PestKind),
    Unknown,
}

impl Recommendation {
    pub fn pest(&self) -> Option<PestKind> {
        match self {
            Recommendation::Known(kind) => Some(*kind),
            Recommendation::Unknown => None,
        }
    }

    /// 按价格升序
    pub fn remedies(&self) -> Vec<Remedy> {
        let mut remedies: Vec<Remedy> = match self {
            Recommendation::Known(kind) => kind
                .remedies()
                .iter()
                .map(|(name, price)| Remedy {
                    name: (*name).to_string(),
                    price: *price,
                })
                .collect(),
            Recommendation::Unknown => Vec::new(),
        };
        remedies.sort_by(|a, b| a.price.total_cmp(&b.price));
        remedies
    }

    pub fn organic(&self) -> &'static str {
        match self {
            Recommendation::Known(kind) => kind.organic(),
            Recommendation::Unknown => NO_ORGANIC,
        }
    }

    pub fn soil_effect(&self) -> &'static str {
        match self {
            Recommendation::Known(kind) => kind.soil_effect(),
            Recommendation::Unknown => NO_SOIL_INFO,
        }
    }

    /// 最便宜的药剂名称，未知虫害返回占位文本
    pub fn pesticide_summary(&self) -> String {
        self.remedies()
            .into_iter()
            .next()
            .map(|remedy| remedy.name)
            .unwrap_or_else(|| NO_RECOMMENDATION.to_string())
    }
}

pub fn recommend(label: &str) -> Recommendation {
    match PestKind::from_label(label) {
        Some(kind) => Recommendation::Known(kind),
        None => Recommendation::Unknown,
    }
}

/// 去除首尾空白、合并中间空白，并按单词首字母大写
///
/// 下划线视为空格。字母前面不是字母时大写，否则小写。
pub fn canonicalize_label(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    let mut prev_is_letter = false;
    for ch in collapsed.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

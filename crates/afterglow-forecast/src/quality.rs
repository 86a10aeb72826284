//! Parsing and tiering of the SunsetBot quality score.

use serde::Serialize;

use crate::error::ForecastError;

/// Extract the numeric score from strings like `0.047（微烧）`.
///
/// The number is whatever precedes the first full- or half-width opening
/// parenthesis, trimmed. Non-finite values are rejected.
pub fn parse_quality(raw: &str) -> Result<f64, ForecastError> {
    let fail = |reason: &str| ForecastError::Quality {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let number = raw.split(['（', '(']).next().unwrap_or_default().trim();
    if number.is_empty() {
        return Err(fail("no numeric part"));
    }
    let value: f64 = number.parse().map_err(|_| fail("not a number"))?;
    if !value.is_finite() {
        return Err(fail("not a finite number"));
    }
    Ok(value)
}

/// Nine afterglow tiers, lowest first.
///
/// Intervals are half-open on the right: `0.05` is [`QualityLevel::Small`],
/// `0.0499` is [`QualityLevel::Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Trace,
    Small,
    SmallToMedium,
    Medium,
    MediumToLarge,
    Large,
    TypicalLarge,
    PremiumLarge,
    Spectacular,
}

/// Lower bound of every tier above [`QualityLevel::Trace`].
const THRESHOLDS: [(f64, QualityLevel); 8] = [
    (0.7, QualityLevel::Spectacular),
    (0.6, QualityLevel::PremiumLarge),
    (0.5, QualityLevel::TypicalLarge),
    (0.4, QualityLevel::Large),
    (0.3, QualityLevel::MediumToLarge),
    (0.2, QualityLevel::Medium),
    (0.1, QualityLevel::SmallToMedium),
    (0.05, QualityLevel::Small),
];

impl QualityLevel {
    pub const ALL: [QualityLevel; 9] = [
        QualityLevel::Trace,
        QualityLevel::Small,
        QualityLevel::SmallToMedium,
        QualityLevel::Medium,
        QualityLevel::MediumToLarge,
        QualityLevel::Large,
        QualityLevel::TypicalLarge,
        QualityLevel::PremiumLarge,
        QualityLevel::Spectacular,
    ];

    pub fn classify(value: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(lower, _)| value >= *lower)
            .map(|(_, level)| *level)
            .unwrap_or(QualityLevel::Trace)
    }

    /// Label shown to readers, in the upstream's vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            QualityLevel::Trace => "微微烧",
            QualityLevel::Small => "小烧",
            QualityLevel::SmallToMedium => "小烧到中等烧",
            QualityLevel::Medium => "中等烧",
            QualityLevel::MediumToLarge => "中等烧到大烧",
            QualityLevel::Large => "大烧",
            QualityLevel::TypicalLarge => "典型大烧",
            QualityLevel::PremiumLarge => "优质大烧",
            QualityLevel::Spectacular => "世纪大烧",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            QualityLevel::Trace => "🌤️",
            QualityLevel::Small => "🌇",
            QualityLevel::SmallToMedium => "⛅",
            QualityLevel::Medium => "🔥",
            QualityLevel::MediumToLarge => "🌅",
            QualityLevel::Large => "🌄",
            QualityLevel::TypicalLarge => "✨",
            QualityLevel::PremiumLarge => "📸",
            QualityLevel::Spectacular => "🌌",
        }
    }

    /// Font color for the WeCom `<font>` tag.
    pub fn color(self) -> &'static str {
        match self {
            QualityLevel::Trace => "#808080",
            QualityLevel::Small => "#1E90FF",
            QualityLevel::SmallToMedium => "#32CD32",
            QualityLevel::Medium => "#FFA500",
            QualityLevel::MediumToLarge => "#FF4500",
            QualityLevel::Large => "#FF0000",
            QualityLevel::TypicalLarge => "#9370DB",
            QualityLevel::PremiumLarge => "#EE82EE",
            QualityLevel::Spectacular => "#4B0082",
        }
    }

    /// Quoted Markdown paragraph describing what to expect tonight.
    pub fn description(self) -> &'static str {
        match self {
            QualityLevel::Trace => {
                "> 🌤️ 今晚只是微微烧，但每一刻的天空都独一无二。\n> \n> 忙碌之余抬头看看，让眼睛休息一下。"
            }
            QualityLevel::Small => {
                "> 🌇 今晚有小烧，天边会有淡淡的色彩。\n> \n> 工作累了就看看窗外，给自己几分钟。"
            }
            QualityLevel::SmallToMedium => {
                "> ⛅ 今晚小烧到中等烧，天空会有温柔的渐变。\n> \n> 暂时放下手头的事，看看天空的表演。"
            }
            QualityLevel::Medium => {
                "> 🔥 今晚中等烧，色彩层次丰富，值得驻足！\n> \n> 工作做不完，晚霞却转瞬即逝。"
            }
            QualityLevel::MediumToLarge => {
                "> 🌅 今晚中等烧到大烧，天空即将上演精彩表演！\n> \n> 找个视野好的地方，好好享受。"
            }
            QualityLevel::Large => {
                "> 🌄 今晚大烧！一场视觉盛宴正在准备中。\n> \n> 叫上朋友，一起看这份大自然的馈赠。"
            }
            QualityLevel::TypicalLarge => {
                "> ✨ 今晚是典型大烧，色彩饱满、层次丰富！\n> \n> 强烈建议找个高处，静静欣赏。"
            }
            QualityLevel::PremiumLarge => {
                "> 📸 今晚是优质大烧，拍照的最佳时机！\n> \n> 带上相机或手机，别让美景在忙碌中溜走。"
            }
            QualityLevel::Spectacular => {
                "> 🌌 **今晚是世纪大烧！极其罕见的壮观景象！**\n> \n> 💡 **建议**：\n> • 提前 15 分钟找个开阔的高处\n> • 准备好相机记录这一刻\n> • 放下手机专注欣赏几分钟\n> \n> **错过今天，下次不知要等多久！**"
            }
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

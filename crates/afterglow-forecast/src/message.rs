use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime};

use crate::quality::QualityLevel;

const TITLE: &str = "今日晚霞预报";
const QUALITY_BAR: &str = "▁▂▃▅▆▇";
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One tip per day, picked by day of year.
const TIPS: [&str; 7] = [
    "💡 **小贴士**：手机拍晚霞时点一下屏幕最亮处降低曝光，色彩会更饱满。",
    "💡 **小贴士**：视野开阔的高处或水边最适合看晚霞，提前踩点不会错过。",
    "💡 **小贴士**：火烧云通常在日落前后 20-30 分钟最美，建议提前 10 分钟到位。",
    "💡 **小贴士**：傍晚远眺可以缓解眼疲劳，每天给自己 5 分钟「天空时间」。",
    "💡 **小贴士**：空气通透加上 30-70% 的云量最容易出晚霞，雨后放晴是好时机。",
    "💡 **小贴士**：叫上朋友或家人一起看晚霞，分享让快乐加倍。",
    "💡 **小贴士**：拍摄时加入建筑或树木作前景，画面更有层次。",
];

/// Everything that goes into one push.
#[derive(Debug, Clone)]
pub struct MessageInput<'a> {
    pub level: QualityLevel,
    /// Upstream `tb_event_time`; may be empty or malformed.
    pub event_time: &'a str,
    pub aod: &'a str,
    /// Locally computed sunset, used when `event_time` is unusable.
    pub computed_sunset: DateTime<FixedOffset>,
    pub pushed_at: DateTime<FixedOffset>,
}

/// Render the WeCom Markdown card.
pub fn render(input: &MessageInput<'_>) -> String {
    let level = input.level;
    let sunset = sunset_clock(input.event_time, input.computed_sunset);
    let aod = if input.aod.trim().is_empty() {
        "暂无"
    } else {
        input.aod
    };

    format!(
        "## {TITLE} {emoji}\n\
         \n\
         > <font color=\"{color}\">**质量等级：{label}**</font>\n\
         > {QUALITY_BAR}\n\
         \n\
         ---\n\
         \n\
         ### 📅 今日预报\n\
         \n\
         **日落时间**：今天 {sunset}\n\
         **空气质量**：{aod}\n\
         **推送时间**：{pushed}\n\
         \n\
         ---\n\
         \n\
         {description}\n\
         \n\
         ---\n\
         \n\
         {tip}\n\
         \n\
         <font color=\"comment\">💬 来自天空的问候 · 数据来源 SunsetBot</font>",
        emoji = level.emoji(),
        color = level.color(),
        label = level.label(),
        pushed = input.pushed_at.format(EVENT_TIME_FORMAT),
        description = level.description(),
        tip = tip_for(input.pushed_at),
    )
}

/// `HH:MM` of the upstream event time, else of the computed sunset.
fn sunset_clock(event_time: &str, computed: DateTime<FixedOffset>) -> String {
    match NaiveDateTime::parse_from_str(event_time.trim(), EVENT_TIME_FORMAT) {
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => computed.format("%H:%M").to_string(),
    }
}

fn tip_for(day: DateTime<FixedOffset>) -> &'static str {
    TIPS[day.ordinal() as usize % TIPS.len()]
}

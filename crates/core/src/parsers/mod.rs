use serde::Deserialize;
use thiserror::Error;

use crate::model::{Comment, ConfigError, DanmakuConfig};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an array of comments or an object with a \"danmus\" array")]
    UnknownShape,
    #[error("invalid options: {0}")]
    Config(#[from] ConfigError),
}

/// A comment source together with the options that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DanmakuFile {
    pub config: DanmakuConfig,
    pub danmus: Vec<Comment>,
}

#[derive(Deserialize)]
struct ObjectForm {
    #[serde(flatten)]
    config: DanmakuConfig,
    danmus: Vec<Comment>,
}

/// Parse a comment file.
///
/// Accepted shapes:
/// 1. A bare array of `{avatar, name, text}` objects; options take defaults.
/// 2. An object with a `danmus` array plus any option keys
///    (`rowCount`, `containerWidth`, `speed`, `space`, `loop`, …).
pub fn parse_danmaku(data: &[u8]) -> Result<DanmakuFile, SourceError> {
    let value: serde_json::Value = serde_json::from_slice(data)?;

    let file = if value.is_array() {
        DanmakuFile {
            config: DanmakuConfig::default(),
            danmus: serde_json::from_value(value)?,
        }
    } else if value.get("danmus").is_some_and(serde_json::Value::is_array) {
        let ObjectForm { config, danmus } = serde_json::from_value(value)?;
        DanmakuFile { config, danmus }
    } else {
        return Err(SourceError::UnknownShape);
    };

    file.config.validate()?;
    log::debug!("parsed {} comments", file.danmus.len());
    Ok(file)
}

/// The five comments of the stock demo.
pub fn demo_comments() -> Vec<Comment> {
    const AVATAR: &str = "https://i.pravatar.cc/40";
    [
        ("小熊是", "第一条嘻嘻嘻嘻嘻嘻休息休息阿阿斯顿法师"),
        ("小熊1", "第二条第二条第二条"),
        ("小熊2", "第三条"),
        ("冲冲冲是啥啥啥", "这是第四条弹幕"),
        ("粉色系", "这是第五条"),
    ]
    .into_iter()
    .map(|(name, text)| Comment::new(AVATAR, name, text))
    .collect()
}

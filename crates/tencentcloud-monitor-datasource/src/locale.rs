/*! Translations of user-facing text.

Every [`Key`] must have an entry for every [`Language`]: [`translate`] is an
exhaustive match, so a missing translation fails to compile. The language is
always passed explicitly; there is no process-wide current language.
*/
use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A supported UI language.
///
/// Tags are matched case-insensitively, both when parsed and when deserialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String")]
pub enum Language {
    /// Simplified Chinese.
    #[default]
    #[serde(rename = "zh-CN")]
    Chinese,
    /// US English.
    #[serde(rename = "en-US")]
    English,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 2] = [Language::Chinese, Language::English];

    /// The language tag, e.g. `zh-CN`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chinese => "zh-CN",
            Self::English => "en-US",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing an unsupported language tag.
#[derive(Debug, Error)]
#[error("unsupported language {0}; must be one of \"zh-CN\", \"en-US\"")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl TryFrom<String> for Language {
    type Error = UnknownLanguage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A translatable piece of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    /// Label of the `SecretId` setting.
    SecretId,
    /// Label of the `SecretKey` setting.
    SecretKey,
    /// Label of the namespace selector.
    Namespace,
    /// Label of the region selector.
    Region,
    /// Label of the metric selector.
    MetricName,
    /// Label of the period selector.
    Period,
    /// Label of the dimension editor.
    Dimension,
    /// Button adding a dimension filter.
    AppendDimension,
    /// Health check success message.
    HealthOk,
    /// Health check failure message.
    HealthFailed,
}

impl Key {
    /// Every key, in declaration order.
    pub const ALL: [Key; 10] = [
        Key::SecretId,
        Key::SecretKey,
        Key::Namespace,
        Key::Region,
        Key::MetricName,
        Key::Period,
        Key::Dimension,
        Key::AppendDimension,
        Key::HealthOk,
        Key::HealthFailed,
    ];
}

/// Look up the text for `key` in `language`.
pub fn translate(language: Language, key: Key) -> &'static str {
    use Key::*;
    use Language::*;
    match (language, key) {
        (Chinese, SecretId) => "SecretId",
        (Chinese, SecretKey) => "SecretKey",
        (Chinese, Namespace) => "命名空间",
        (Chinese, Region) => "地域",
        (Chinese, MetricName) => "指标名称",
        (Chinese, Period) => "统计周期",
        (Chinese, Dimension) => "维度",
        (Chinese, AppendDimension) => "添加维度",
        (Chinese, HealthOk) => "数据源连接成功",
        (Chinese, HealthFailed) => "数据源连接失败",

        (English, SecretId) => "SecretId",
        (English, SecretKey) => "SecretKey",
        (English, Namespace) => "Namespace",
        (English, Region) => "Region",
        (English, MetricName) => "MetricName",
        (English, Period) => "Period",
        (English, Dimension) => "Dimension",
        (English, AppendDimension) => "Append Dimension",
        (English, HealthOk) => "Data source is working",
        (English, HealthFailed) => "Data source is not working",
    }
}

/// The full table for `language`, keyed by the camelCase key name.
pub fn table(language: Language) -> BTreeMap<Key, &'static str> {
    Key::ALL
        .into_iter()
        .map(|key| (key, translate(language, key)))
        .collect()
}

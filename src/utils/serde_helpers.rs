/// 用于处理调用方传入的宽松布尔值的序列化/反序列化辅助模块

use serde::{de, Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn interpret<E: de::Error>(value: BoolValue) -> Result<bool, E> {
    match value {
        BoolValue::Bool(b) => Ok(b),
        BoolValue::Int(1) => Ok(true),
        BoolValue::Int(0) => Ok(false),
        BoolValue::Int(n) => Err(E::custom(format!("invalid boolean value: {}", n))),
        BoolValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(E::custom(format!("invalid boolean value: '{}'", s))),
        },
    }
}

/// 接受 `true`、`"yes"`、`"1"` 等形式 (例如: "private": "yes")
pub mod loose_bool {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        interpret(BoolValue::deserialize(deserializer)?)
    }
}

/// 与 `loose_bool` 相同，但 `null` 表示未提供
pub mod optional_loose_bool {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolValue>::deserialize(deserializer)? {
            Some(value) => interpret(value).map(Some),
            None => Ok(None),
        }
    }
}

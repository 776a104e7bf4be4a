use std::num::IntErrorKind;

use serde::{Deserialize, Deserializer};

use crate::db::Page;

// `?page=abc` should fall back to the first page, not reject the whole request.
// Out-of-range numbers saturate so a huge page is still past the last one.
pub fn deserialize_page_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(match value.trim().parse::<i64>() {
        Ok(page) => page,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 1,
        },
    })
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    #[serde(deserialize_with = "deserialize_page_number")]
    pub page: i64,
}

impl PageQuery {
    /// `None` for page numbers below 1.
    pub fn page(&self) -> Option<Page> {
        Page::new(self.page)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

// the quiz frontend keys categories by their id as a string, so both `2` and `"2"` arrive
pub fn deserialize_i64_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(value) => value.trim().parse::<i64>().map_err(|_| {
            serde::de::Error::custom(format!("Wrong value {value}, can not parse to i64"))
        }),
    }
}

/*
[INPUT]:  Optional chrono timestamps on order requests
[OUTPUT]: Exchange formatted datetime strings
[POS]:    Data layer - serde helpers shared by request types
[UPDATE]: When the exchange changes its datetime format
*/

/// `tif` fields are sent as `YYYY-MM-DD HH:MM:SS` (UTC)
pub mod tif_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| {
            NaiveDateTime::parse_from_str(&value, FORMAT).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

//! deCONZ timestamps are naive ISO 8601 strings without a timezone
//! (`2024-03-01T12:00:00.123`), except that a state which has never been
//! updated is reported as the literal string `"none"`.

pub mod last_updated {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value.as_deref() {
            None | Some("none") => Ok(None),
            Some(text) => text
                .parse::<NaiveDateTime>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.collect_str(&ts.format(FORMAT)),
            None => serializer.serialize_str("none"),
        }
    }
}

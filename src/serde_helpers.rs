/// Serde helpers for `time::OffsetDateTime`.
///
/// Both directions use RFC 3339 (e.g. `2025-01-02T03:04:05+01:00`), which is
/// also what git prints for `%cI`.
pub mod offset_datetime {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[test]
    fn roundtrips_offset_datetime() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wrapper {
            #[serde(with = "crate::serde_helpers::offset_datetime")]
            ts: OffsetDateTime,
        }

        let value = Wrapper {
            ts: datetime!(2024-12-31 23:59:59 +01:00),
        };
        let serialized = serde_json::to_string(&value).unwrap();
        assert_eq!(
            serialized, "{\"ts\":\"2024-12-31T23:59:59+01:00\"}",
            "Expected 2024-12-31T23:59:59+01:00 got {}",
            serialized
        );

        let deserialized: Wrapper = serde_json::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized, value,
            "Deserialized value did not match original. Got {:?}, expected {:?}",
            deserialized, value
        );
    }
}

use serde::{Deserialize, Deserializer, Serialize};

/// A document from the `planets` collection.
///
/// Nothing is required: a field missing from the stored document is missing
/// from the serialized record too. Driver fields (`_id`, `__v`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_numeric_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericId {
    Integer(i64),
    Float(f64),
}

/// Accepts Int32, Int64 and integral Double. Documents written from the mongo
/// shell store every number as a double.
fn deserialize_numeric_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericId>::deserialize(deserializer)?
        .map(integral_id)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Same rules as the stored id, for ids that must be present.
pub fn deserialize_required_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    integral_id(NumericId::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

fn integral_id(id: NumericId) -> Result<i64, String> {
    match id {
        NumericId::Integer(id) => Ok(id),
        NumericId::Float(id)
            if id.fract() == 0.0 && id >= i64::MIN as f64 && id <= i64::MAX as f64 =>
        {
            Ok(id as i64)
        }
        NumericId::Float(id) => Err(format!("planet id {} is not an integer", id)),
    }
}

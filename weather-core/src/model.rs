use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag written into every summary built from a provider response.
pub const SOURCE_API_FRESH: &str = "api_fresh";

/// Normalized current-day weather for one city.
///
/// This is both the response body and the cached value. A cache hit re-serves
/// the stored value as-is, so `source` still reads `"api_fresh"`.
///
/// Provider values are carried through untouched: an integer `tempmax` stays an
/// integer, and an unexpected type is passed on rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub location: Option<Value>,
    pub date: Option<Value>,
    pub temp_max: Option<Value>,
    pub temp_min: Option<Value>,
    pub conditions: Option<Value>,
    pub source: String,
}

impl WeatherSummary {
    /// Build a summary from the first forecast day of a provider response.
    pub fn from_forecast(resolved_address: Option<Value>, day: &ForecastDay) -> Self {
        Self {
            location: resolved_address,
            date: day.datetime.clone(),
            temp_max: day.tempmax.clone(),
            temp_min: day.tempmin.clone(),
            conditions: day.description.clone(),
            source: SOURCE_API_FRESH.to_string(),
        }
    }
}

/// Raw timeline payload. Every field is optional; shape checks happen in the lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResponse {
    #[serde(default)]
    pub resolved_address: Option<Value>,
    #[serde(default)]
    pub days: Option<Vec<ForecastDay>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastDay {
    #[serde(default)]
    pub datetime: Option<Value>,
    #[serde(default)]
    pub tempmax: Option<Value>,
    #[serde(default)]
    pub tempmin: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

//! Response shapes for the WeatherLink v2 endpoints.
//!
//! The API reports missing readings as `null`, so measurements are
//! optional. Fields not listed here are kept in each record's `extra` map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reads `null` as the type's default, the way a missing field already is.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `/stations`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StationsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub stations: Vec<Station>,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Station {
    #[serde(deserialize_with = "null_as_default")]
    pub station_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub station_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gateway_id: u64,
    pub gateway_id_hex: Option<String>,
    pub product_number: Option<String>,
    pub username: Option<String>,
    pub user_email: Option<String>,
    pub company_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub private: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub recording_interval: u32,
    pub firmware_version: Option<String>,
    pub meid: Option<String>,
    pub registered_date: Option<i64>,
    pub subscription_end_date: Option<i64>,
    pub time_zone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

/// `/sensors`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub sensors: Vec<Sensor>,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Sensor {
    #[serde(deserialize_with = "null_as_default")]
    pub lsid: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub sensor_type: u32,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub product_name: String,
    pub product_number: Option<String>,
    pub rain_collector_type: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    pub created_date: Option<i64>,
    pub modified_date: Option<i64>,
    pub station_id: Option<u64>,
    pub station_name: Option<String>,
    pub parent_device_type: Option<String>,
    pub parent_device_name: Option<String>,
    pub parent_device_id: Option<u64>,
    pub parent_device_id_hex: Option<String>,
    pub port_number: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub tx_id: Option<u32>,
}

/// `/current/{station-id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrentResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub station_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub sensors: Vec<CurrentSensor>,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrentSensor {
    #[serde(deserialize_with = "null_as_default")]
    pub lsid: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub sensor_type: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub data_structure_type: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<CurrentRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CurrentRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub ts: i64,
    pub bar: Option<f64>,
    pub bar_trend: Option<f64>,
    pub temp_in: Option<f64>,
    pub hum_in: Option<f64>,
    pub temp_out: Option<f64>,
    pub hum_out: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_speed_10_min_avg: Option<f64>,
    pub wind_dir: Option<f64>,
    pub rain_rate_mm: Option<f64>,
    pub rain_day_mm: Option<f64>,
    pub rain_month_mm: Option<f64>,
    pub rain_year_mm: Option<f64>,
    pub uv: Option<f64>,
    pub solar_rad: Option<f64>,
    pub et_day: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CurrentRecord {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.ts, 0)
    }
}

/// `/historic/{station-id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoricResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub station_id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub sensors: Vec<HistoricSensor>,
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoricSensor {
    #[serde(deserialize_with = "null_as_default")]
    pub lsid: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub sensor_type: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub data_structure_type: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<HistoricRecord>,
}

/// One archive interval.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoricRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub ts: i64,
    pub arch_int: Option<u32>,
    pub rev_type: Option<u32>,
    pub temp_out: Option<f64>,
    pub temp_out_hi: Option<f64>,
    pub temp_out_lo: Option<f64>,
    pub temp_in: Option<f64>,
    pub hum_in: Option<f64>,
    pub hum_out: Option<f64>,
    pub bar: Option<f64>,
    pub rainfall_mm: Option<f64>,
    pub rain_rate_hi_mm: Option<f64>,
    pub et: Option<f64>,
    pub wind_speed_avg: Option<f64>,
    pub wind_speed_hi: Option<f64>,
    pub wind_dir_of_hi: Option<f64>,
    pub wind_dir_of_prevail: Option<f64>,
    pub dew_point_out: Option<f64>,
    pub heat_index_out: Option<f64>,
    pub wind_chill: Option<f64>,
    pub thw_index: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl HistoricRecord {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.ts, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_readings_and_unknown_fields() {
        let rec: CurrentRecord = serde_json::from_str(
            r#"{"ts": 1591894200, "temp_out": 61.2, "uv": null, "temp_extra_1": null, "rx_state": 0}"#,
        )
        .unwrap();
        assert_eq!(rec.ts, 1591894200);
        assert_eq!(rec.temp_out, Some(61.2));
        assert_eq!(rec.uv, None);
        assert_eq!(rec.wind_dir, None);
        assert_eq!(rec.extra.get("rx_state"), Some(&Value::from(0)));
        assert!(rec.extra.contains_key("temp_extra_1"));
        assert_eq!(rec.timestamp().unwrap().timestamp(), 1591894200);
    }

    #[test]
    fn null_in_required_fields_reads_as_default() {
        let st: StationsResponse = serde_json::from_str(
            r#"{"stations":[{"station_id":2970,"station_name":null,"gateway_id":null,"recording_interval":null,"active":null}],"generated_at":null}"#,
        )
        .unwrap();
        assert_eq!(st.stations[0].station_id, 2970);
        assert_eq!(st.stations[0].station_name, "");
        assert_eq!(st.stations[0].gateway_id, 0);
        assert_eq!(st.stations[0].recording_interval, 0);
        assert!(!st.stations[0].active);
        assert_eq!(st.generated_at, 0);

        let se: SensorsResponse = serde_json::from_str(
            r#"{"sensors":[{"lsid":1,"sensor_type":null,"product_name":null}]}"#,
        )
        .unwrap();
        assert_eq!(se.sensors[0].sensor_type, 0);
        assert_eq!(se.sensors[0].product_name, "");

        let cur: CurrentResponse = serde_json::from_str(
            r#"{"station_id":1,"sensors":[{"lsid":1,"data_structure_type":null,"data":[{"ts":null,"wind_dir":90}]}]}"#,
        )
        .unwrap();
        assert_eq!(cur.sensors[0].data_structure_type, 0);
        assert_eq!(cur.sensors[0].data[0].ts, 0);
        assert_eq!(cur.sensors[0].data[0].wind_dir, Some(90.0));

        let hist: HistoricResponse =
            serde_json::from_str(r#"{"station_id":1,"sensors":null}"#).unwrap();
        assert!(hist.sensors.is_empty());
    }

    #[test]
    fn missing_fields_default() {
        let st: StationsResponse = serde_json::from_str(r#"{"stations":[{"station_id":1}]}"#).unwrap();
        assert_eq!(st.stations[0].station_id, 1);
        assert_eq!(st.stations[0].station_name, "");
        assert_eq!(st.generated_at, 0);
    }
}

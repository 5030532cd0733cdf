//! Sales records as returned by the hosted database

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of customer. Resellers buy on behalf of their own clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Client,
    Reseller,
}

impl ClientType {
    pub const ALL: [ClientType; 2] = [ClientType::Client, ClientType::Reseller];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Client => "client",
            ClientType::Reseller => "reseller",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    /// Display name of the product or service
    pub product_service: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Subscription length, e.g. "1 month"
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
}

/// Service columns joined onto a transaction row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceRef {
    #[serde(default)]
    pub product_service: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

/// Client columns joined onto a transaction row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub client_type: Option<ClientType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    #[serde(deserialize_with = "deserialize_sale_date")]
    pub date: NaiveDate,
    pub selling_price: f64,
    pub cost_at_sale: f64,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default, alias = "services")]
    pub service: Option<ServiceRef>,
    #[serde(default, alias = "clients")]
    pub client: Option<ClientRef>,
}

impl Transaction {
    pub fn profit(&self) -> f64 {
        self.selling_price - self.cost_at_sale
    }
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
fn deserialize_sale_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_sale_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_sale_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|e| format!("invalid sale date {:?}: {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_profit() {
        let tx = Transaction {
            id: "t1".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            selling_price: 120.0,
            cost_at_sale: 45.5,
            client_id: None,
            service_id: None,
            service: None,
            client: None,
        };
        assert!((tx.profit() - 74.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transaction_deserialize_joined_row() {
        let json = r#"{
            "id": "t1",
            "date": "2024-03-05",
            "selling_price": 30,
            "cost_at_sale": 12.5,
            "client_id": "c1",
            "services": {"product_service": "Netflix", "category": "Streaming", "duration": "1 month"},
            "clients": {"name": "Ana", "type": "reseller"}
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let service = tx.service.unwrap();
        assert_eq!(service.product_service.as_deref(), Some("Netflix"));
        assert_eq!(service.category.as_deref(), Some("Streaming"));
        assert_eq!(tx.client.unwrap().client_type, Some(ClientType::Reseller));
    }

    #[test]
    fn test_transaction_deserialize_null_joins() {
        let json = r#"{"id": "t2", "date": "2024-03-05", "selling_price": 10, "cost_at_sale": 4, "services": null}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(tx.service.is_none());
        assert!(tx.client.is_none());
        assert!(tx.client_id.is_none());
    }

    #[test]
    fn test_parse_sale_date_timestamp() {
        let date = parse_sale_date("2024-07-31T22:15:00+00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 7, 31).unwrap());
    }

    #[test]
    fn test_parse_sale_date_invalid() {
        assert!(parse_sale_date("31/07/2024").is_err());
    }

    #[test]
    fn test_client_type_roundtrip_lowercase() {
        let client: Client =
            serde_json::from_str(r#"{"id": "c1", "name": "Bo", "type": "client"}"#).unwrap();
        assert_eq!(client.client_type, ClientType::Client);
        assert_eq!(client.client_type.as_str(), "client");
    }
}

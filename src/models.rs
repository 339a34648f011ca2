use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registry::DatasetKind;

/// Upstream column names shared by chart encodings and row decoding.
pub mod field {
    pub const BLOCKCHAIN: &str = "Blockchain";
    pub const VOLUME: &str = "Volume";
    pub const TRANSFERS: &str = "Transfers";
    pub const USERS: &str = "Users";
    pub const VOLUME_PER_DAY: &str = "Volume/Day";
    pub const TRANSFERS_PER_DAY: &str = "Transfers/Day";
    pub const USERS_PER_DAY: &str = "Users/Day";
    pub const AMOUNT_AVERAGE: &str = "AmountAverage";
    pub const AMOUNT_MEDIAN: &str = "AmountMedian";
    pub const DATE: &str = "Date";
    pub const DAY: &str = "Day";
    pub const HOUR: &str = "Hour";
    pub const BUCKET: &str = "Bucket";
    pub const WALLET: &str = "Wallet";
    pub const USER: &str = "User";
}

/// A row of any dataset. Every row belongs to exactly one chain.
pub trait ChainRow: Clone {
    const KIND: DatasetKind;

    fn blockchain(&self) -> &str;

    fn from_dataset(dataset: Dataset) -> Option<Table<Self>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Users", default, deserialize_with = "metric")]
    pub users: f64,
    #[serde(rename = "Volume/Day", default, deserialize_with = "metric")]
    pub volume_per_day: f64,
    #[serde(rename = "Transfers/Day", default, deserialize_with = "metric")]
    pub transfers_per_day: f64,
    #[serde(rename = "Users/Day", default, deserialize_with = "metric")]
    pub users_per_day: f64,
    #[serde(rename = "AmountAverage", default, deserialize_with = "metric")]
    pub amount_average: f64,
    #[serde(rename = "AmountMedian", default, deserialize_with = "metric")]
    pub amount_median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "Date", default, deserialize_with = "label")]
    pub date: String,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Users", default, deserialize_with = "metric")]
    pub users: f64,
    #[serde(rename = "AmountAverage", default, deserialize_with = "metric")]
    pub amount_average: f64,
    #[serde(rename = "AmountMedian", default, deserialize_with = "metric")]
    pub amount_median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "Day", default, deserialize_with = "label")]
    pub day: String,
    #[serde(rename = "Hour", default, deserialize_with = "label")]
    pub hour: String,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Users", default, deserialize_with = "metric")]
    pub users: f64,
    #[serde(rename = "AmountAverage", default, deserialize_with = "metric")]
    pub amount_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "Bucket", default, deserialize_with = "label")]
    pub bucket: String,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Users", default, deserialize_with = "metric")]
    pub users: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferringUserRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "User", default, deserialize_with = "label")]
    pub user: String,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTypeRow {
    #[serde(rename = "Blockchain", deserialize_with = "label")]
    pub blockchain: String,
    #[serde(rename = "Wallet", default, deserialize_with = "label")]
    pub wallet: String,
    #[serde(rename = "Volume", default, deserialize_with = "metric")]
    pub volume: f64,
    #[serde(rename = "Transfers", default, deserialize_with = "metric")]
    pub transfers: f64,
    #[serde(rename = "Users", default, deserialize_with = "metric")]
    pub users: f64,
}

/// Immutable, cheaply cloned snapshot of a dataset's rows.
#[derive(Debug)]
pub struct Table<R> {
    rows: Arc<Vec<R>>,
}

impl<R> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when both tables share one allocation, i.e. one came from a cache hit on the other.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<R: PartialEq> PartialEq for Table<R> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl<R> FromIterator<R> for Table<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<R: Serialize> Serialize for Table<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows.iter())
    }
}

/// One decoded dataset, tagged by kind. Serializes as the bare row array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Overview(Table<OverviewRow>),
    Daily(Table<DailyRow>),
    Heatmap(Table<HeatmapRow>),
    Distribution(Table<DistributionRow>),
    TransferringUsers(Table<TransferringUserRow>),
    WalletTypes(Table<WalletTypeRow>),
}

impl Dataset {
    /// Decode a JSON array of flat row objects according to `kind`'s schema.
    pub fn decode(kind: DatasetKind, body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DatasetKind::Overview => Self::Overview(Table::new(serde_json::from_slice(body)?)),
            DatasetKind::Daily => Self::Daily(Table::new(serde_json::from_slice(body)?)),
            DatasetKind::Heatmap => Self::Heatmap(Table::new(serde_json::from_slice(body)?)),
            DatasetKind::Distribution => {
                Self::Distribution(Table::new(serde_json::from_slice(body)?))
            }
            DatasetKind::TransferringUsers => {
                Self::TransferringUsers(Table::new(serde_json::from_slice(body)?))
            }
            DatasetKind::WalletTypes => {
                Self::WalletTypes(Table::new(serde_json::from_slice(body)?))
            }
        })
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Overview(_) => DatasetKind::Overview,
            Self::Daily(_) => DatasetKind::Daily,
            Self::Heatmap(_) => DatasetKind::Heatmap,
            Self::Distribution(_) => DatasetKind::Distribution,
            Self::TransferringUsers(_) => DatasetKind::TransferringUsers,
            Self::WalletTypes(_) => DatasetKind::WalletTypes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Overview(t) => t.len(),
            Self::Daily(t) => t.len(),
            Self::Heatmap(t) => t.len(),
            Self::Distribution(t) => t.len(),
            Self::TransferringUsers(t) => t.len(),
            Self::WalletTypes(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! chain_row {
    ($row:ty, $kind:ident, $variant:ident) => {
        impl ChainRow for $row {
            const KIND: DatasetKind = DatasetKind::$kind;

            fn blockchain(&self) -> &str {
                &self.blockchain
            }

            fn from_dataset(dataset: Dataset) -> Option<Table<Self>> {
                match dataset {
                    Dataset::$variant(table) => Some(table),
                    _ => None,
                }
            }
        }

        impl From<Table<$row>> for Dataset {
            fn from(table: Table<$row>) -> Self {
                Dataset::$variant(table)
            }
        }
    };
}

chain_row!(OverviewRow, Overview, Overview);
chain_row!(DailyRow, Daily, Daily);
chain_row!(HeatmapRow, Heatmap, Heatmap);
chain_row!(DistributionRow, Distribution, Distribution);
chain_row!(TransferringUserRow, TransferringUsers, TransferringUsers);
chain_row!(WalletTypeRow, WalletTypes, WalletTypes);

/// Labels arrive as strings or as bare numbers (hours, some dates).
fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Bool(b) => b.to_string(),
    })
}

/// Metrics are numbers; `null` reads as zero and numeric strings are accepted.
fn metric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Ok(n),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric metric {s:?}"))),
        None => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_overview_reads_renamed_columns() {
        let body = br#"[{"Blockchain":"Ethereum","Volume":1500.5,"Transfers":10,"Users":4,
            "Volume/Day":50.2,"Transfers/Day":1.5,"Users/Day":0.7,
            "AmountAverage":150.05,"AmountMedian":20}]"#;

        let Dataset::Overview(table) = Dataset::decode(DatasetKind::Overview, body).unwrap()
        else {
            panic!("wrong variant");
        };
        let row = &table.rows()[0];
        assert_eq!(row.blockchain, "Ethereum");
        assert_eq!(row.volume_per_day, 50.2);
        assert_eq!(row.transfers, 10.0);
        assert_eq!(row.amount_median, 20.0);
    }

    #[test]
    fn numeric_labels_are_normalized_to_strings() {
        let body = br#"[{"Blockchain":"Polygon","Day":"1 - Monday","Hour":13,"Volume":1}]"#;
        let Dataset::Heatmap(table) = Dataset::decode(DatasetKind::Heatmap, body).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(table.rows()[0].hour, "13");
        assert_eq!(table.rows()[0].transfers, 0.0);
    }

    #[test]
    fn null_and_string_metrics_are_tolerated() {
        let body = br#"[{"Blockchain":"Avalanche","Wallet":"EOA","Volume":null,"Transfers":"12","Users":3}]"#;
        let Dataset::WalletTypes(table) = Dataset::decode(DatasetKind::WalletTypes, body).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(table.rows()[0].volume, 0.0);
        assert_eq!(table.rows()[0].transfers, 12.0);
    }

    #[test]
    fn row_without_blockchain_fails_the_dataset() {
        let body = br#"[{"Blockchain":"Ethereum","Bucket":"<100"},{"Bucket":"100-1k"}]"#;
        assert!(Dataset::decode(DatasetKind::Distribution, body).is_err());
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let body = br#"{"error":"query not found"}"#;
        assert!(Dataset::decode(DatasetKind::Daily, body).is_err());
    }

    #[test]
    fn dataset_serializes_as_row_array() {
        let table = Table::new(vec![TransferringUserRow {
            blockchain: "Solana".into(),
            user: "abc".into(),
            transfers: 3.0,
            volume: 9.5,
        }]);
        let json = serde_json::to_value(Dataset::from(table)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"Blockchain":"Solana","User":"abc","Transfers":3.0,"Volume":9.5}])
        );
    }

    #[test]
    fn cloned_table_shares_rows() {
        let table: Table<DailyRow> = Table::new(Vec::new());
        let copy = table.clone();
        assert!(table.ptr_eq(&copy));
        assert!(!table.ptr_eq(&Table::new(Vec::new())));
    }
}

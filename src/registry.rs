use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no such dataset: {0:?}")]
    UnknownDataset(String),
    #[error("no such data category: {0:?}")]
    UnknownCategory(String),
    #[error("query api base url {0} cannot carry a path")]
    InvalidBase(String),
}

/// Group of dashboards the datasets belong to. Only transfers are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Transfers,
}

impl FromStr for Category {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Transfers" => Ok(Self::Transfers),
            other => Err(RegistryError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DatasetKind {
    Overview,
    Daily,
    Heatmap,
    Distribution,
    #[serde(rename = "Transferring Users")]
    TransferringUsers,
    #[serde(rename = "Wallet Types")]
    WalletTypes,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        Self::Overview,
        Self::Daily,
        Self::Heatmap,
        Self::Distribution,
        Self::TransferringUsers,
        Self::WalletTypes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Daily => "Daily",
            Self::Heatmap => "Heatmap",
            Self::Distribution => "Distribution",
            Self::TransferringUsers => "Transferring Users",
            Self::WalletTypes => "Wallet Types",
        }
    }

    /// Saved query whose latest results back this dataset.
    fn query_id(self) -> &'static str {
        match self {
            Self::Overview => "41eb418f-d231-4a1f-a1c8-e7cc0ff2fddb",
            Self::Daily => "76276234-81ba-44fd-8341-7cde62d30abc",
            Self::Heatmap => "933b930f-b611-469e-9e03-b0d5c5b0242b",
            Self::Distribution => "a17c8548-2834-4600-bc78-a0efb6d12de4",
            Self::TransferringUsers => "2f9e94d0-79b9-49a5-be9a-eb289e9890d4",
            Self::WalletTypes => "cc07b022-fd08-459f-a9a3-cf8082221414",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| RegistryError::UnknownDataset(wanted.to_string()))
    }
}

/// Maps every (category, kind) pair to the URL serving its latest query results.
#[derive(Debug, Clone)]
pub struct Registry {
    transfers: [Url; 6],
}

impl Registry {
    pub fn new(base: &Url) -> Result<Self, RegistryError> {
        let mut targets = Vec::with_capacity(DatasetKind::ALL.len());
        for kind in DatasetKind::ALL {
            let mut url = base.clone();
            url.path_segments_mut()
                .map_err(|_| RegistryError::InvalidBase(base.to_string()))?
                .pop_if_empty()
                .extend(["api", "v2", "queries", kind.query_id(), "data", "latest"]);
            targets.push(url);
        }
        let transfers = targets
            .try_into()
            .map_err(|_| RegistryError::InvalidBase(base.to_string()))?;
        Ok(Self { transfers })
    }

    pub fn resolve(&self, category: Category, kind: DatasetKind) -> &Url {
        match category {
            Category::Transfers => &self.transfers[kind.index()],
        }
    }

    /// String-keyed lookup for callers outside the type system (CLI arguments).
    pub fn resolve_named(&self, category: &str, kind: &str) -> Result<&Url, RegistryError> {
        let category = category.parse()?;
        let kind = kind.parse()?;
        Ok(self.resolve(category, kind))
    }
}

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ChainRow, DistributionRow, OverviewRow, Table};

/// Chains picked by the user, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    chains: Vec<String>,
}

/// How many chains are selected; drives the page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality<'a> {
    Empty,
    Single(&'a str),
    Multi,
}

impl Selection {
    /// Duplicates and blank names are dropped; first occurrence wins.
    pub fn new<I, S>(chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let chains = chains
            .into_iter()
            .map(Into::into)
            .map(|chain: String| chain.trim().to_string())
            .filter(|chain| !chain.is_empty() && seen.insert(chain.clone()))
            .collect();
        Self { chains }
    }

    /// Every chain present in the overview, which is the page's default selection.
    pub fn all(overview: &Table<OverviewRow>) -> Self {
        Self::new(available_chains(overview))
    }

    /// Reads repeated `chains` parameters from a URL query string, one chain per value.
    /// Returns `None` when the parameter is absent; `chains=` alone selects nothing.
    pub fn from_query(query: &str) -> Option<Self> {
        let values: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| *key == "chains")
            .map(|(_, value)| value.into_owned())
            .collect();
        (!values.is_empty()).then(|| Self::new(values))
    }

    pub fn chains(&self) -> &[String] {
        &self.chains
    }

    pub fn contains(&self, chain: &str) -> bool {
        self.chains.iter().any(|c| c == chain)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn cardinality(&self) -> Cardinality<'_> {
        match self.chains.as_slice() {
            [] => Cardinality::Empty,
            [only] => Cardinality::Single(only),
            _ => Cardinality::Multi,
        }
    }
}

/// Distinct chain names of the overview, in source order.
pub fn available_chains(overview: &Table<OverviewRow>) -> Vec<String> {
    let mut seen = HashSet::new();
    overview
        .rows()
        .iter()
        .filter(|row| seen.insert(row.blockchain.as_str()))
        .map(|row| row.blockchain.clone())
        .collect()
}

/// Rows whose chain is selected, in source order.
pub fn filter<R: ChainRow>(table: &Table<R>, selection: &Selection) -> Table<R> {
    if selection.is_empty() {
        return Table::new(Vec::new());
    }
    table
        .rows()
        .iter()
        .filter(|row| selection.contains(row.blockchain()))
        .cloned()
        .collect()
}

/// Selected distribution rows ordered by chain, then by bucket size, so stacked charts see
/// every chain's buckets in the same order.
pub fn filter_distribution(
    table: &Table<DistributionRow>,
    selection: &Selection,
) -> Table<DistributionRow> {
    let mut rows = filter(table, selection).rows().to_vec();
    rows.sort_by(|a, b| {
        a.blockchain
            .cmp(&b.blockchain)
            .then_with(|| compare_buckets(&a.bucket, &b.bucket))
    });
    Table::new(rows)
}

/// Distinct buckets across all chains, smallest amount first.
pub fn bucket_order(rows: &[DistributionRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut buckets: Vec<String> = rows
        .iter()
        .filter(|row| seen.insert(row.bucket.as_str()))
        .map(|row| row.bucket.clone())
        .collect();
    buckets.sort_by(|a, b| compare_buckets(a, b));
    buckets
}

/// Orders amount buckets by their lower bound: `<100` < `100-1k` < `1k-10k` < `>1M`.
/// Labels without a number go last, alphabetically.
pub fn compare_buckets(a: &str, b: &str) -> Ordering {
    match (bucket_lower_bound(a), bucket_lower_bound(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn bucket_lower_bound(label: &str) -> Option<f64> {
    let label = label.trim();
    let first = leading_amount(label)?;
    let upper_only = label.starts_with('<')
        || label.to_ascii_lowercase().starts_with("under")
        || label.to_ascii_lowercase().starts_with("less");
    Some(if upper_only { 0.0 } else { first })
}

/// First number in the label, honoring `k`/`m`/`b` suffixes and ignoring `$` and `,`.
fn leading_amount(label: &str) -> Option<f64> {
    let cleaned: String = label.chars().filter(|c| *c != ',' && *c != '$').collect();
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let tail = &cleaned[start..];
    let end = tail
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(tail.len());
    let value: f64 = tail[..end].parse().ok()?;
    let scale = match tail[end..].chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('k') => 1e3,
        Some('m') => 1e6,
        Some('b') => 1e9,
        _ => 1.0,
    };
    Some(value * scale)
}

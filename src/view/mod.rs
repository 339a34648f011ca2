//! Turns a chain selection plus the loaded datasets into a list of chart specifications.
//!
//! Everything here is pure: the same selection over the same datasets always yields an
//! equal [`ViewSpec`].

pub mod chart;

use serde::Serialize;

use crate::filter::{bucket_order, filter, filter_distribution, Cardinality, Selection};
use crate::models::{
    field, ChainRow, DailyRow, Dataset, DistributionRow, HeatmapRow, OverviewRow, Table,
    TransferringUserRow, WalletTypeRow,
};
use crate::registry::DatasetKind;

pub use chart::{Axes, CategoryOrder, ChartKind, ChartSpec, Encoding};

pub const EMPTY_SELECTION_WARNING: &str =
    "Please select at least one blockchain to see the metrics.";

/// A dataset that could not be fetched or decoded for this render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    pub dataset: DatasetKind,
    pub reason: String,
}

impl Unavailable {
    pub fn notice(&self) -> String {
        format!("{} data is unavailable right now: {}", self.dataset, self.reason)
    }
}

pub type Loaded<R> = Result<Table<R>, Unavailable>;

/// One snapshot of all six datasets, as loaded for a single render.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub overview: Loaded<OverviewRow>,
    pub daily: Loaded<DailyRow>,
    pub heatmap: Loaded<HeatmapRow>,
    pub distribution: Loaded<DistributionRow>,
    pub transferring_users: Loaded<TransferringUserRow>,
    pub wallet_types: Loaded<WalletTypeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewSpec {
    /// The overview could not be loaded, so not even the chain list is known.
    Unavailable { notice: String },
    Empty { warning: String },
    Single { chain: String, sections: Vec<Section> },
    Multi { chains: Vec<String>, tabs: Vec<Tab> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tab {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Headline number shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

impl Section {
    fn charts(title: &str, charts: Vec<ChartSpec>) -> Self {
        Self {
            title: title.to_string(),
            metrics: Vec::new(),
            charts,
            notice: None,
        }
    }

    fn notice(title: &str, notice: String) -> Self {
        Self {
            title: title.to_string(),
            metrics: Vec::new(),
            charts: Vec::new(),
            notice: Some(notice),
        }
    }

    fn from_loaded<R>(
        title: &str,
        data: &Loaded<R>,
        build: impl FnOnce(&Table<R>) -> Vec<ChartSpec>,
    ) -> Self {
        match data {
            Ok(table) => Self::charts(title, build(table)),
            Err(unavailable) => Self::notice(title, unavailable.notice()),
        }
    }
}

/// Datasets narrowed to the selection. Distribution is additionally sorted.
struct Filtered {
    overview: Table<OverviewRow>,
    daily: Loaded<DailyRow>,
    heatmap: Loaded<HeatmapRow>,
    distribution: Loaded<DistributionRow>,
    transferring_users: Loaded<TransferringUserRow>,
    wallet_types: Loaded<WalletTypeRow>,
}

fn narrow<R: ChainRow>(data: &Loaded<R>, selection: &Selection) -> Loaded<R> {
    data.as_ref()
        .map(|table| filter(table, selection))
        .map_err(Clone::clone)
}

pub fn render(selection: &Selection, datasets: &Datasets) -> ViewSpec {
    let overview = match &datasets.overview {
        Ok(table) => table,
        Err(unavailable) => {
            return ViewSpec::Unavailable {
                notice: unavailable.notice(),
            }
        }
    };

    let data = Filtered {
        overview: filter(overview, selection),
        daily: narrow(&datasets.daily, selection),
        heatmap: narrow(&datasets.heatmap, selection),
        distribution: datasets
            .distribution
            .as_ref()
            .map(|table| filter_distribution(table, selection))
            .map_err(Clone::clone),
        transferring_users: narrow(&datasets.transferring_users, selection),
        wallet_types: narrow(&datasets.wallet_types, selection),
    };

    match selection.cardinality() {
        Cardinality::Empty => ViewSpec::Empty {
            warning: EMPTY_SELECTION_WARNING.to_string(),
        },
        Cardinality::Single(chain) => ViewSpec::Single {
            chain: chain.to_string(),
            sections: single_chain(chain, &data),
        },
        Cardinality::Multi => ViewSpec::Multi {
            chains: selection.chains().to_vec(),
            tabs: cross_chain(selection, &data),
        },
    }
}

fn single_chain(chain: &str, data: &Filtered) -> Vec<Section> {
    vec![
        headline(chain, &data.overview),
        Section::from_loaded("Distribution", &data.distribution, |df| {
            [
                (field::VOLUME, "Share of Total Transferred Volume"),
                (field::TRANSFERS, "Share of Total Transfers"),
                (field::USERS, "Share of Total Transferring Users"),
            ]
            .into_iter()
            .map(|(metric, title)| ChartSpec::pie(title, df.clone(), metric, field::BUCKET))
            .collect()
        }),
        Section::from_loaded("Activity Over Time", &data.daily, |df| {
            vec![
                ChartSpec::area("Daily Transferred Volume", df.clone(), field::DATE, field::VOLUME),
                ChartSpec::bar_line(
                    "Daily Transfers and Transferring Users",
                    df.clone(),
                    field::DATE,
                    field::TRANSFERS,
                    field::USERS,
                ),
                ChartSpec::bar_line(
                    "Daily Average and Median Transferred Amount",
                    df.clone(),
                    field::DATE,
                    field::AMOUNT_AVERAGE,
                    field::AMOUNT_MEDIAN,
                ),
            ]
        }),
        Section::from_loaded("Activity Heatmap", &data.heatmap, |df| {
            [
                (field::VOLUME, "Heatmap of Transferred Volume"),
                (field::TRANSFERS, "Heatmap of Transfers"),
                (field::USERS, "Heatmap of Transferring Users"),
                (field::AMOUNT_AVERAGE, "Heatmap of Average Transferred Amount"),
            ]
            .into_iter()
            .map(|(metric, title)| {
                ChartSpec::scatter(title, df.clone(), field::HOUR, field::DAY)
                    .sized_by(metric)
                    .colored_by(metric)
            })
            .collect()
        }),
        Section::from_loaded(
            "Wallet Types of Transferring Users",
            &data.wallet_types,
            |df| {
                [
                    (
                        field::VOLUME,
                        "Total Transferred Volume of Each Wallet Type",
                        "Share of Total Transferred Volume of Each Wallet Type",
                    ),
                    (
                        field::TRANSFERS,
                        "Total Transfers of Each Wallet Type",
                        "Share of Total Transfers of Each Wallet Type",
                    ),
                    (
                        field::USERS,
                        "Total Transferring Users of Each Wallet Type",
                        "Share of Total Transferring Users of Each Wallet Type",
                    ),
                ]
                .into_iter()
                .flat_map(|(metric, total, share)| {
                    [
                        ranking(total, df.clone(), field::WALLET, metric),
                        ChartSpec::pie(share, df.clone(), metric, field::WALLET),
                    ]
                })
                .collect()
            },
        ),
        Section::from_loaded("Top Transferring Users", &data.transferring_users, |df| {
            vec![
                ranking(
                    "Total Transfers By Top Transferring Users",
                    df.clone(),
                    field::USER,
                    field::TRANSFERS,
                ),
                ranking(
                    "Total Transferred Volume By Top Transferring Users",
                    df.clone(),
                    field::USER,
                    field::VOLUME,
                ),
            ]
        }),
    ]
}

/// Bar per category, colored by itself, smallest first.
fn ranking<R>(title: &str, df: Table<R>, category: &'static str, metric: &'static str) -> ChartSpec
where
    Table<R>: Into<Dataset>,
{
    ChartSpec::bar(title, df, category, metric)
        .colored_by(category)
        .categorical_x()
        .ordered(CategoryOrder::TotalAscending)
        .without_legend()
}

fn headline(chain: &str, overview: &Table<OverviewRow>) -> Section {
    const TITLE: &str = "Overview";
    let Some(row) = overview.rows().first() else {
        return Section::notice(TITLE, format!("No overview metrics reported for {chain}."));
    };

    let usd = Some("USD");
    let metric = |label, value, help| Metric { label, value, help };
    Section {
        title: TITLE.to_string(),
        metrics: vec![
            metric("Volume", row.volume.round(), usd),
            metric("Volume/Day", row.volume_per_day.round(), usd),
            metric("Transfers", row.transfers, None),
            metric("Transfers/Day", row.transfers_per_day.round(), None),
            metric("Users", row.users, None),
            metric("Users/Day", row.users_per_day.round(), None),
            metric("Average Amount", round2(row.amount_average), usd),
            metric("Median Amount", round2(row.amount_median), usd),
        ],
        charts: Vec::new(),
        notice: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn cross_chain(selection: &Selection, data: &Filtered) -> Vec<Tab> {
    vec![
        Tab {
            title: "Overview".to_string(),
            sections: vec![
                Section::charts("Overview", cross_chain_totals(&data.overview)),
                Section::from_loaded("Transfers Over Time", &data.daily, |df| {
                    cross_chain_daily(selection, df)
                }),
            ],
        },
        Tab {
            title: "Amounts".to_string(),
            sections: vec![cross_chain_amounts(&data.overview, &data.daily)],
        },
        Tab {
            title: "Heatmap".to_string(),
            sections: vec![Section::from_loaded(
                "Daily and Hourly Heatmap of Transfers",
                &data.heatmap,
                cross_chain_heatmap,
            )],
        },
        Tab {
            title: "Distribution".to_string(),
            sections: vec![Section::from_loaded(
                "Transferred Amount Size Distribution",
                &data.distribution,
                cross_chain_distribution,
            )],
        },
    ]
}

fn per_chain_bar(title: &str, df: &Table<OverviewRow>, metric: &'static str) -> ChartSpec {
    ChartSpec::bar(title, df.clone(), field::BLOCKCHAIN, metric)
        .colored_by(field::BLOCKCHAIN)
        .log_y()
        .without_legend()
}

fn cross_chain_totals(df: &Table<OverviewRow>) -> Vec<ChartSpec> {
    let totals = [
        (field::VOLUME, "Total Transferred Volume"),
        (field::TRANSFERS, "Total Transfers"),
        (field::USERS, "Total Transferring Users"),
    ]
    .map(|(metric, title)| {
        per_chain_bar(title, df, metric).ordered(CategoryOrder::TotalAscending)
    });
    let shares = [
        (field::VOLUME, "Share of Total Transferred Volume"),
        (field::TRANSFERS, "Share of Total Transfers"),
        (field::USERS, "Share of Total Transferring Users"),
    ]
    .map(|(metric, title)| ChartSpec::pie(title, df.clone(), metric, field::BLOCKCHAIN));
    let per_day = [
        (field::VOLUME_PER_DAY, "Average Transferred Volume/Day"),
        (field::TRANSFERS_PER_DAY, "Average Transfers/Day"),
        (field::USERS_PER_DAY, "Average Transferring Users/Day"),
    ]
    .map(|(metric, title)| {
        per_chain_bar(title, df, metric).ordered(CategoryOrder::CategoryAscending)
    });

    totals.into_iter().chain(shares).chain(per_day).collect()
}

fn cross_chain_daily(selection: &Selection, df: &Table<DailyRow>) -> Vec<ChartSpec> {
    let lines = [
        (field::VOLUME, "Daily Transferred Volume"),
        (field::TRANSFERS, "Daily Transfers"),
        (field::USERS, "Daily Transferring Users"),
    ]
    .map(|(metric, title)| {
        ChartSpec::line(title, df.clone(), field::DATE, metric)
            .colored_by(field::BLOCKCHAIN)
            .log_y()
    });
    let shares = [
        (field::VOLUME, "Daily Share of Transferred Volume"),
        (field::TRANSFERS, "Daily Share of Transfers"),
        (field::USERS, "Daily Share of Transferring Users"),
    ]
    .map(|(metric, title)| {
        ChartSpec::stacked_share(
            title,
            df.clone(),
            field::DATE,
            metric,
            field::BLOCKCHAIN,
            selection.chains().to_vec(),
        )
    });

    lines.into_iter().chain(shares).collect()
}

fn cross_chain_amounts(overview: &Table<OverviewRow>, daily: &Loaded<DailyRow>) -> Section {
    const TITLE: &str = "Transferred Amount";
    let mut charts = vec![
        per_chain_bar("Average Transferred Amount", overview, field::AMOUNT_AVERAGE)
            .ordered(CategoryOrder::CategoryAscending),
        per_chain_bar("Median Transferred Amount", overview, field::AMOUNT_MEDIAN)
            .ordered(CategoryOrder::CategoryAscending),
    ];
    match daily {
        Ok(df) => {
            charts.extend(
                [
                    (field::AMOUNT_AVERAGE, "Daily Average Transferred Amount"),
                    (field::AMOUNT_MEDIAN, "Daily Median Transferred Amount"),
                ]
                .map(|(metric, title)| {
                    ChartSpec::line(title, df.clone(), field::DATE, metric)
                        .colored_by(field::BLOCKCHAIN)
                }),
            );
            Section::charts(TITLE, charts)
        }
        Err(unavailable) => Section {
            notice: Some(unavailable.notice()),
            ..Section::charts(TITLE, charts)
        },
    }
}

fn cross_chain_heatmap(df: &Table<HeatmapRow>) -> Vec<ChartSpec> {
    let metrics = [
        (field::VOLUME, "Transferred Volume"),
        (field::TRANSFERS, "Transfers"),
        (field::USERS, "Transferring Users"),
        (field::AMOUNT_AVERAGE, "Average Transferred Amount"),
    ];
    [(field::DAY, "Daily"), (field::HOUR, "Hourly")]
        .into_iter()
        .flat_map(|(axis, period)| {
            metrics.map(|(metric, name)| {
                ChartSpec::scatter(format!("{period} Heatmap of {name}"), df.clone(), metric, axis)
                    .colored_by(field::BLOCKCHAIN)
                    .log_x()
            })
        })
        .collect()
}

fn cross_chain_distribution(df: &Table<DistributionRow>) -> Vec<ChartSpec> {
    let buckets = bucket_order(df.rows());
    let stacks = [
        (field::VOLUME, "Total Transferred Volume of Each Group"),
        (field::TRANSFERS, "Total Transfers of Each Group"),
        (field::USERS, "Total Transferring Users of Each Group"),
    ]
    .map(|(metric, title)| {
        ChartSpec::bar(title, df.clone(), field::BLOCKCHAIN, metric)
            .colored_by(field::BUCKET)
            .ordered(CategoryOrder::CategoryAscending)
    });
    let shares = [
        (field::VOLUME, "Share of Total Transferred Volume of Each Group"),
        (field::TRANSFERS, "Share of Total Transfers of Each Group"),
        (field::USERS, "Share of Total Transferring Users of Each Group"),
    ]
    .map(|(metric, title)| {
        ChartSpec::stacked_share(
            title,
            df.clone(),
            field::BLOCKCHAIN,
            metric,
            field::BUCKET,
            buckets.clone(),
        )
    });

    stacks.into_iter().chain(shares).collect()
}

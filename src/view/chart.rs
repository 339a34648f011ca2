use serde::Serialize;

use crate::models::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
    Area,
    Scatter,
    StackedArea,
    /// Bars on the primary y axis with a line on a secondary y axis.
    BarLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    TotalAscending,
    CategoryAscending,
}

/// Which data fields drive which visual channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_y: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<&'static str>,
    /// Field splitting a stacked chart into series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'static str>,
    /// Series order for `group`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axes {
    pub log_x: bool,
    pub log_y: bool,
    pub categorical_x: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_order: Option<CategoryOrder>,
    /// Stack normalized so each x position sums to 100%.
    pub percent: bool,
    pub axis_titles: bool,
}

/// Everything an external renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub data: Dataset,
    pub encoding: Encoding,
    pub axes: Axes,
    pub show_legend: bool,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: impl Into<String>, data: impl Into<Dataset>) -> Self {
        Self {
            kind,
            title: title.into(),
            data: data.into(),
            encoding: Encoding::default(),
            axes: Axes::default(),
            show_legend: true,
        }
    }

    pub fn bar(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        y: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::Bar, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(y);
        spec
    }

    /// Share of `values` per distinct `names`, labelled with percent and name.
    pub fn pie(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        values: &'static str,
        names: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::Pie, title, data);
        spec.encoding.values = Some(values);
        spec.encoding.names = Some(names);
        spec.show_legend = false;
        spec
    }

    pub fn line(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        y: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::Line, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(y);
        spec
    }

    pub fn area(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        y: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::Area, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(y);
        spec
    }

    pub fn scatter(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        y: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::Scatter, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(y);
        spec
    }

    /// 100%-normalized stacked area with one series per `group` value, in `groups` order.
    pub fn stacked_share(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        y: &'static str,
        group: &'static str,
        groups: Vec<String>,
    ) -> Self {
        let mut spec = Self::new(ChartKind::StackedArea, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(y);
        spec.encoding.group = Some(group);
        spec.encoding.groups = groups;
        spec.axes.percent = true;
        spec
    }

    pub fn bar_line(
        title: impl Into<String>,
        data: impl Into<Dataset>,
        x: &'static str,
        bar: &'static str,
        line: &'static str,
    ) -> Self {
        let mut spec = Self::new(ChartKind::BarLine, title, data);
        spec.encoding.x = Some(x);
        spec.encoding.y = Some(bar);
        spec.encoding.secondary_y = Some(line);
        spec.axes.axis_titles = true;
        spec
    }

    pub fn colored_by(mut self, field: &'static str) -> Self {
        self.encoding.color = Some(field);
        self
    }

    pub fn sized_by(mut self, field: &'static str) -> Self {
        self.encoding.size = Some(field);
        self
    }

    pub fn log_x(mut self) -> Self {
        self.axes.log_x = true;
        self
    }

    pub fn log_y(mut self) -> Self {
        self.axes.log_y = true;
        self
    }

    pub fn ordered(mut self, order: CategoryOrder) -> Self {
        self.axes.category_order = Some(order);
        self
    }

    pub fn categorical_x(mut self) -> Self {
        self.axes.categorical_x = true;
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }
}

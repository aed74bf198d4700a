//! ECharts configuration for the dashboard and the income and expense pages.
//!
//! Each chart is built with [charming] and serialized to a JSON options object
//! that a small script hands to `echarts.init` once the page has loaded.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Orient, Tooltip, Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::prelude::ToPrimitive;

use crate::{aggregation::Bucket, html::HeadElement};

/// The ECharts bundle served from the static directory.
const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// A chart's container ID and its serialized ECharts options.
pub struct PageChart {
    /// Kebab-case ID of the `div` the chart is drawn in.
    pub id: &'static str,
    /// The options object as JSON.
    pub options: String,
}

impl PageChart {
    pub fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string(),
        }
    }
}

pub fn chart_container(chart: &PageChart) -> Markup {
    html! {
        div id=(chart.id) class="w-full min-h-[380px] rounded dark:bg-gray-100" {}
    }
}

/// Draws a chart into the element `id`, resizes it with the window and
/// follows the system colour scheme.
const INIT_CHART_JS: &str = "function initChart(id, option) {
    const chart = echarts.init(document.getElementById(id));
    chart.setOption(option);
    window.addEventListener('resize', () => chart.resize());

    const darkMode = window.matchMedia('(prefers-color-scheme: dark)');
    const applyTheme = () => chart.setTheme(darkMode.matches ? 'dark' : 'default');
    darkMode.addEventListener('change', applyTheme);
    applyTheme();
}";

/// The head elements that load ECharts and draw `charts` once the page has loaded.
pub fn charts_scripts(charts: &[PageChart]) -> [HeadElement; 2] {
    let calls: String = charts
        .iter()
        .map(|chart| format!("    initChart({:?}, {});\n", chart.id, chart.options))
        .collect();

    let script = format!(
        "{INIT_CHART_JS}\ndocument.addEventListener('DOMContentLoaded', () => {{\n{calls}}});"
    );

    [
        HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned()),
        HeadElement::ScriptSource(PreEscaped(script)),
    ]
}

/// A bar chart with one bar per bucket, e.g. the total spent on each day.
pub fn bar_chart(title: &str, subtitle: &str, series_name: &str, buckets: &[Bucket]) -> Chart {
    let (labels, values) = labels_and_values(buckets);

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name(series_name).data(values))
}

/// A donut chart with one slice per bucket.
pub fn donut_chart(title: &str, subtitle: &str, series_name: &str, buckets: &[Bucket]) -> Chart {
    let data = buckets
        .iter()
        .map(|bucket| (bucket.total.to_f64().unwrap_or_default(), bucket.label.as_str()))
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().orient(Orient::Vertical).left("left").top("middle"))
        .series(
            Pie::new()
                .name(series_name)
                .radius(vec!["40%", "70%"])
                .data(data),
        )
}

fn labels_and_values(buckets: &[Bucket]) -> (Vec<String>, Vec<f64>) {
    buckets
        .iter()
        .map(|bucket| {
            (
                bucket.label.clone(),
                bucket.total.to_f64().unwrap_or_default(),
            )
        })
        .unzip()
}

/// Formats axis labels and tooltip values as dollars, with "-" for zero.
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "return number
            ? new Intl.NumberFormat('en-US', { style: 'currency', currency: 'USD' }).format(number)
            : '-';",
    )
}

/// Axis tooltip that shades the hovered category and shows values as dollars.
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

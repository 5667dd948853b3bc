//! Pure projections from a [`DashboardSnapshot`] into the shapes the table and
//! chart views render. Nothing here reorders data: rows and series come out in
//! snapshot order.

use crate::models::{DashboardSnapshot, FetchState};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteColor {
    pub fill: &'static str,
    pub border: &'static str,
}

/// Category slices take `CATEGORY_PALETTE[i % len]`; extra categories wrap.
pub const CATEGORY_PALETTE: [PaletteColor; 5] = [
    PaletteColor {
        fill: "rgba(255, 99, 132, 0.7)",
        border: "rgba(255, 99, 132, 1)",
    },
    PaletteColor {
        fill: "rgba(54, 162, 235, 0.7)",
        border: "rgba(54, 162, 235, 1)",
    },
    PaletteColor {
        fill: "rgba(255, 206, 86, 0.7)",
        border: "rgba(255, 206, 86, 1)",
    },
    PaletteColor {
        fill: "rgba(75, 192, 192, 0.7)",
        border: "rgba(75, 192, 192, 1)",
    },
    PaletteColor {
        fill: "rgba(153, 102, 255, 0.7)",
        border: "rgba(153, 102, 255, 1)",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub segment: String,
    pub total: f64,
    pub total_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub name: String,
    pub segment: String,
    pub city: String,
    pub state: String,
    pub total: f64,
    pub total_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub total: f64,
    pub total_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRows {
    pub customers: Vec<CustomerRow>,
    pub products: Vec<ProductRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatePoint {
    pub label: String,
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub label: String,
    pub value: f64,
    pub color_index: usize,
    pub color: PaletteColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub sales_by_date: Vec<DatePoint>,
    pub sales_by_category: Vec<CategorySlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub total_sales: f64,
    pub total_sales_label: String,
    pub segments: Vec<SegmentRow>,
    pub tables: TableRows,
    pub charts: ChartSeries,
}

pub fn project(snapshot: &DashboardSnapshot) -> DashboardView {
    let segments = snapshot
        .sales_by_segment
        .iter()
        .map(|item| SegmentRow {
            segment: item.segment.clone(),
            total: item.total,
            total_label: format_currency(item.total),
        })
        .collect();

    let customers = snapshot
        .top_customers
        .iter()
        .map(|customer| CustomerRow {
            name: customer.name.clone(),
            segment: customer.segment.clone(),
            city: customer.city.clone(),
            state: customer.state.clone(),
            total: customer.total,
            total_label: format_currency(customer.total),
        })
        .collect();

    let products = snapshot
        .top_products
        .iter()
        .map(|product| ProductRow {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            total: product.total,
            total_label: format_currency(product.total),
        })
        .collect();

    let sales_by_date = snapshot
        .sales_by_date
        .iter()
        .map(|point| DatePoint {
            label: date_label(point.date),
            date: point.date,
            value: point.total,
        })
        .collect();

    let sales_by_category = snapshot
        .sales_by_category
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let color_index = position % CATEGORY_PALETTE.len();
            CategorySlice {
                label: item.category.clone(),
                value: item.total,
                color_index,
                color: CATEGORY_PALETTE[color_index],
            }
        })
        .collect();

    DashboardView {
        total_sales: snapshot.total_sales,
        total_sales_label: format_currency(snapshot.total_sales),
        segments,
        tables: TableRows {
            customers,
            products,
        },
        charts: ChartSeries {
            sales_by_date,
            sales_by_category,
        },
    }
}

impl FetchState {
    /// Only a `Ready` snapshot projects; loading and failure show no data.
    pub fn view(&self) -> Option<DashboardView> {
        self.snapshot().map(project)
    }
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `$1,234.56`; negatives render as `-$1,234.56`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTotal, CustomerTotal, DateTotal, ProductSummary, SegmentTotal};

    fn sample() -> DashboardSnapshot {
        DashboardSnapshot {
            total_sales: 2297200.8603,
            sales_by_segment: vec![
                SegmentTotal {
                    segment: "Consumer".to_string(),
                    total: 1161401.3451,
                },
                SegmentTotal {
                    segment: "Corporate".to_string(),
                    total: 706146.3668,
                },
            ],
            sales_by_date: vec![
                DateTotal {
                    date: NaiveDate::from_ymd_opt(2017, 1, 3).unwrap(),
                    total: 16.448,
                },
                DateTotal {
                    date: NaiveDate::from_ymd_opt(2016, 12, 30).unwrap(),
                    total: 713.79,
                },
            ],
            top_customers: vec![
                CustomerTotal {
                    name: "Tom Ashbrook".to_string(),
                    segment: "Home Office".to_string(),
                    city: "New York City".to_string(),
                    state: "New York".to_string(),
                    total: 14595.62,
                },
                CustomerTotal {
                    name: "Sean Miller".to_string(),
                    segment: "Home Office".to_string(),
                    city: "Jacksonville".to_string(),
                    state: "Florida".to_string(),
                    total: 25043.05,
                },
            ],
            top_products: vec![ProductSummary {
                id: "TEC-CO-10004722".to_string(),
                name: "Canon imageCLASS 2200".to_string(),
                category: "Technology".to_string(),
                subcategory: "Copiers".to_string(),
                total: 61599.824,
            }],
            sales_by_category: (0..7)
                .map(|i| CategoryTotal {
                    category: format!("category-{i}"),
                    total: 100.0 * f64::from(i),
                })
                .collect(),
        }
    }

    #[test]
    fn projection_is_deterministic() {
        let snapshot = sample();
        assert_eq!(project(&snapshot), project(&snapshot.clone()));
    }

    #[test]
    fn rows_keep_snapshot_order() {
        let view = project(&sample());
        let names: Vec<&str> = view.tables.customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Tom Ashbrook", "Sean Miller"]);
        assert_eq!(view.tables.customers[1].total_label, "$25,043.05");
        assert_eq!(view.tables.products[0].total_label, "$61,599.82");
        assert_eq!(view.segments[0].total_label, "$1,161,401.35");
    }

    #[test]
    fn date_series_is_labelled_and_not_resorted() {
        let view = project(&sample());
        let labels: Vec<&str> = view
            .charts
            .sales_by_date
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, ["03/01/2017", "30/12/2016"]);
        assert_eq!(view.charts.sales_by_date[1].value, 713.79);
    }

    #[test]
    fn palette_wraps_by_position() {
        let view = project(&sample());
        let slices = &view.charts.sales_by_category;
        assert_eq!(slices.len(), 7);
        for (i, slice) in slices.iter().enumerate() {
            assert_eq!(slice.color_index, i % 5);
            assert_eq!(slice.color, CATEGORY_PALETTE[i % 5]);
            assert_eq!(slice.label, format!("category-{i}"));
        }
        assert_eq!(slices[5].color, slices[0].color);
    }

    #[test]
    fn empty_snapshot_projects_to_empty_view() {
        let view = project(&DashboardSnapshot::default());
        assert_eq!(view.total_sales, 0.0);
        assert_eq!(view.total_sales_label, "$0.00");
        assert!(view.segments.is_empty());
        assert!(view.tables.customers.is_empty());
        assert!(view.tables.products.is_empty());
        assert!(view.charts.sales_by_date.is_empty());
        assert!(view.charts.sales_by_category.is_empty());
    }

    #[test]
    fn only_ready_state_has_a_view() {
        assert!(FetchState::Idle.view().is_none());
        assert!(FetchState::Loading.view().is_none());
        assert!(FetchState::Failed("Error al cargar los datos.".to_string()).view().is_none());
        assert!(FetchState::Ready(sample()).view().is_some());
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-1234.5), "-$1,234.50");
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency(100.0), "$100.00");
    }
}

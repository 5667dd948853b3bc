use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// The six user-selected constraints that parameterize the aggregate query.
///
/// `subcategory` only carries meaning while `category` is set, and `city`
/// only while `state` is set. [`crate::filters::FilterState`] keeps that true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Both dates set and the range runs backwards.
    pub fn has_inverted_range(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(start), Some(end)) if start > end)
    }
}

/// Ordered, duplicate-free labels for one filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionList(Vec<String>);

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first occurrence of each label and drops blank ones.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if label.trim().is_empty() || out.contains(&label) {
                continue;
            }
            out.push(label);
        }
        Self(out)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentTotal {
    pub segment: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateTotal {
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerTotal {
    pub name: String,
    pub segment: String,
    pub city: String,
    pub state: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// One consistent result of the aggregate query. Every field is always
/// present; absent wire fields normalize to zero or an empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub total_sales: f64,
    pub sales_by_segment: Vec<SegmentTotal>,
    pub sales_by_date: Vec<DateTotal>,
    pub top_customers: Vec<CustomerTotal>,
    pub top_products: Vec<ProductSummary>,
    pub sales_by_category: Vec<CategoryTotal>,
}

/// Lifecycle of the snapshot fetch. Starts `Idle` and never returns to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready(DashboardSnapshot),
    Failed(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// `GET /api/dashboard/stats/` body as the backend sends it.
#[derive(Debug, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_sales: f64,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub sales_by_segment: Vec<RawSegmentTotal>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub sales_by_date: Vec<RawDateTotal>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub top_customers: Vec<RawCustomer>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub top_products: Vec<RawProduct>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub sales_by_category: Vec<RawCategoryTotal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSegmentTotal {
    #[serde(rename = "customer__segment", alias = "segment", default, deserialize_with = "lenient_text")]
    pub segment: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawDateTotal {
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCustomer {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub segment: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    #[serde(rename = "Product_ID", alias = "id", default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "Product_Name", alias = "name", default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "Category", alias = "category", default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(rename = "Sub_Category", alias = "subcategory", default, deserialize_with = "lenient_text")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_sales: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCategoryTotal {
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
}

impl From<RawSnapshot> for DashboardSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        let sales_by_date = raw
            .sales_by_date
            .into_iter()
            .filter_map(|point| match parse_snapshot_date(&point.date) {
                Some(date) => Some(DateTotal {
                    date,
                    total: point.total,
                }),
                None => {
                    warn!("dropping sales_by_date point with unreadable date {:?}", point.date);
                    None
                }
            })
            .collect();

        Self {
            total_sales: raw.total_sales,
            sales_by_segment: raw
                .sales_by_segment
                .into_iter()
                .map(|item| SegmentTotal {
                    segment: item.segment,
                    total: item.total,
                })
                .collect(),
            sales_by_date,
            top_customers: raw
                .top_customers
                .into_iter()
                .map(|item| CustomerTotal {
                    name: item.name,
                    segment: item.segment,
                    city: item.city,
                    state: item.state,
                    total: item.total,
                })
                .collect(),
            top_products: raw
                .top_products
                .into_iter()
                .map(|item| ProductSummary {
                    id: item.id,
                    name: item.name,
                    category: item.category,
                    subcategory: item.subcategory,
                    total: item.total_sales,
                })
                .collect(),
            sales_by_category: raw
                .sales_by_category
                .into_iter()
                .map(|item| CategoryTotal {
                    category: item.category,
                    total: item.total,
                })
                .collect(),
        }
    }
}

/// Accepts `YYYY-MM-DD` or anything that starts with it (ISO datetimes).
pub fn parse_snapshot_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()).unwrap_or_default())
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn nullable_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_from(json: Value) -> DashboardSnapshot {
        let raw: RawSnapshot = serde_json::from_value(json).expect("decode raw snapshot");
        DashboardSnapshot::from(raw)
    }

    #[test]
    fn empty_body_normalizes_to_zeroes() {
        let snapshot = snapshot_from(serde_json::json!({}));
        assert_eq!(snapshot, DashboardSnapshot::default());
        assert_eq!(snapshot.total_sales, 0.0);
        assert!(snapshot.sales_by_segment.is_empty());
        assert!(snapshot.sales_by_date.is_empty());
        assert!(snapshot.top_customers.is_empty());
        assert!(snapshot.top_products.is_empty());
        assert!(snapshot.sales_by_category.is_empty());
    }

    #[test]
    fn nulls_normalize_like_missing_fields() {
        let snapshot = snapshot_from(serde_json::json!({
            "total_sales": null,
            "sales_by_segment": null,
            "sales_by_date": null,
            "top_customers": null,
            "top_products": null,
            "sales_by_category": null
        }));
        assert_eq!(snapshot, DashboardSnapshot::default());
    }

    #[test]
    fn backend_field_names_map_to_snapshot() {
        let snapshot = snapshot_from(serde_json::json!({
            "total_sales": "1520.75",
            "sales_by_segment": [{ "customer__segment": "Consumer", "total": 900.5 }],
            "sales_by_date": [
                { "date": "2017-01-03", "total": "16.45" },
                { "date": "2017-01-04T00:00:00", "total": 288.06 }
            ],
            "top_customers": [{
                "name": "Sean Miller", "segment": "Home Office",
                "city": "Jacksonville", "state": "Florida", "total": 25043.05
            }],
            "top_products": [{
                "Product_ID": "TEC-CO-10004722", "Category": "Technology",
                "Sub_Category": "Copiers", "Product_Name": "Canon imageCLASS",
                "total_sales": 61599.82
            }],
            "sales_by_category": [{ "category": "Furniture", "total": 741999.8 }]
        }));

        assert_eq!(snapshot.total_sales, 1520.75);
        assert_eq!(snapshot.sales_by_segment[0].segment, "Consumer");
        assert_eq!(snapshot.sales_by_date.len(), 2);
        assert_eq!(
            snapshot.sales_by_date[1].date,
            NaiveDate::from_ymd_opt(2017, 1, 4).unwrap()
        );
        assert_eq!(snapshot.sales_by_date[0].total, 16.45);
        assert_eq!(snapshot.top_customers[0].city, "Jacksonville");
        assert_eq!(snapshot.top_products[0].id, "TEC-CO-10004722");
        assert_eq!(snapshot.top_products[0].subcategory, "Copiers");
        assert_eq!(snapshot.sales_by_category[0].category, "Furniture");
    }

    #[test]
    fn unreadable_dates_are_dropped_without_failing() {
        let snapshot = snapshot_from(serde_json::json!({
            "sales_by_date": [
                { "date": "not a date", "total": 1 },
                { "date": "2017-02-01", "total": 2 }
            ]
        }));
        assert_eq!(snapshot.sales_by_date.len(), 1);
        assert_eq!(snapshot.sales_by_date[0].total, 2.0);
    }

    #[test]
    fn option_list_drops_duplicates_and_blanks() {
        let list = OptionList::from_labels(["Texas", "", "Ohio", "Texas", "  "]);
        assert_eq!(list.as_slice(), ["Texas".to_string(), "Ohio".to_string()]);
    }

    #[test]
    fn inverted_range_is_detected() {
        let criteria = FilterCriteria {
            start_date: NaiveDate::from_ymd_opt(2017, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2017, 1, 1),
            ..FilterCriteria::default()
        };
        assert!(criteria.has_inverted_range());
        assert!(!FilterCriteria::default().has_inverted_range());
    }
}

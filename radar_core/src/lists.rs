use std::collections::BTreeMap;

use radar_schema::{Category, MarketItem, Rgb};

use crate::config::RadarConfig;

/// Categories shown beside the chart, left column then right column.
pub const LEFT_COLUMN: [Category; 2] = [Category::Buyer, Category::Macro];
pub const RIGHT_COLUMN: [Category; 2] = [Category::Technology, Category::Competition];

/// One category's items as displayed next to the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryList<'a> {
    pub category: Category,
    pub label: &'a str,
    pub color: Rgb,
    /// Sorted ascending by id; the underlying store order is untouched.
    pub items: Vec<&'a MarketItem>,
}

/// List view for `category`, or `None` when it has no items.
pub fn category_list<'a>(
    groups: &'a BTreeMap<Category, Vec<MarketItem>>,
    category: Category,
    config: &'a RadarConfig,
) -> Option<CategoryList<'a>> {
    let items = groups.get(&category).filter(|items| !items.is_empty())?;
    let mut sorted: Vec<&MarketItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.id);
    let style = config.category(category);
    Some(CategoryList {
        category,
        label: &style.label,
        color: style.color,
        items: sorted,
    })
}

//! Filtering and pagination of the cached products

use crate::models::product::Product;

/// Products per page
pub const PAGE_SIZE: usize = 12;

/// Client-side product filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name
    pub search_text: String,
    /// Inclusive lower bound on stock
    pub min_stock: Option<i32>,
    /// Case-insensitive substring of the color
    pub color: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        contains_ignore_case(&product.name, &self.search_text)
            && self.min_stock.is_none_or(|min| product.stock >= min)
            && self
                .color
                .as_deref()
                .is_none_or(|color| contains_ignore_case(&product.color, color))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One page of filtered products
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Product>,
    /// 1-based, always within `1..=max(total_pages, 1)`
    pub page_index: usize,
    pub total_pages: usize,
    /// Number of products that passed the filter
    pub total_items: usize,
}

/// Filter `products` and cut out the requested page
///
/// An out-of-range `page_index` is clamped into range.
pub fn derive(products: &[Product], filter: &ProductFilter, page_index: usize) -> Page {
    let filtered: Vec<&Product> = products
        .iter()
        .filter(|product| filter.matches(product))
        .collect();

    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(PAGE_SIZE);
    let page_index = page_index.clamp(1, total_pages.max(1));

    let items = filtered
        .into_iter()
        .skip((page_index - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Page {
        items,
        page_index,
        total_pages,
        total_items,
    }
}

/// Filter and page selection of the product list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewState {
    filter: ProductFilter,
    page_index: usize,
}

impl Default for ListViewState {
    fn default() -> Self {
        Self {
            filter: ProductFilter::default(),
            page_index: 1,
        }
    }
}

impl ListViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.filter.search_text = text.into();
        self.page_index = 1;
    }

    pub fn set_min_stock(&mut self, min_stock: Option<i32>) {
        self.filter.min_stock = min_stock;
        self.page_index = 1;
    }

    /// Empty or blank text clears the color filter
    pub fn set_color(&mut self, color: Option<String>) {
        self.filter.color = color.filter(|color| !color.trim().is_empty());
        self.page_index = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filter = ProductFilter::default();
        self.page_index = 1;
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index.max(1);
    }

    pub fn next_page(&mut self) {
        self.page_index += 1;
    }

    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1).max(1);
    }

    /// Derive the current page, keeping the clamped index
    pub fn view(&mut self, products: &[Product]) -> Page {
        let page = derive(products, &self.filter, self.page_index);
        self.page_index = page.page_index;
        page
    }
}

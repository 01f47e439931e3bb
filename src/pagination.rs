use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 50;

/// Raw `?page=&limit=` query parameters.
///
/// Both are accepted as strings on purpose: anything that does not parse as a
/// positive integer silently falls back to the default instead of erroring.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl PageQuery {
    pub fn resolve(&self) -> PageParams {
        let page = parse_positive(self.page.as_deref()).unwrap_or(1).max(1);
        let limit = parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        PageParams { page, limit }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let value: u64 = raw?.trim().parse().ok()?;
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

/// Pagination metadata echoed back with every list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        }
    }

    pub fn from_params(params: PageParams, total: u64) -> Self {
        Self::new(params.page, params.limit, total)
    }
}

/// Page a fully-materialized list in memory. Used where the result set is
/// ranked application-side before windowing (search, watch history).
pub fn paginate_slice<T: Clone>(items: &[T], params: PageParams) -> (Vec<T>, PageMeta) {
    let total = items.len() as u64;
    let start = params.skip().min(total) as usize;
    let end = (params.skip() + params.limit).min(total) as usize;
    (items[start..end].to_vec(), PageMeta::from_params(params, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn defaults_apply() {
        let p = query(None, None).resolve();
        assert_eq!(p, PageParams { page: 1, limit: 10 });
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn limit_is_clamped_to_fifty() {
        let p = query(Some("3"), Some("9999")).resolve();
        assert_eq!(p.limit, 50);
        assert_eq!(p.skip(), 100);
    }

    #[test]
    fn garbage_input_falls_back_silently() {
        let p = query(Some("abc"), Some("-4")).resolve();
        assert_eq!(p, PageParams { page: 1, limit: 10 });
        let p = query(Some("0"), Some("0")).resolve();
        assert_eq!(p, PageParams { page: 1, limit: 10 });
    }

    #[test]
    fn meta_totals() {
        let meta = PageMeta::new(4, 10, 35);
        assert_eq!(meta.total_pages, 4);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);

        let meta = PageMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn slice_pagination_windows() {
        let items: Vec<u32> = (0..23).collect();
        let (page, meta) = paginate_slice(&items, PageParams { page: 3, limit: 10 });
        assert_eq!(page, vec![20, 21, 22]);
        assert_eq!(meta.total, 23);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);

        let (page, meta) = paginate_slice(&items, PageParams { page: 9, limit: 10 });
        assert!(page.is_empty());
        assert!(meta.has_prev_page);
    }
}

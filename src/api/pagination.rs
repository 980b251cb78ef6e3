use serde::Serialize;
use std::collections::HashMap;
use url::form_urlencoded;

use crate::config::ApiConfig;
use crate::database::store::Window;
use crate::error::ApiError;

/// `page` (1-based) and `size` from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// A malformed `page` is a 404; a malformed `size` falls back to the default.
    pub fn from_query(query: &HashMap<String, String>, config: &ApiConfig) -> Result<Self, ApiError> {
        let page = match query.get("page").map(|p| p.trim()) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(invalid_page)?,
        };
        let size = query
            .get("size")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|s| *s >= 1)
            .map(|s| s.min(config.max_page_size))
            .unwrap_or(config.page_size);

        Ok(PageRequest { page, size })
    }

    pub fn window(&self) -> Window {
        Window {
            limit: i64::from(self.size),
            offset: i64::from(self.page - 1) * i64::from(self.size),
        }
    }
}

fn invalid_page() -> ApiError {
    ApiError::not_found("Invalid page.")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page with links that keep the other query parameters.
    pub fn new(
        results: Vec<T>,
        count: i64,
        request: PageRequest,
        path: &str,
        query: &HashMap<String, String>,
    ) -> Result<Self, ApiError> {
        let window = request.window();
        if request.page > 1 && window.offset >= count {
            return Err(invalid_page());
        }

        let next = (window.offset + window.limit < count).then(|| link(path, query, request.page + 1));
        let previous = (request.page > 1).then(|| link(path, query, request.page - 1));

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn link(path: &str, query: &HashMap<String, String>, page: u32) -> String {
    let mut keys: Vec<&String> = query.keys().filter(|k| k.as_str() != "page").collect();
    keys.sort();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for key in keys {
        serializer.append_pair(key, &query[key]);
    }
    if page > 1 {
        serializer.append_pair("page", &page.to_string());
    }

    let encoded = serializer.finish();
    if encoded.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_and_caps_size() {
        let api = AppConfig::development().api;
        assert_eq!(PageRequest::from_query(&query(&[]), &api).unwrap(), PageRequest { page: 1, size: 10 });
        let capped = PageRequest::from_query(&query(&[("size", "500"), ("page", "2")]), &api).unwrap();
        assert_eq!(capped, PageRequest { page: 2, size: 40 });
        assert_eq!(capped.window(), Window { limit: 40, offset: 40 });
        let fallback = PageRequest::from_query(&query(&[("size", "lots")]), &api).unwrap();
        assert_eq!(fallback.size, 10);
    }

    #[test]
    fn malformed_page_is_not_found() {
        let api = AppConfig::development().api;
        for page in ["0", "-1", "last"] {
            let err = PageRequest::from_query(&query(&[("page", page)]), &api).unwrap_err();
            assert_eq!(err.status_code(), 404);
        }
    }

    #[test]
    fn links_keep_filters() {
        let q = query(&[("name__icontains", "north field"), ("page", "2"), ("size", "2")]);
        let request = PageRequest { page: 2, size: 2 };
        let page = Page::new(vec![3, 4], 5, request, "/public/beeyards", &q).unwrap();
        assert_eq!(
            page.next.as_deref(),
            Some("/public/beeyards?name__icontains=north+field&size=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/public/beeyards?name__icontains=north+field&size=2")
        );
    }

    #[test]
    fn page_past_the_end_is_not_found() {
        let request = PageRequest { page: 3, size: 10 };
        let err = Page::new(Vec::<i32>::new(), 15, request, "/public/hives", &HashMap::new()).unwrap_err();
        assert_eq!(err.message(), "Invalid page.");

        let empty = Page::new(Vec::<i32>::new(), 0, PageRequest { page: 1, size: 10 }, "/public/hives", &HashMap::new())
            .unwrap();
        assert_eq!((empty.count, empty.next, empty.previous), (0, None, None));
    }
}

//! Query parameter handling for the joke collection endpoint.
//!
//! Two contracts are accepted. A query carrying `page` or `itemsPerPage` is a
//! page request; anything else is a `limit`/`offset` window request.

use crate as engine;
use engine::ErrorCode;
use jokebox_rs_models::Joke;
use jokebox_rs_storage::PageQuery;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::TryFrom;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";
pub const PAGE_PARAM: &str = "page";
pub const ITEMS_PER_PAGE_PARAM: &str = "itemsPerPage";

// SQLite binds OFFSET as a signed 64-bit integer
const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListRequest {
    Window { limit: u32, offset: u64 },
    Page { page: u32, items_per_page: u32 },
}

impl ListRequest {
    pub fn from_query(query: &HashMap<String, String>) -> engine::Result<ListRequest> {
        if query.contains_key(PAGE_PARAM) || query.contains_key(ITEMS_PER_PAGE_PARAM) {
            parse_page_request(query)
        } else {
            parse_window_request(query)
        }
    }

    pub fn page_query(&self) -> PageQuery {
        match *self {
            ListRequest::Window { limit, offset } => PageQuery { limit, offset },
            ListRequest::Page {
                page,
                items_per_page,
            } => {
                let offset = u64::from(page - 1) * u64::from(items_per_page);
                PageQuery {
                    limit: items_per_page,
                    offset: offset.min(MAX_OFFSET),
                }
            }
        }
    }

    pub fn into_listing(self, jokes: Vec<Joke>) -> JokeListing {
        match self {
            ListRequest::Window { .. } => JokeListing::Window(jokes),
            ListRequest::Page {
                page,
                items_per_page,
            } => JokeListing::Page {
                meta: PageMeta {
                    page,
                    items_per_page,
                    // Size of this page, not of the table
                    total: jokes.len(),
                },
                jokes,
            },
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JokeListing {
    Window(Vec<Joke>),
    Page { meta: PageMeta, jokes: Vec<Joke> },
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub items_per_page: u32,
    pub total: usize,
}

fn parse_window_request(query: &HashMap<String, String>) -> engine::Result<ListRequest> {
    let limit = match query.get(LIMIT_PARAM).and_then(|v| parse_count(v)) {
        Some(limit) => limit,
        None => return Err(invalid_params(&[LIMIT_PARAM])),
    };

    // A malformed offset is ignored rather than rejected
    let offset = query
        .get(OFFSET_PARAM)
        .and_then(|v| parse_numeric(v))
        .unwrap_or(0)
        .min(MAX_OFFSET);

    Ok(ListRequest::Window { limit, offset })
}

fn parse_page_request(query: &HashMap<String, String>) -> engine::Result<ListRequest> {
    let page = parse_positive(query, PAGE_PARAM);
    let items_per_page = parse_positive(query, ITEMS_PER_PAGE_PARAM);

    match (page, items_per_page) {
        (Some(page), Some(items_per_page)) => Ok(ListRequest::Page {
            page,
            items_per_page,
        }),
        (page, items_per_page) => {
            let mut violated = vec![];
            if page.is_none() {
                violated.push(PAGE_PARAM);
            }
            if items_per_page.is_none() {
                violated.push(ITEMS_PER_PAGE_PARAM);
            }
            Err(invalid_params(&violated))
        }
    }
}

fn parse_positive(query: &HashMap<String, String>, name: &str) -> Option<u32> {
    query
        .get(name)
        .and_then(|v| parse_count(v))
        .filter(|v| *v >= 1)
}

/// A count saturates at `u32::MAX` instead of being rejected.
fn parse_count(value: &str) -> Option<u32> {
    parse_numeric(value).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Accepts any non-negative integral number, written as an integer
/// (`"10"`) or in float notation (`"10.0"`, `"1e1"`). Negative, fractional
/// and non-finite values are rejected.
fn parse_numeric(value: &str) -> Option<u64> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        // `as` saturates above u64::MAX
        Some(f as u64)
    } else {
        None
    }
}

fn invalid_params(names: &[&str]) -> engine::Error {
    let message = names
        .iter()
        .map(|name| format!("Missing or invalid \"{}\" query parameter.", name))
        .collect::<Vec<_>>()
        .join("\n");
    engine::Error::with_message(ErrorCode::PaginationInvalid, message, None)
}

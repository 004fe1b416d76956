pub mod department;
pub mod employee;
pub mod resource;

use std::str::FromStr;

use crate::config::Config;
use crate::error::ApiError;
use crate::repository::{PageRequest, Sort};

/// Resolves `page`, `size` and `sort` query values. `size` falls back to the
/// configured default and is clamped to `1..=max_page_size`.
pub(crate) fn page_request<F>(
    config: &Config,
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<&str>,
) -> Result<PageRequest<F>, ApiError>
where
    F: FromStr + Default,
{
    let sort = match sort.map(str::trim) {
        None | Some("") => Sort::default(),
        Some(raw) => raw.parse::<Sort<F>>()?,
    };

    Ok(PageRequest {
        page: page.unwrap_or(0),
        size: size
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size),
        sort,
    })
}

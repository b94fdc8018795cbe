//! Driver for `{totalCount, results}` paginated collections.

use jamfpro_domain::{JamfError, Response, Result, RsqlQuery};
use jamfpro_domain::rsql::{KEY_PAGE, KEY_PAGE_SIZE};
use serde::Deserialize;
use serde_json::value::RawValue;

use super::Transport;
use crate::ports::{Headers, MergePage, Payload};

/// Default page size when the caller did not set one.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 200;

/// One page of a modern-API collection. `results` stays raw so the caller
/// decides the element type.
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    #[serde(rename = "totalCount")]
    total_count: u64,
    results: Vec<Box<RawValue>>,
}

/// Fetch pages in order, feeding each raw `results` array to `merge_page`.
///
/// Stops when a page comes back empty or when page arithmetic shows the
/// collection is exhausted (`(page + 1) * page_size >= totalCount`). Pages
/// are never accumulated here; memory stays bounded at one page.
pub(crate) async fn run(
    transport: &Transport,
    path: &str,
    query: Option<&RsqlQuery>,
    headers: &Headers,
    merge_page: MergePage<'_>,
) -> Result<Response> {
    let base = query.cloned().unwrap_or_default();

    let page_size = match base.get(KEY_PAGE_SIZE) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| JamfError::Config(format!("invalid page-size '{raw}'")))?,
        None => DEFAULT_PAGE_SIZE,
    };
    let mut page = match base.get(KEY_PAGE) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| JamfError::Config(format!("invalid page '{raw}'")))?,
        None => 0,
    };

    loop {
        let page_query = base.clone().page(page).page_size(page_size);
        let response = transport
            .execute(reqwest::Method::GET, path, Some(&page_query), headers, &Payload::Empty)
            .await?;

        let envelope: PageEnvelope = response.json()?;
        let fetched_this_page = envelope.results.len();
        merge_page(envelope.results)?;

        let fetched_total = (u64::from(page) + 1) * u64::from(page_size);
        if fetched_this_page == 0 || fetched_total >= envelope.total_count {
            return Ok(response);
        }
        page += 1;
    }
}

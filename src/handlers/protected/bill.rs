// handlers/protected/bill.rs - POST /createBill and GET /bill/list handlers

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::format::{format_entity, DtoKind};
use crate::api::params::{coerce_date, lenient_f64, lenient_u64};
use crate::database::models::{Bill, NewBill};
use crate::error::ApiError;
use crate::middleware::auth::AuthContext;
use crate::middleware::response::{HandlerResult, Success};

#[derive(Debug, Deserialize)]
struct CreateBillRequest {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    date: Value,
    #[serde(deserialize_with = "lenient_f64")]
    amount: f64,
    #[serde(default)]
    title: String,
}

/// POST /createBill - record an expense for the token's user
///
/// Ownership always comes from the token; a `userId` in the body is ignored.
pub async fn create_bill_post(auth: AuthContext) -> HandlerResult {
    let request: CreateBillRequest = auth.data_as()?;
    let identity = auth.identity();

    let new_bill = NewBill {
        kind: request.kind,
        date: coerce_date(&request.date)?,
        amount: request.amount,
        title: request.title,
        user_id: identity.id.clone(),
    };

    let bill: Bill = auth.state.bills().insert(&new_bill).await?;
    info!("User {} created bill {}", identity.id, bill.id);

    let bill = format_entity(DtoKind::Bill, &bill, identity.permission)?;
    Ok(Success::new().with("data", json!({ "bill": bill })))
}

fn default_current() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

/// `current` is 1-based
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    #[serde(default = "default_current", deserialize_with = "lenient_u64")]
    current: u64,
    #[serde(default = "default_page_size", deserialize_with = "lenient_u64")]
    page_size: u64,
}

impl PageQuery {
    /// Items to skip and items to take
    fn window(&self) -> Result<(usize, usize), ApiError> {
        if self.current < 1 || self.page_size < 1 {
            return Err(ApiError::bad_request("current and pageSize must be at least 1"));
        }
        let size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        let skip = usize::try_from((self.current - 1).saturating_mul(self.page_size)).unwrap_or(usize::MAX);
        Ok((skip, size))
    }
}

/// GET /bill/list?current=&pageSize= - one page of the token's own bills
///
/// Bills come back in store order; no sorting is applied before slicing.
pub async fn bill_list_get(auth: AuthContext) -> HandlerResult {
    let page: PageQuery = auth.query_as()?;
    let (skip, take) = page.window()?;
    let identity = auth.identity();

    let bills = auth
        .state
        .bills()
        .select_any(|bill: &Bill| bill.user_id == identity.id)
        .await?;

    let bills = bills
        .iter()
        .skip(skip)
        .take(take)
        .map(|bill| format_entity(DtoKind::Bill, bill, identity.permission))
        .collect::<Result<Vec<Value>, ApiError>>()?;

    Ok(Success::new().with("bills", bills))
}

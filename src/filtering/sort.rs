use sea_orm::{EntityTrait, sea_query::Order};

use super::pagination::{PaginationRequest, SortDirection};
use crate::core::schema::find_column;

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

/// Column and direction to order a listing by.
///
/// `None` when no sort field was requested or the field is not a column of
/// `E`; the listing is then left unordered.
pub(crate) fn resolve_sort<E: EntityTrait>(
    request: &PaginationRequest,
) -> Option<(E::Column, Order)> {
    let field = request.sort_by.as_deref()?;
    match find_column::<E>(field) {
        Some(column) => Some((column, request.sort_order.into())),
        None => {
            tracing::debug!(field, "Ignoring sort on unknown column");
            None
        }
    }
}

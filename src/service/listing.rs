use sea_orm::{
    Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Order,
};

use super::CrudService;
use crate::core::options::OperationOptions;
use crate::core::query;
use crate::core::schema::find_column;
use crate::core::traits::{CrudOperations, ModelOf};
use crate::errors::CrudError;
use crate::filtering::sort::resolve_sort;
use crate::filtering::{
    FilterExpression, Page, PaginationRequest, SearchResults, build_filter_condition,
    build_fulltext_query,
};

impl<O: CrudOperations> CrudService<O> {
    /// Lists one page of non-deleted rows matching `filter`.
    ///
    /// The page rows and the total are queried concurrently. Sorting on a
    /// field that is not a column is ignored rather than rejected.
    ///
    /// # Errors
    ///
    /// Only database errors.
    pub async fn find_all(
        &self,
        filter: &FilterExpression,
        pagination: &PaginationRequest,
        options: &OperationOptions<'_>,
    ) -> Result<Page<ModelOf<O>>, CrudError> {
        let window = pagination.window(self.config.pagination);
        tracing::debug!(
            entity = %self.config.entity_name,
            filters = filter.len(),
            page = window.page,
            limit = window.limit,
            "find all"
        );
        self.log_relations(options);

        let condition = self.live(build_filter_condition::<O::Entity>(
            filter,
            self.config.capabilities.case_sensitive,
            self.executor(options).get_database_backend(),
        ));

        let mut select = self.select(condition.clone(), options);
        if let Some((column, order)) = resolve_sort::<O::Entity>(pagination) {
            select = select.order_by(column, order);
        }
        let select = select.offset(window.offset).limit(window.limit);
        let counter = <O::Entity as EntityTrait>::find().filter(condition);

        let exec = self.executor(options);
        let (data, total) = futures::try_join!(
            query::select_rows(&exec, select),
            query::count(&exec, counter)
        )?;

        Ok(Page {
            data,
            total,
            page: window.page,
            limit: window.limit,
        })
    }

    /// Number of non-deleted rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Only database errors.
    pub async fn count(
        &self,
        filter: &FilterExpression,
        options: &OperationOptions<'_>,
    ) -> Result<u64, CrudError> {
        tracing::debug!(entity = %self.config.entity_name, filters = filter.len(), "count");
        let exec = self.executor(options);
        let condition = self.live(build_filter_condition::<O::Entity>(
            filter,
            self.config.capabilities.case_sensitive,
            exec.get_database_backend(),
        ));
        let counter = <O::Entity as EntityTrait>::find().filter(condition);
        Ok(query::count(&exec, counter).await?)
    }

    /// Ranked full-text search of `term` over `columns`, most relevant first.
    ///
    /// A blank term returns no results without querying. Unknown column names
    /// are skipped.
    ///
    /// # Errors
    ///
    /// - [`CrudError::OperationNotSupported`] when full-text search is disabled
    /// - [`CrudError::ValidationFailed`] when none of `columns` exists
    pub async fn full_text_search(
        &self,
        term: &str,
        columns: &[&str],
        pagination: &PaginationRequest,
        options: &OperationOptions<'_>,
    ) -> Result<SearchResults<ModelOf<O>>, CrudError> {
        let entity = &self.config.entity_name;
        if !self.config.capabilities.full_text_search {
            return Err(CrudError::not_supported(format!(
                "Full-text search is not enabled for {entity}"
            )));
        }

        let resolved: Vec<_> = columns
            .iter()
            .filter_map(|name| find_column::<O::Entity>(name))
            .collect();
        if resolved.is_empty() {
            return Err(CrudError::validation(
                "columns",
                format!("No searchable columns given for {entity}"),
            ));
        }

        let Some(search) = build_fulltext_query(
            self.config.dialect,
            &self.config.full_text_language,
            &resolved,
            term,
        ) else {
            return Ok(SearchResults::empty());
        };

        let window = pagination.window(self.config.pagination);
        tracing::debug!(
            entity = %entity,
            columns = resolved.len(),
            page = window.page,
            limit = window.limit,
            "full text search"
        );

        let condition = self.live(Condition::all().add(search.predicate));
        let select = self
            .select(condition.clone(), options)
            .order_by(search.rank, Order::Desc)
            .offset(window.offset)
            .limit(window.limit);
        let counter = <O::Entity as EntityTrait>::find().filter(condition);

        let exec = self.executor(options);
        let (data, total) = futures::try_join!(
            query::select_rows(&exec, select),
            query::count(&exec, counter)
        )?;

        Ok(SearchResults { data, total })
    }
}

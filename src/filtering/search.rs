use sea_orm::{
    ColumnTrait, Value,
    sea_query::{Expr, MysqlQueryBuilder, PostgresQueryBuilder, QueryBuilder, SimpleExpr},
};

use crate::config::Dialect;
use crate::core::schema::quote_ident;

// Basic safety limit
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Match predicate and relevance expression of a full-text search.
#[derive(Debug, Clone)]
pub struct FullTextQuery {
    pub predicate: SimpleExpr,
    /// Higher is more relevant
    pub rank: SimpleExpr,
}

/// Builds the dialect's full-text search over `columns`.
///
/// Returns `None` for a blank term or an empty column list. `language` must
/// be a plain identifier; [`ResolvedConfig`](crate::config::ResolvedConfig)
/// guarantees that for the configured one.
#[must_use]
pub fn build_fulltext_query<C: ColumnTrait>(
    dialect: Dialect,
    language: &str,
    columns: &[C],
    term: &str,
) -> Option<FullTextQuery> {
    let term = term.trim();
    if columns.is_empty() || term.is_empty() {
        return None;
    }
    let term: String = term.chars().take(MAX_SEARCH_QUERY_LENGTH).collect();

    Some(match dialect {
        Dialect::Postgresql => postgres_fulltext(language, columns, &term),
        Dialect::Mysql => mysql_fulltext(columns, &term),
    })
}

/// `to_tsvector(lang, coalesce(col::text, '')) || ... @@ plainto_tsquery(lang, term)`
fn postgres_fulltext<C: ColumnTrait>(language: &str, columns: &[C], term: &str) -> FullTextQuery {
    let vector = columns
        .iter()
        .map(|column| {
            let name = quote_ident(Dialect::Postgresql, column.as_str());
            format!("to_tsvector('{language}', coalesce({name}::text, ''))")
        })
        .collect::<Vec<_>>()
        .join(" || ");
    let literal = PostgresQueryBuilder.value_to_string(&Value::from(term));
    let query = format!("plainto_tsquery('{language}', {literal})");

    FullTextQuery {
        predicate: Expr::cust(format!("({vector}) @@ {query}")),
        rank: Expr::cust(format!("ts_rank({vector}, {query})")),
    }
}

/// `MATCH(cols) AGAINST(term IN NATURAL LANGUAGE MODE)`, which is also the score.
fn mysql_fulltext<C: ColumnTrait>(columns: &[C], term: &str) -> FullTextQuery {
    let names = columns
        .iter()
        .map(|column| quote_ident(Dialect::Mysql, column.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let literal = MysqlQueryBuilder.value_to_string(&Value::from(term));
    let matcher = format!("MATCH({names}) AGAINST({literal} IN NATURAL LANGUAGE MODE)");

    FullTextQuery {
        predicate: Expr::cust(matcher.clone()),
        rank: Expr::cust(matcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{
        DatabaseBackend,
        sea_query::{Alias, Query},
    };

    mod post {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "posts")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub title: String,
            pub body: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    use post::Column;

    fn render(expr: SimpleExpr, backend: DatabaseBackend) -> String {
        let stmt = Query::select()
            .expr(expr)
            .from(Alias::new("posts"))
            .to_owned();
        backend.build(&stmt).to_string()
    }

    #[test]
    fn test_postgres_uses_tsvector_and_plainto_tsquery() {
        let query = build_fulltext_query(
            Dialect::Postgresql,
            "english",
            &[Column::Title, Column::Body],
            "rust tips",
        )
        .unwrap();

        let sql = render(query.predicate, DatabaseBackend::Postgres);
        assert!(sql.contains(r#"to_tsvector('english', coalesce("title"::text, ''))"#), "{sql}");
        assert!(sql.contains(r#"|| to_tsvector('english', coalesce("body"::text, ''))"#), "{sql}");
        assert!(sql.contains("@@ plainto_tsquery('english', 'rust tips')"), "{sql}");

        let rank = render(query.rank, DatabaseBackend::Postgres);
        assert!(rank.starts_with("SELECT ts_rank("), "{rank}");
    }

    #[test]
    fn test_mysql_uses_match_against() {
        let query =
            build_fulltext_query(Dialect::Mysql, "english", &[Column::Title], "rust").unwrap();
        let sql = render(query.predicate, DatabaseBackend::MySql);
        assert!(
            sql.contains("MATCH(`title`) AGAINST('rust' IN NATURAL LANGUAGE MODE)"),
            "{sql}"
        );
    }

    #[test]
    fn test_quotes_in_term_are_escaped() {
        let query =
            build_fulltext_query(Dialect::Postgresql, "english", &[Column::Title], "it's").unwrap();
        let sql = render(query.predicate, DatabaseBackend::Postgres);
        assert!(!sql.contains("'it's'"), "{sql}");
    }

    #[test]
    fn test_blank_term_or_no_columns_builds_nothing() {
        assert!(build_fulltext_query(Dialect::Postgresql, "english", &[Column::Title], "  ").is_none());
        assert!(build_fulltext_query::<Column>(Dialect::Postgresql, "english", &[], "rust").is_none());
    }
}

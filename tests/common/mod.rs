#![allow(dead_code)]

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Value};
use tablecrud::{
    CrudConfig, CrudError, CrudOperations, CrudService, FieldValues, LifecycleHooks,
    ValidationErrors,
};

pub mod article {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "articles")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        #[sea_orm(unique)]
        pub slug: String,
        pub title: String,
        pub author: Option<String>,
        pub views: i32,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Debug, Clone)]
pub struct ArticleCreate {
    pub slug: String,
    pub title: String,
    pub author: Option<String>,
    pub views: i32,
}

impl ArticleCreate {
    pub fn new(slug: &str, title: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            author: None,
            views: 0,
        }
    }

    pub fn by(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn views(mut self, views: i32) -> Self {
        self.views = views;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub views: Option<i32>,
}

pub struct ArticleOperations;

#[async_trait]
impl CrudOperations for ArticleOperations {
    type Entity = article::Entity;
    type CreateModel = ArticleCreate;
    type UpdateModel = ArticleUpdate;

    async fn validate_create(&self, data: &ArticleCreate) -> Result<(), CrudError> {
        ValidationErrors::new()
            .required("title", &data.title)
            .length("slug", &data.slug, 1..=80)
            .finish()
    }

    async fn validate_update(&self, _id: &Value, data: &ArticleUpdate) -> Result<(), CrudError> {
        let mut errors = ValidationErrors::new();
        if let Some(views) = data.views {
            errors = errors.range("views", views, 0..=i32::MAX);
        }
        errors.finish()
    }

    fn map_create(&self, data: ArticleCreate) -> FieldValues {
        FieldValues::new()
            .set("slug", data.slug)
            .set("title", data.title)
            .set("author", data.author)
            .set("views", data.views)
    }

    fn map_update(&self, data: ArticleUpdate) -> FieldValues {
        FieldValues::new()
            .set_some("title", data.title)
            .set_some("views", data.views)
    }
}

/// Logs library output for failing tests; set `RUST_LOG=tablecrud=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(article::Entity)))
        .await?;

    Ok(db)
}

pub fn article_config() -> CrudConfig {
    CrudConfig::default().entity_name("Article")
}

pub fn article_service(db: DatabaseConnection) -> CrudService<ArticleOperations> {
    CrudService::new(db, ArticleOperations, article_config()).expect("valid article config")
}

pub fn article_service_with(
    db: DatabaseConnection,
    config: CrudConfig,
    hooks: LifecycleHooks<ArticleOperations>,
) -> CrudService<ArticleOperations> {
    CrudService::builder(ArticleOperations)
        .connection(db)
        .config(config)
        .hooks(hooks)
        .build()
        .expect("valid article config")
}

/// Creates one article per `(slug, title, views)`.
pub async fn seed(
    service: &CrudService<ArticleOperations>,
    rows: &[(&str, &str, i32)],
) -> Vec<article::Model> {
    let mut created = Vec::new();
    for (slug, title, views) in rows {
        let data = ArticleCreate::new(slug, title).views(*views);
        created.push(
            service
                .create(data, &Default::default())
                .await
                .expect("seed article"),
        );
    }
    created
}

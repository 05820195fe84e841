//! Optional lifecycle callbacks run around the mutating operations.
//!
//! Every hook defaults to a no-op (or identity for the `before_create` /
//! `before_update` transforms). A hook returning an error aborts the
//! operation; an error from an `after_*` hook is reported after the write has
//! already happened, so callers that need atomicity should pass a transaction.
//!
//! ```rust,ignore
//! let hooks = LifecycleHooks::<ArticleOperations>::new()
//!     .before_create(|mut data: ArticleCreate| async move {
//!         data.title = data.title.trim().to_string();
//!         Ok(data)
//!     })
//!     .after_delete(move |id| {
//!         let audit = audit.clone();
//!         async move { audit.record("article deleted", id).await }
//!     });
//! ```

use futures::future::{self, BoxFuture, FutureExt};
use sea_orm::Value;
use std::{fmt, future::Future, sync::Arc};

use super::traits::{CrudOperations, ModelOf};
use crate::errors::CrudError;

type Hook<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, CrudError>> + Send + Sync>;

pub struct LifecycleHooks<O: CrudOperations> {
    pub(crate) before_create: Hook<O::CreateModel, O::CreateModel>,
    pub(crate) after_create: Hook<ModelOf<O>, ()>,
    pub(crate) before_update: Hook<(Value, O::UpdateModel), O::UpdateModel>,
    pub(crate) after_update: Hook<ModelOf<O>, ()>,
    pub(crate) before_delete: Hook<Value, ()>,
    pub(crate) after_delete: Hook<Value, ()>,
    pub(crate) before_soft_delete: Hook<Value, ()>,
    pub(crate) after_soft_delete: Hook<Value, ()>,
    pub(crate) before_restore: Hook<Value, ()>,
    pub(crate) after_restore: Hook<ModelOf<O>, ()>,
}

fn boxed<A: 'static, T: 'static, F, Fut>(hook: F) -> Hook<A, T>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CrudError>> + Send + 'static,
{
    Arc::new(move |arg| hook(arg).boxed())
}

fn identity<A: Send + 'static>() -> Hook<A, A> {
    Arc::new(|arg: A| future::ready(Ok::<_, CrudError>(arg)).boxed())
}

fn noop<A: 'static>() -> Hook<A, ()> {
    Arc::new(|_: A| future::ready(Ok::<_, CrudError>(())).boxed())
}

impl<O: CrudOperations> Default for LifecycleHooks<O> {
    fn default() -> Self {
        Self {
            before_create: identity(),
            after_create: noop(),
            before_update: Arc::new(|(_, data): (Value, O::UpdateModel)| {
                future::ready(Ok::<_, CrudError>(data)).boxed()
            }),
            after_update: noop(),
            before_delete: noop(),
            after_delete: noop(),
            before_soft_delete: noop(),
            after_soft_delete: noop(),
            before_restore: noop(),
            after_restore: noop(),
        }
    }
}

impl<O: CrudOperations> Clone for LifecycleHooks<O> {
    fn clone(&self) -> Self {
        Self {
            before_create: Arc::clone(&self.before_create),
            after_create: Arc::clone(&self.after_create),
            before_update: Arc::clone(&self.before_update),
            after_update: Arc::clone(&self.after_update),
            before_delete: Arc::clone(&self.before_delete),
            after_delete: Arc::clone(&self.after_delete),
            before_soft_delete: Arc::clone(&self.before_soft_delete),
            after_soft_delete: Arc::clone(&self.after_soft_delete),
            before_restore: Arc::clone(&self.before_restore),
            after_restore: Arc::clone(&self.after_restore),
        }
    }
}

impl<O: CrudOperations> fmt::Debug for LifecycleHooks<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks").finish_non_exhaustive()
    }
}

impl<O: CrudOperations> LifecycleHooks<O> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transforms the create payload before it is mapped to column values.
    #[must_use]
    pub fn before_create<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(O::CreateModel) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O::CreateModel, CrudError>> + Send + 'static,
    {
        self.before_create = boxed(hook);
        self
    }

    #[must_use]
    pub fn after_create<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModelOf<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.after_create = boxed(hook);
        self
    }

    /// Transforms the update payload; receives the target id alongside it.
    #[must_use]
    pub fn before_update<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value, O::UpdateModel) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O::UpdateModel, CrudError>> + Send + 'static,
    {
        self.before_update = boxed(move |(id, data): (Value, O::UpdateModel)| hook(id, data));
        self
    }

    #[must_use]
    pub fn after_update<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModelOf<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.after_update = boxed(hook);
        self
    }

    #[must_use]
    pub fn before_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.before_delete = boxed(hook);
        self
    }

    /// Runs only when a row was actually deleted.
    #[must_use]
    pub fn after_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.after_delete = boxed(hook);
        self
    }

    #[must_use]
    pub fn before_soft_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.before_soft_delete = boxed(hook);
        self
    }

    /// Runs only when a row was actually marked deleted.
    #[must_use]
    pub fn after_soft_delete<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.after_soft_delete = boxed(hook);
        self
    }

    #[must_use]
    pub fn before_restore<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.before_restore = boxed(hook);
        self
    }

    #[must_use]
    pub fn after_restore<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ModelOf<O>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CrudError>> + Send + 'static,
    {
        self.after_restore = boxed(hook);
        self
    }
}

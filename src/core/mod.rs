pub mod hooks;
pub mod options;
pub mod query;
pub mod schema;
pub mod traits;

pub use hooks::LifecycleHooks;
pub use options::{HookSkip, LockMode, OperationOptions};
pub use query::Executor;
pub use traits::{CrudOperations, FieldValues, ModelOf};

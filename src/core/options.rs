use sea_orm::DatabaseTransaction;

/// Lock requested on rows read by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `SELECT ... FOR UPDATE`
    Update,
    /// `SELECT ... FOR SHARE`
    Share,
}

/// Which lifecycle hooks an operation skips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookSkip {
    pub skip_before: bool,
    pub skip_after: bool,
}

/// Per-call options shared by every service operation.
///
/// A transaction passed here is used instead of the service's connection,
/// which is how nested calls (bulk operations calling single-entity ones, or
/// callers composing several services) join one unit of work.
#[derive(Clone, Copy, Default)]
pub struct OperationOptions<'a> {
    pub transaction: Option<&'a DatabaseTransaction>,
    pub relations_to_load: &'a [&'a str],
    /// Only honored by projected reads; typed reads always load whole rows.
    pub fields_to_select: &'a [&'a str],
    pub hook_skip: HookSkip,
    pub lock_mode: Option<LockMode>,
}

impl std::fmt::Debug for OperationOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationOptions")
            .field("transaction", &self.transaction.is_some())
            .field("relations_to_load", &self.relations_to_load)
            .field("fields_to_select", &self.fields_to_select)
            .field("hook_skip", &self.hook_skip)
            .field("lock_mode", &self.lock_mode)
            .finish()
    }
}

impl<'a> OperationOptions<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_transaction(transaction: &'a DatabaseTransaction) -> Self {
        Self {
            transaction: Some(transaction),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn transaction(mut self, transaction: &'a DatabaseTransaction) -> Self {
        self.transaction = Some(transaction);
        self
    }

    #[must_use]
    pub fn relations(mut self, relations: &'a [&'a str]) -> Self {
        self.relations_to_load = relations;
        self
    }

    #[must_use]
    pub fn select(mut self, fields: &'a [&'a str]) -> Self {
        self.fields_to_select = fields;
        self
    }

    #[must_use]
    pub fn skip_hooks(mut self) -> Self {
        self.hook_skip = HookSkip {
            skip_before: true,
            skip_after: true,
        };
        self
    }

    #[must_use]
    pub fn skip_before_hooks(mut self) -> Self {
        self.hook_skip.skip_before = true;
        self
    }

    #[must_use]
    pub fn skip_after_hooks(mut self) -> Self {
        self.hook_skip.skip_after = true;
        self
    }

    #[must_use]
    pub fn lock(mut self, mode: LockMode) -> Self {
        self.lock_mode = Some(mode);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_run_every_hook() {
        let options = OperationOptions::default();
        assert!(options.transaction.is_none());
        assert!(!options.hook_skip.skip_before);
        assert!(!options.hook_skip.skip_after);
        assert!(options.lock_mode.is_none());
    }

    #[test]
    fn test_builder_flags() {
        let options = OperationOptions::new()
            .skip_before_hooks()
            .select(&["id"])
            .lock(LockMode::Share);
        assert!(options.hook_skip.skip_before);
        assert!(!options.hook_skip.skip_after);
        assert_eq!(options.fields_to_select, ["id"]);
        assert_eq!(options.lock_mode, Some(LockMode::Share));

        assert_eq!(
            OperationOptions::new().skip_hooks().hook_skip,
            HookSkip {
                skip_before: true,
                skip_after: true
            }
        );
    }
}

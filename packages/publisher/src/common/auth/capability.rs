/// Admin capabilities over the publishing pipeline.
///
/// Every capability currently requires admin status; they are kept distinct
/// so audit logs say what was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Add, edit, delete, retry and reset queue items
    ManageQueue,

    /// Force generation of a specific queue item
    TriggerGeneration,

    /// Edit posts and their slugs
    ManagePosts,

    /// Create and rename categories and tags
    ManageTaxonomy,
}

impl AdminCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminCapability::ManageQueue => "manage_queue",
            AdminCapability::TriggerGeneration => "trigger_generation",
            AdminCapability::ManagePosts => "manage_posts",
            AdminCapability::ManageTaxonomy => "manage_taxonomy",
        }
    }
}

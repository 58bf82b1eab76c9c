//! Typed ID definitions for all pipeline entities.
//!
//! ```rust
//! use publisher_core::common::{PostId, QueueItemId};
//!
//! let item_id: QueueItemId = QueueItemId::new();
//! let post_id: PostId = PostId::new();
//! // let wrong: PostId = item_id; // compile error
//! # let _ = (item_id, post_id);
//! ```

// Re-export the core Id type
pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for queued titles awaiting generation.
pub struct QueueItem;

/// Marker type for draft/published posts.
pub struct Post;

/// Marker type for taxonomy terms (categories and tags share one shape).
pub struct Term;

/// Marker type for authenticated members (admins).
pub struct Member;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for queue items.
pub type QueueItemId = Id<QueueItem>;

/// Typed ID for posts.
pub type PostId = Id<Post>;

/// Typed ID for categories and tags.
pub type TermId = Id<Term>;

/// Typed ID for members.
pub type MemberId = Id<Member>;

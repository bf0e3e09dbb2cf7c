/// Typed record repositories over the document store
///
/// The repositories own the collection names and the field mapping; the
/// services above them never touch raw documents or predicates for the
/// standard access paths.
pub mod posts;
pub mod users;

pub use posts::{NewPost, PostRecords};
pub use users::{NewUser, UserRecords};

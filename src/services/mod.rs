/// Business logic layer
///
/// Each service is a stateless, request-scoped coordinator over shared store
/// handles. No service calls another service; multi-store work happens
/// inside a single coordinator so its compensation logic sees every step.
pub mod accounts;
pub mod auth;
pub mod avatars;
pub mod feed;
pub mod profiles;
pub mod uploads;

pub use accounts::{AccountDeletionReport, AccountService, PostCleanupFailure};
pub use auth::{AuthChallenge, AuthService};
pub use avatars::AvatarService;
pub use feed::FeedService;
pub use profiles::ProfileService;
pub use uploads::UploadService;

pub mod audit_log;
pub mod banner;
pub mod category;
pub mod comment;
pub mod contact_message;
pub mod otp;
pub mod post;
pub mod post_like;
pub mod user;

pub use audit_log::{Entity as AuditLog, Model as AuditLogModel};
pub use banner::{Entity as Banner, Model as BannerModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use comment::{Entity as Comment, Model as CommentModel};
pub use contact_message::{Entity as ContactMessage, Model as ContactMessageModel};
pub use otp::{Entity as Otp, Model as OtpModel};
pub use post::{Entity as Post, Model as PostModel};
pub use post_like::{Entity as PostLike, Model as PostLikeModel};
pub use user::{Entity as User, Model as UserModel};

/// Post moderation states.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_REJECTED: &str = "rejected";

/// User roles.
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPERADMIN: &str = "superadmin";

/// The single OTP purpose this application issues.
pub const OTP_PURPOSE_FORGOT_PASSWORD: &str = "forgot_password";

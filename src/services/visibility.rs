//! The single visibility predicate for posts.
//!
//! Every read, list, like and comment path goes through [`Viewer`] so the
//! admin/owner/public branching lives in exactly one place.

use crate::middleware::AuthUser;
use crate::models::{PostModel, ROLE_ADMIN, ROLE_SUPERADMIN, STATUS_PUBLISHED};

/// The identity a request is evaluated under.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub user_id: Option<i32>,
    pub is_moderator: bool,
}

impl Viewer {
    /// Anonymous caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_auth(auth: Option<&AuthUser>) -> Self {
        match auth {
            Some(auth) => Self {
                user_id: auth.user_id.parse().ok(),
                is_moderator: auth.role == ROLE_ADMIN || auth.role == ROLE_SUPERADMIN,
            },
            None => Self::default(),
        }
    }

    pub fn is_author_of(&self, post: &PostModel) -> bool {
        self.user_id == Some(post.author_id)
    }

    /// May this caller see this post at all?
    ///
    /// Published posts are visible to everyone; anything else only to its
    /// author and to moderators.
    pub fn can_view(&self, post: &PostModel) -> bool {
        post.status == STATUS_PUBLISHED || self.is_moderator || self.is_author_of(post)
    }

    /// Effective status filter for a listing.
    ///
    /// Moderators, and authors browsing their own feed, get the filter they
    /// asked for (or no filter). Everyone else is pinned to published,
    /// whatever they requested.
    pub fn status_filter(
        &self,
        author_filter: Option<i32>,
        requested: Option<String>,
    ) -> Option<String> {
        let own_feed = author_filter.is_some() && self.user_id == author_filter;
        if self.is_moderator || own_feed {
            requested
        } else {
            Some(STATUS_PUBLISHED.to_string())
        }
    }
}

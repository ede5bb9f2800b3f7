use anyhow::Result;
use uuid::Uuid;

use fable_types::{NotificationKind, Post, User};

use crate::db::repositories::{FollowRepository, NewNotification, NotificationRepository};
use crate::db::DbPool;

/// Produces notification rows for the platform's social events.
///
/// Self-directed events never notify: liking or commenting on your own
/// story is silent, and the new-post fan-out only reaches followers.
#[derive(Clone)]
pub struct Notifier {
    pool: DbPool,
}

impl Notifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn notifications(&self) -> NotificationRepository {
        NotificationRepository::new(self.pool.clone())
    }

    /// Fan a new-post event out to every follower of the author.
    /// Returns the number of notifications written.
    pub fn post_published(&self, author: &User, post: &Post) -> Result<usize> {
        let followers = FollowRepository::new(self.pool.clone()).followers(&author.id)?;
        let repo = self.notifications();
        let message = format!("{} published a new story \"{}\"", author.username, post.title);
        let link = format!("/posts/{}", post.id);

        for follower_id in &followers {
            repo.create(&NewNotification {
                recipient_id: *follower_id,
                sender_id: Some(author.id),
                kind: NotificationKind::NewPost,
                message: message.clone(),
                link: Some(link.clone()),
            })?;
        }

        tracing::debug!(
            "Fanned out post {} to {} followers of {}",
            post.id,
            followers.len(),
            author.username
        );
        Ok(followers.len())
    }

    /// Tell a post's author someone commented on it
    pub fn post_commented(&self, commenter: &User, post: &Post) -> Result<()> {
        if commenter.id == post.author_id {
            return Ok(());
        }
        self.notifications().create(&NewNotification {
            recipient_id: post.author_id,
            sender_id: Some(commenter.id),
            kind: NotificationKind::Comment,
            message: format!(
                "{} commented on your story \"{}\"",
                commenter.username, post.title
            ),
            link: Some(format!("/posts/{}", post.id)),
        })?;
        Ok(())
    }

    /// Tell a post's author someone liked it
    pub fn post_liked(&self, liker: &User, post: &Post) -> Result<()> {
        if liker.id == post.author_id {
            return Ok(());
        }
        self.notifications().create(&NewNotification {
            recipient_id: post.author_id,
            sender_id: Some(liker.id),
            kind: NotificationKind::Like,
            message: format!("{} liked your story \"{}\"", liker.username, post.title),
            link: Some(format!("/posts/{}", post.id)),
        })?;
        Ok(())
    }

    /// Tell a user they gained a follower
    pub fn user_followed(&self, follower: &User, followed_id: &Uuid) -> Result<()> {
        self.notifications().create(&NewNotification {
            recipient_id: *followed_id,
            sender_id: Some(follower.id),
            kind: NotificationKind::Follow,
            message: format!("{} started following you", follower.username),
            link: Some(format!("/profile/{}", follower.username)),
        })?;
        Ok(())
    }
}

/// Project hub engagement: comment threading and counters
///
/// Comments nest one level deep. A reply to a reply is attached to the root
/// of that thread instead, and the thread view is rebuilt from the flat list
/// on every read. Counters are recomputed inside the write transaction and
/// returned to the caller as the authoritative value.

use serde::Serialize;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::comment::{Comment, CommentRef, CreateComment};
use crate::models::project::Project;

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("Project not found")]
    ProjectNotFound,

    #[error("Comment being replied to does not exist")]
    ReplyTargetNotFound,

    #[error("Cannot reply to a comment on another project")]
    CrossProjectReply,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A root comment with its replies, both in creation order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Groups a flat, creation-ordered list into threads.
///
/// A reply whose parent is not in the list is shown as a root. Roots and
/// replies are both ordered by `(created_at, id)`.
pub fn group_threads(comments: Vec<Comment>) -> Vec<CommentThread> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

    let mut threads: Vec<CommentThread> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut pending: Vec<(Uuid, Comment)> = Vec::new();

    for comment in comments {
        match comment.reply_to {
            Some(parent) if ids.contains(&parent) && parent != comment.id => {
                pending.push((parent, comment));
            }
            _ => {
                index.insert(comment.id, threads.len());
                threads.push(CommentThread {
                    comment,
                    replies: Vec::new(),
                });
            }
        }
    }

    for (parent, reply) in pending {
        match index.get(&parent) {
            Some(&i) => threads[i].replies.push(reply),
            // Parent is itself a reply; stored data predates re-parenting
            None => {
                let root = threads
                    .iter()
                    .position(|t| t.replies.iter().any(|r| r.id == parent));
                match root {
                    Some(i) => threads[i].replies.push(reply),
                    None => {
                        index.insert(reply.id, threads.len());
                        threads.push(CommentThread {
                            comment: reply,
                            replies: Vec::new(),
                        });
                    }
                }
            }
        }
    }

    for thread in &mut threads {
        thread.replies.sort_by(creation_order);
    }
    threads.sort_by(|a, b| creation_order(&a.comment, &b.comment));

    threads
}

fn creation_order(a: &Comment, b: &Comment) -> std::cmp::Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}

/// Resolves the stored parent for a new comment.
///
/// Replying to a reply re-parents to that reply's root.
pub fn resolve_reply_parent(project_id: Uuid, target: &CommentRef) -> Result<Uuid, SocialError> {
    if target.project_id != project_id {
        return Err(SocialError::CrossProjectReply);
    }

    Ok(target.reply_to.unwrap_or(target.id))
}

/// Comment plus the project's new total
#[derive(Debug, Clone, Serialize)]
pub struct CommentAdded {
    pub comment: Comment,
    pub comment_count: i32,
}

pub async fn add_comment(
    pool: &PgPool,
    project_id: Uuid,
    user_id: Uuid,
    text: String,
    reply_to: Option<Uuid>,
) -> Result<CommentAdded, SocialError> {
    let reply_to = match reply_to {
        Some(target_id) => {
            let target = Comment::find_ref(pool, target_id)
                .await?
                .ok_or(SocialError::ReplyTargetNotFound)?;
            Some(resolve_reply_parent(project_id, &target)?)
        }
        None => None,
    };

    let mut tx = pool.begin().await?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(SocialError::ProjectNotFound);
    }

    let comment = Comment::create(
        &mut *tx,
        CreateComment {
            project_id,
            user_id,
            text,
            reply_to,
        },
    )
    .await?;
    let comment_count = Project::refresh_comment_count(&mut *tx, project_id).await?;

    tx.commit().await?;

    Ok(CommentAdded {
        comment,
        comment_count,
    })
}

/// Accepts only absolute http(s) links.
pub fn is_http_url(link: &str) -> bool {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"));

    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

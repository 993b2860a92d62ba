//! Topology-aware event naming.
//!
//! Post events are stored under names that say what kind of post they
//! touched: a reaction to a reply is `CommentReplyReactionCreated`, not
//! `PostReactionCreated`.

use crate::types::entities::Post;
use crate::types::EventName;

/// Position of a post in a discussion tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// No root post.
    Regular,
    /// Root post, no parent.
    Comment,
    /// Root and parent post.
    Reply,
}

impl Topology {
    /// A parent without a root is not a valid tree position and is named
    /// as a regular post.
    pub fn of(post: &Post) -> Self {
        if post.is_reply() {
            Topology::Reply
        } else if post.is_top_level_comment() {
            Topology::Comment
        } else {
            Topology::Regular
        }
    }
}

fn by_topology(topology: Topology, regular: EventName, comment: EventName, reply: EventName) -> EventName {
    match topology {
        Topology::Regular => regular,
        Topology::Comment => comment,
        Topology::Reply => reply,
    }
}

/// Stored name for `raw` applied to `post`. Total: names without a
/// topology-specific form pass through unchanged.
pub fn synthetic_event_name(raw: EventName, post: &Post) -> EventName {
    use EventName::*;

    let topology = Topology::of(post);
    match raw {
        PostCreated => by_topology(topology, PostCreated, CommentCreated, CommentReplyCreated),
        PostUpdated => by_topology(topology, PostUpdated, CommentUpdated, CommentReplyUpdated),
        PostFollowed => by_topology(topology, PostFollowed, CommentFollowed, CommentFollowed),
        PostUnfollowed => by_topology(topology, PostUnfollowed, CommentUnfollowed, CommentUnfollowed),
        PostReactionCreated => by_topology(
            topology,
            PostReactionCreated,
            CommentReactionCreated,
            CommentReplyReactionCreated,
        ),
        PostReactionUpdated => by_topology(
            topology,
            PostReactionUpdated,
            CommentReactionUpdated,
            CommentReplyReactionUpdated,
        ),
        PostReactionDeleted => by_topology(
            topology,
            PostReactionDeleted,
            CommentReactionDeleted,
            CommentReplyReactionDeleted,
        ),
        // Moving a post out of every space hides it.
        PostMoved if post.space_id.is_some() => PostMoved,
        PostMoved => by_topology(topology, PostDeleted, CommentDeleted, CommentReplyDeleted),
        other => other,
    }
}

mod cascade;
pub use cascade::{cascade_delete, collect_subtree, delete_subtree, CascadeReport};

mod comment;
pub use comment::Comment;

mod config;
pub use config::SurfaceConfig;

mod error;
pub use error::Error;

mod normalize;
pub use normalize::Normalizer;

mod reply;
pub use reply::{is_blank, ReplyState};

mod session;
pub use session::{Control, LiveView, Session};

mod tree;
pub use tree::CommentTree;

mod fuzz;

pub mod api {
    pub use threadline_api::*;
}

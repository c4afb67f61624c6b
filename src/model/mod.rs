pub mod board;
pub mod card;
pub mod config;

pub use board::{Board, BoardList};
pub use card::{Attachment, Badges, Card, CardComment, Label};
pub use config::Config;

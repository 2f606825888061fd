//! Sync engines and the pure logic around them.

pub mod conversations;
pub mod live_list;
pub mod messages;
pub mod pagination;
pub mod participants;
pub mod preview;
pub mod services;
pub mod time_format;
pub mod traits;
pub mod translation;
pub mod unread;

pub mod analysis;
pub mod chat;
pub mod common;
pub mod content;
pub mod speech;
pub mod video;

pub use analysis::*;
pub use chat::*;
pub use common::*;
pub use content::*;
pub use speech::*;
pub use video::*;

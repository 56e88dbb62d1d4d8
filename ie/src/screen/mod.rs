pub mod celebration;
pub mod collectible;
pub mod emblem;
pub mod narration;

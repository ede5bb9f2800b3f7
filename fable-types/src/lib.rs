pub mod enums;
pub mod models;
pub mod page;

pub use enums::*;
pub use models::*;
pub use page::*;

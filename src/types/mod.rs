pub mod identity;
pub mod phase;
pub mod table;

pub use identity::*;
pub use phase::*;
pub use table::*;

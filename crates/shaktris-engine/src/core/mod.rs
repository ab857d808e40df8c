pub use self::{board::*, piece::*};

pub(crate) mod board;
pub mod legality;
pub(crate) mod piece;

pub mod card;
pub mod table;

pub use card::{Colors, Display};
pub use table::{ALL_FIELDS, CardTable};

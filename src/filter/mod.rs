pub mod source;
pub mod spec;

pub use source::{CardSource, SourceError, resolve_lists};
pub use spec::{CardPredicate, CardStatus, FilterError, FilterSpec};

pub mod date;
pub mod url;

pub mod cli;
pub mod display;
pub mod filter;
pub mod interact;
pub mod model;
pub mod remote;
pub mod review;
pub mod util;
pub mod view;

pub mod frame;
pub mod parse;

pub mod check;
pub mod generate;
pub mod info;
pub mod probe;
pub mod validate;

pub mod grants;
pub mod market;

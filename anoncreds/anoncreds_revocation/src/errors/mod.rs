pub mod error;
mod mapping_cl;
mod mapping_others;

pub mod closure;
pub mod collection;
pub mod error;
pub mod mod_dto;
pub mod paths;
pub mod tree;
pub mod view;

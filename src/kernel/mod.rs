pub mod assertion;
pub mod code;
pub mod database;
pub mod frame;
pub mod proof;
pub mod scope;
pub mod symbol;

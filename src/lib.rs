pub mod document;
pub mod editor;
pub mod keys;
pub mod logger;
pub mod row;
pub mod screen;
pub mod search;
pub mod syntax;
pub mod terminal;

pub mod action;
pub mod event;
pub mod history;
pub mod input;
pub mod policy;
pub mod protocol;
pub mod view;

pub mod orders;
pub mod webhook;

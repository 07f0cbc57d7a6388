//! Button sources, GPIO initialisation and deep-sleep pin handling.

pub mod button;
pub mod hw_init;

/// GeoCam core: capture, location, gallery storage, export and the offline
/// shell cache, behind platform capability traits. The iced front end in
/// `main.rs` drives these.

pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod location;
pub mod native;
pub mod offline;
pub mod platform;
pub mod state;

#[cfg(test)]
mod testing;

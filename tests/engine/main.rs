#[path = "../common/mod.rs"]
mod common;

mod group_delete;
mod group_update;

// src/services/core/mod.rs

pub mod economy;
pub mod infrastructure;
pub mod ledger;

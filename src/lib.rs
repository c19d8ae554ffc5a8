// Library for tests to access modules

pub mod cli;
pub mod config;
pub mod delta;
pub mod devset;
pub mod matcher;
pub mod models;
pub mod monitor;
pub mod netnames;
pub mod report;
pub mod resolver;
pub mod sysinfo_repo;
pub mod version;

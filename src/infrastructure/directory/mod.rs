//! Directory collaborators over REST

mod config;
mod normalize;
mod rest;

pub use self::config::DirectoryConfig;
pub use rest::{RestMemberDirectory, RestPcpWriter, RestProviderDirectory};

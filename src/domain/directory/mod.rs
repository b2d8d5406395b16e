//! Provider and member directory models and traits

mod member;
mod provider;
mod query;
mod traits;

pub use member::{
    AddPcpRequest, MemberKeys, MemberProfile, PcpAssignment, SearchContext, TerminatePcpRequest,
};
pub use provider::{
    render_provider_addresses, render_provider_list, ProviderAddress, ProviderListItem,
    ProviderRecord,
};
pub use query::{ProviderQuery, ResolvedSearch, SearchDefaults, SearchType};
pub use traits::{MemberDirectory, PcpWriter, ProviderDirectory};

#[cfg(test)]
pub use traits::mock::{MockMemberDirectory, MockProviderDirectory};
#[cfg(test)]
pub use traits::MockPcpWriter;

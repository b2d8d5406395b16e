//! Directory collaborator traits

use async_trait::async_trait;
use std::fmt::Debug;

use super::{
    AddPcpRequest, MemberKeys, MemberProfile, PcpAssignment, ProviderAddress, ProviderRecord,
    ResolvedSearch, SearchContext, TerminatePcpRequest,
};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read access to the provider directory
#[async_trait]
pub trait ProviderDirectory: Send + Sync + Debug {
    /// PCP search keyed by id, name/city/state or ZIP
    async fn search(
        &self,
        search: &ResolvedSearch,
        context: &SearchContext,
    ) -> Result<Vec<ProviderRecord>, DomainError>;

    /// Specialist search around a ZIP code
    async fn search_specialists(
        &self,
        specialty: &str,
        search: &ResolvedSearch,
        context: &SearchContext,
    ) -> Result<Vec<ProviderRecord>, DomainError>;

    /// Addresses on file for a provider as of a `YYYYMMDD` date
    async fn provider_addresses(
        &self,
        provider_id: &str,
        as_of_date: &str,
    ) -> Result<Vec<ProviderAddress>, DomainError>;
}

/// Read access to member cases
#[async_trait]
pub trait MemberDirectory: Send + Sync + Debug {
    async fn lookup_member(&self, member_id: &str) -> Result<MemberProfile, DomainError>;

    /// PCP in effect for the member on the given date
    async fn current_pcp(
        &self,
        member: &MemberKeys,
        as_of: chrono::NaiveDate,
    ) -> Result<Option<PcpAssignment>, DomainError>;
}

/// Writes against the member's PCP record.
///
/// Implementations make exactly one attempt per call.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PcpWriter: Send + Sync {
    async fn terminate_pcp(&self, request: &TerminatePcpRequest) -> Result<(), DomainError>;

    async fn add_pcp(&self, request: &AddPcpRequest) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Provider directory returning canned results
    #[derive(Debug, Default)]
    pub struct MockProviderDirectory {
        providers: Vec<ProviderRecord>,
        addresses: Vec<ProviderAddress>,
        error: Option<String>,
        search_calls: AtomicUsize,
        last_search: Mutex<Option<ResolvedSearch>>,
        last_specialty: Mutex<Option<String>>,
    }

    impl MockProviderDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_providers(mut self, providers: Vec<ProviderRecord>) -> Self {
            self.providers = providers;
            self
        }

        pub fn with_addresses(mut self, addresses: Vec<ProviderAddress>) -> Self {
            self.addresses = addresses;
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }

        pub fn last_search(&self) -> Option<ResolvedSearch> {
            self.last_search.lock().unwrap().clone()
        }

        pub fn last_specialty(&self) -> Option<String> {
            self.last_specialty.lock().unwrap().clone()
        }

        fn record(&self, search: &ResolvedSearch) -> Result<Vec<ProviderRecord>, DomainError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_search.lock().unwrap() = Some(search.clone());

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-directory", error));
            }

            Ok(self.providers.clone())
        }
    }

    #[async_trait]
    impl ProviderDirectory for MockProviderDirectory {
        async fn search(
            &self,
            search: &ResolvedSearch,
            _context: &SearchContext,
        ) -> Result<Vec<ProviderRecord>, DomainError> {
            self.record(search)
        }

        async fn search_specialists(
            &self,
            specialty: &str,
            search: &ResolvedSearch,
            _context: &SearchContext,
        ) -> Result<Vec<ProviderRecord>, DomainError> {
            *self.last_specialty.lock().unwrap() = Some(specialty.to_string());
            self.record(search)
        }

        async fn provider_addresses(
            &self,
            provider_id: &str,
            _as_of_date: &str,
        ) -> Result<Vec<ProviderAddress>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-directory", error));
            }

            Ok(self
                .addresses
                .iter()
                .filter(|a| a.provider_id == provider_id)
                .cloned()
                .collect())
        }
    }

    /// Member directory with a fixed profile and a settable current PCP
    #[derive(Debug, Default)]
    pub struct MockMemberDirectory {
        profile: Option<MemberProfile>,
        current: Mutex<Option<PcpAssignment>>,
        lookup_error: Option<String>,
    }

    impl MockMemberDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_profile(mut self, profile: MemberProfile) -> Self {
            *self.current.get_mut().unwrap() = profile.current_pcp.clone();
            self.profile = Some(profile);
            self
        }

        pub fn with_lookup_error(mut self, error: impl Into<String>) -> Self {
            self.lookup_error = Some(error.into());
            self
        }

        pub fn set_current_pcp(&self, assignment: Option<PcpAssignment>) {
            *self.current.lock().unwrap() = assignment;
        }
    }

    #[async_trait]
    impl MemberDirectory for MockMemberDirectory {
        async fn lookup_member(&self, member_id: &str) -> Result<MemberProfile, DomainError> {
            if let Some(ref error) = self.lookup_error {
                return Err(DomainError::provider("mock-members", error));
            }

            self.profile
                .clone()
                .filter(|p| p.member_id == member_id)
                .ok_or_else(|| DomainError::not_found(format!("Member '{}' not found", member_id)))
        }

        async fn current_pcp(
            &self,
            _member: &MemberKeys,
            _as_of: chrono::NaiveDate,
        ) -> Result<Option<PcpAssignment>, DomainError> {
            Ok(self.current.lock().unwrap().clone())
        }
    }
}

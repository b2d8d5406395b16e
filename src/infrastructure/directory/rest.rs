//! REST adapters for the provider directory, member system and PCP writes

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::config::DirectoryConfig;
use super::normalize;
use crate::domain::directory::{
    AddPcpRequest, MemberDirectory, MemberKeys, MemberProfile, PcpAssignment, PcpWriter,
    ProviderAddress, ProviderDirectory, ProviderRecord, ResolvedSearch, SearchContext, SearchType,
    TerminatePcpRequest,
};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;
use crate::infrastructure::observability::record_directory_request;

const DATE_FORMAT: &str = "%Y%m%d";

/// Shared plumbing for the three adapters
#[derive(Debug)]
struct DirectoryClient<C: HttpClientTrait> {
    client: C,
    config: Arc<DirectoryConfig>,
}

impl<C: HttpClientTrait> DirectoryClient<C> {
    async fn post(&self, operation: &str, path: &str, body: &Value) -> Result<Value, DomainError> {
        let url = self.config.url(path);
        let headers: Vec<(&str, &str)> = match self.config.api_key.as_deref() {
            Some(key) => vec![("x-api-key", key)],
            None => Vec::new(),
        };

        timed(operation, self.client.post_json(&url, headers, body))
            .await
            .map_err(|e| e.with_provider(operation))
    }
}

async fn timed<F>(operation: &str, call: F) -> Result<Value, DomainError>
where
    F: Future<Output = Result<Value, DomainError>>,
{
    let start = Instant::now();
    let result = call.await;

    record_directory_request(operation, result.is_ok(), start.elapsed());

    match &result {
        Ok(_) => tracing::debug!(
            operation,
            latency_ms = start.elapsed().as_millis() as u64,
            "Directory call completed"
        ),
        Err(e) => tracing::warn!(operation, error = %e, "Directory call failed"),
    }

    result
}

/// Provider directory over the search REST endpoints
#[derive(Debug)]
pub struct RestProviderDirectory<C: HttpClientTrait> {
    inner: DirectoryClient<C>,
}

impl<C: HttpClientTrait> RestProviderDirectory<C> {
    pub fn new(client: C, config: Arc<DirectoryConfig>) -> Self {
        Self {
            inner: DirectoryClient { client, config },
        }
    }

    /// Search payload with the configured defaults filled in
    fn search_payload(&self, search: &ResolvedSearch, context: &SearchContext) -> Map<String, Value> {
        let config = &self.inner.config;
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();

        let mut body = Map::new();
        body.insert("id".into(), json!(opt(&search.provider_id)));
        body.insert(
            "startingLocationZip".into(),
            json!(opt(&search.zip)),
        );
        body.insert(
            "startingLocationAddr1".into(),
            json!(config.starting_location_addr1),
        );
        body.insert("memberId".into(), json!(opt(&context.member_id)));
        body.insert(
            "memberOverrideClass".into(),
            json!(config.member_override_class),
        );
        body.insert(
            "memberOverridePlan".into(),
            json!(config.member_override_plan),
        );
        body.insert(
            "generalDescription".into(),
            json!(config.general_description),
        );
        body.insert("limit".into(), json!(config.limit));
        body.insert("offset".into(), json!(config.offset));
        body.insert("asOfDate".into(), json!(search.as_of_date));
        body.insert("onlyPcps".into(), json!(config.only_pcps));
        body.insert("groupId".into(), json!(opt(&context.group_id)));
        body.insert("subscriberId".into(), json!(opt(&context.subscriber_id)));

        match search.search_type {
            SearchType::Id => {}
            SearchType::NameCityState => {
                body.insert("providerName".into(), json!(opt(&search.name)));
                body.insert("city".into(), json!(opt(&search.city)));
                body.insert("state".into(), json!(opt(&search.state)));
            }
            SearchType::ZipOnly => {
                body.insert("radiusInMiles".into(), json!(search.radius_miles));
            }
        }

        if let Some(ref language) = search.language {
            body.insert("language".into(), json!(language));
        }
        if let Some(ref gender) = search.gender {
            body.insert("gender".into(), json!(gender));
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> ProviderDirectory for RestProviderDirectory<C> {
    async fn search(
        &self,
        search: &ResolvedSearch,
        context: &SearchContext,
    ) -> Result<Vec<ProviderRecord>, DomainError> {
        let config = &self.inner.config;
        let (operation, path) = match search.search_type {
            SearchType::Id => ("ProviderSearchById", &config.search_by_id_path),
            SearchType::NameCityState => ("ProviderSearchByName", &config.search_by_name_path),
            SearchType::ZipOnly => ("ProviderSearchByZip", &config.search_by_zip_path),
        };

        let body = Value::Object(self.search_payload(search, context));
        let payload = self.inner.post(operation, path, &body).await?;

        Ok(normalize::provider_records(&payload))
    }

    async fn search_specialists(
        &self,
        specialty: &str,
        search: &ResolvedSearch,
        context: &SearchContext,
    ) -> Result<Vec<ProviderRecord>, DomainError> {
        let mut body = self.search_payload(search, context);
        body.insert("onlyPcps".into(), json!("N"));
        body.insert("specialty".into(), json!(specialty));
        body.insert("radiusInMiles".into(), json!(search.radius_miles));

        let payload = self
            .inner
            .post(
                "SpecialistSearch",
                &self.inner.config.specialist_search_path,
                &Value::Object(body),
            )
            .await?;

        Ok(normalize::provider_records(&payload))
    }

    async fn provider_addresses(
        &self,
        provider_id: &str,
        as_of_date: &str,
    ) -> Result<Vec<ProviderAddress>, DomainError> {
        let body = json!({
            "providerId": provider_id,
            "asOfDate": as_of_date,
        });

        let payload = self
            .inner
            .post(
                "ProviderAddress",
                &self.inner.config.provider_address_path,
                &body,
            )
            .await?;

        Ok(normalize::provider_addresses(provider_id, &payload))
    }
}

fn member_body(member: &MemberKeys) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("groupId".into(), json!(member.group_id));
    body.insert("subscriberId".into(), json!(member.subscriber_id));
    if let Some(ref suffix) = member.member_suffix {
        body.insert("memberSuffix".into(), json!(suffix));
    }
    if let Some(ref key) = member.member_key {
        body.insert("memberKey".into(), json!(key));
    }
    body
}

/// Member lookups over the member REST endpoints
#[derive(Debug)]
pub struct RestMemberDirectory<C: HttpClientTrait> {
    inner: DirectoryClient<C>,
}

impl<C: HttpClientTrait> RestMemberDirectory<C> {
    pub fn new(client: C, config: Arc<DirectoryConfig>) -> Self {
        Self {
            inner: DirectoryClient { client, config },
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> MemberDirectory for RestMemberDirectory<C> {
    async fn lookup_member(&self, member_id: &str) -> Result<MemberProfile, DomainError> {
        let payload = self
            .inner
            .post(
                "MemberLookup",
                &self.inner.config.member_lookup_path,
                &json!({"memberId": member_id}),
            )
            .await?;

        normalize::member_profile(member_id, &payload)
    }

    async fn current_pcp(
        &self,
        member: &MemberKeys,
        as_of: NaiveDate,
    ) -> Result<Option<PcpAssignment>, DomainError> {
        let mut body = member_body(member);
        body.insert("asOfDate".into(), json!(as_of.format(DATE_FORMAT).to_string()));

        let payload = self
            .inner
            .post(
                "VerifyPCP",
                &self.inner.config.current_pcp_path,
                &Value::Object(body),
            )
            .await?;

        Ok(normalize::pcp_assignment(&payload))
    }
}

/// PCP terminate/add over REST; the client must not retry
#[derive(Debug)]
pub struct RestPcpWriter<C: HttpClientTrait> {
    inner: DirectoryClient<C>,
}

impl<C: HttpClientTrait> RestPcpWriter<C> {
    pub fn new(client: C, config: Arc<DirectoryConfig>) -> Self {
        Self {
            inner: DirectoryClient { client, config },
        }
    }

    async fn write(&self, operation: &str, path: &str, body: Map<String, Value>) -> Result<(), DomainError> {
        let payload = self.inner.post(operation, path, &Value::Object(body)).await?;

        match payload.get("success") {
            Some(Value::Bool(false)) => {
                let message = normalize::text(payload.get("message"))
                    .unwrap_or_else(|| "Request rejected".to_string());
                Err(DomainError::provider(operation, message))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> PcpWriter for RestPcpWriter<C> {
    async fn terminate_pcp(&self, request: &TerminatePcpRequest) -> Result<(), DomainError> {
        let mut body = member_body(&request.member);
        body.insert("providerId".into(), json!(request.provider_id));
        body.insert(
            "terminationDate".into(),
            json!(request.termination_date.format(DATE_FORMAT).to_string()),
        );
        if let Some(ref reason) = request.reason {
            body.insert("reason".into(), json!(reason));
        }

        self.write("TerminatePCP", &self.inner.config.terminate_pcp_path, body)
            .await
    }

    async fn add_pcp(&self, request: &AddPcpRequest) -> Result<(), DomainError> {
        let mut body = member_body(&request.member);
        body.insert("providerId".into(), json!(request.provider_id));
        body.insert(
            "effectiveDate".into(),
            json!(request.effective_date.format(DATE_FORMAT).to_string()),
        );
        if let Some(ref reason) = request.reason {
            body.insert("reason".into(), json!(reason));
        }

        self.write("AddPCP", &self.inner.config.add_pcp_path, body).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::http::{HttpClient, MockHttpClient, RetryPolicy};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> Arc<DirectoryConfig> {
        Arc::new(DirectoryConfig {
            base_url: base.to_string(),
            ..DirectoryConfig::default()
        })
    }

    fn context() -> SearchContext {
        SearchContext {
            member_id: Some("M1".to_string()),
            group_id: Some("G1".to_string()),
            subscriber_id: Some("S1".to_string()),
        }
    }

    fn by_id(id: &str) -> ResolvedSearch {
        ResolvedSearch {
            search_type: SearchType::Id,
            provider_id: Some(id.to_string()),
            name: None,
            city: None,
            state: None,
            zip: None,
            as_of_date: "20260305".to_string(),
            radius_miles: 25,
            language: None,
            gender: None,
        }
    }

    fn member() -> MemberKeys {
        MemberKeys {
            group_id: "G1".to_string(),
            subscriber_id: "S1".to_string(),
            member_suffix: Some("01".to_string()),
            member_key: None,
        }
    }

    #[tokio::test]
    async fn test_search_by_id_payload() {
        let client = MockHttpClient::new().with_response(
            "http://dir/providers/search/by-id",
            json!({"providerDetails": {"providerInfo": {"providerId": "12345678"}}}),
        );
        let directory = RestProviderDirectory::new(client, config("http://dir"));

        let records = directory.search(&by_id("12345678"), &context()).await.unwrap();

        assert_eq!(records.len(), 1);
        let body = directory.inner.client.last_body().unwrap();
        assert_eq!(body["id"], "12345678");
        assert_eq!(body["asOfDate"], "20260305");
        assert_eq!(body["memberId"], "M1");
        assert_eq!(body["groupId"], "G1");
        assert_eq!(body["subscriberId"], "S1");
        assert_eq!(body["onlyPcps"], "Y");
        assert_eq!(body["limit"], "10");
        assert!(body.get("radiusInMiles").is_none());
    }

    #[tokio::test]
    async fn test_zip_search_sends_radius_and_filters() {
        let client = MockHttpClient::new()
            .with_response("http://dir/providers/search/by-zip", json!({}));
        let directory = RestProviderDirectory::new(client, config("http://dir"));
        let search = ResolvedSearch {
            search_type: SearchType::ZipOnly,
            provider_id: None,
            zip: Some("78701".to_string()),
            radius_miles: 10,
            language: Some("Spanish".to_string()),
            ..by_id("")
        };

        let records = directory.search(&search, &context()).await.unwrap();

        assert!(records.is_empty());
        let body = directory.inner.client.last_body().unwrap();
        assert_eq!(body["startingLocationZip"], "78701");
        assert_eq!(body["radiusInMiles"], 10);
        assert_eq!(body["language"], "Spanish");
    }

    #[tokio::test]
    async fn test_search_failure_names_operation() {
        let client = MockHttpClient::new().with_error(
            "http://dir/providers/search/by-id",
            DomainError::transient("http", "HTTP 503"),
        );
        let directory = RestProviderDirectory::new(client, config("http://dir"));

        let err = directory.search(&by_id("1"), &context()).await.unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("ProviderSearchById"));
    }

    #[tokio::test]
    async fn test_specialist_search() {
        let client = MockHttpClient::new().with_response(
            "http://dir/providers/search/specialists",
            json!({"providerDetails": []}),
        );
        let directory = RestProviderDirectory::new(client, config("http://dir"));
        let search = ResolvedSearch {
            search_type: SearchType::ZipOnly,
            zip: Some("78701".to_string()),
            ..by_id("")
        };

        directory
            .search_specialists("Cardiology", &search, &context())
            .await
            .unwrap();

        let body = directory.inner.client.last_body().unwrap();
        assert_eq!(body["specialty"], "Cardiology");
        assert_eq!(body["onlyPcps"], "N");
        assert_eq!(body["radiusInMiles"], 25);
    }

    #[tokio::test]
    async fn test_current_pcp() {
        let client = MockHttpClient::new().with_response(
            "http://dir/members/pcp/current",
            json!({"pcp": {"providerId": "12345678"}}),
        );
        let directory = RestMemberDirectory::new(client, config("http://dir"));
        let date = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();

        let pcp = directory.current_pcp(&member(), date).await.unwrap();

        assert_eq!(pcp, Some(PcpAssignment::new("12345678")));
        let body = directory.inner.client.last_body().unwrap();
        assert_eq!(body["asOfDate"], "20260306");
        assert_eq!(body["memberSuffix"], "01");
    }

    #[tokio::test]
    async fn test_member_lookup_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/members/lookup"))
            .and(header("x-api-key", "k"))
            .and(body_partial_json(json!({"memberId": "M1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memberId": "M1",
                "groupId": "G1",
                "subscriberId": "S1"
            })))
            .mount(&server)
            .await;
        let config = Arc::new(DirectoryConfig {
            base_url: server.uri(),
            api_key: Some("k".to_string()),
            ..DirectoryConfig::default()
        });
        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let directory = RestMemberDirectory::new(client, config);

        let profile = directory.lookup_member("M1").await.unwrap();

        assert_eq!(profile.group_id.as_deref(), Some("G1"));
        assert_eq!(profile.current_pcp, None);
    }

    #[tokio::test]
    async fn test_writer_makes_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/members/pcp/add"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        let client = HttpClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let writer = RestPcpWriter::new(client, config(&server.uri()));
        let request = AddPcpRequest {
            member: member(),
            provider_id: "12345678".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            reason: None,
        };

        let err = writer.add_pcp(&request).await.unwrap_err();

        assert!(err.to_string().contains("AddPCP"));
    }

    #[tokio::test]
    async fn test_writer_rejection() {
        let client = MockHttpClient::new().with_response(
            "http://dir/members/pcp/terminate",
            json!({"success": false, "message": "Provider not terminable"}),
        );
        let writer = RestPcpWriter::new(client, config("http://dir"));
        let request = TerminatePcpRequest {
            member: member(),
            provider_id: "11111111".to_string(),
            termination_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            reason: Some("Member moved".to_string()),
        };

        let err = writer.terminate_pcp(&request).await.unwrap_err();

        assert!(err.to_string().contains("Provider not terminable"));
        let body = writer.inner.client.last_body().unwrap();
        assert_eq!(body["terminationDate"], "20260305");
        assert_eq!(body["reason"], "Member moved");
    }
}

/// Tenant-id extraction from heterogeneous request shapes
///
/// Clients pass the shelter id, module key and module id in different
/// places depending on the endpoint: path parameters, the query string, a
/// JSON body, or not at all (when the route targets a record by id). This
/// module resolves them from a transport-neutral [`RequestView`] by trying
/// ordered [`Source`]s.
///
/// # Resolution order
///
/// | Field | Sources, first match wins |
/// |---|---|
/// | shelter id | path `shelterId`, path `shelter`, query `shelterId`, body `shelterId`, reverse lookup |
/// | module key | route declaration, path `moduleKey`, query `moduleKey`, body `moduleKey` |
/// | module id | path `moduleId`, path `id`, query `moduleId`, body `moduleId` |
///
/// Body sources are only consulted when the body is readable: multipart and
/// octet-stream bodies are consumed by the handler and are never parsed
/// before it, so uploads must carry the shelter id in the path or query.
///
/// Empty values count as absent. For ids, the first non-empty value wins;
/// if it is not a UUID the id is absent.
///
/// # Reverse lookup
///
/// When no shelter id is found but the path has an `id` parameter, the path
/// is classified (animals, resources, sheltered people, volunteers) and the
/// targeted record's shelter is looked up. A missing record leaves the
/// shelter id absent. A storage error does the same: it is logged and
/// counted in [`GateMetrics`] but never fails extraction.

use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use super::metrics::GateMetrics;
use crate::models::record::{RecordFamily, ResourceFamily};
use crate::models::shelter_module::ModuleKey;
use crate::store::TenantStore;

/// Transport-neutral snapshot of the parts of a request the gate reads
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    pub path: String,
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    /// Parsed JSON body, if one was buffered
    pub body: Option<serde_json::Value>,
}

impl RequestView {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// True unless the body is absent or a streamed (multipart/binary) payload
    pub fn body_readable(&self) -> bool {
        if self.body.is_none() {
            return false;
        }
        match self.content_type.as_deref() {
            Some(ct) => !is_streamed_content_type(ct),
            None => true,
        }
    }
}

/// Content types whose bodies belong to the handler alone
pub fn is_streamed_content_type(content_type: &str) -> bool {
    let ct = content_type.trim().to_ascii_lowercase();
    ct.starts_with("multipart/") || ct.starts_with("application/octet-stream")
}

/// One place a value can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Path(&'static str),
    Query(&'static str),
    Body(&'static str),
}

impl Source {
    /// Whether this source may be consulted for the request
    pub fn is_available(&self, view: &RequestView) -> bool {
        match self {
            Source::Path(_) | Source::Query(_) => true,
            Source::Body(_) => view.body_readable(),
        }
    }

    /// Reads the raw value; empty strings and non-string body fields are absent
    pub fn read<'a>(&self, view: &'a RequestView) -> Option<&'a str> {
        if !self.is_available(view) {
            return None;
        }
        let value = match self {
            Source::Path(name) => view.path_params.get(*name).map(String::as_str),
            Source::Query(name) => view.query.get(*name).map(String::as_str),
            Source::Body(name) => view
                .body
                .as_ref()
                .and_then(|b| b.get(*name))
                .and_then(|v| v.as_str()),
        };
        value.filter(|v| !v.is_empty())
    }
}

pub const SHELTER_ID_SOURCES: &[Source] = &[
    Source::Path("shelterId"),
    Source::Path("shelter"),
    Source::Query("shelterId"),
    Source::Body("shelterId"),
];

pub const MODULE_KEY_SOURCES: &[Source] = &[
    Source::Path("moduleKey"),
    Source::Query("moduleKey"),
    Source::Body("moduleKey"),
];

pub const MODULE_ID_SOURCES: &[Source] = &[
    Source::Path("moduleId"),
    Source::Path("id"),
    Source::Query("moduleId"),
    Source::Body("moduleId"),
];

/// First non-empty value across the sources
pub fn first_value<'a>(sources: &[Source], view: &'a RequestView) -> Option<&'a str> {
    sources.iter().find_map(|s| s.read(view))
}

/// First non-empty value parsed as a UUID
pub fn first_uuid(sources: &[Source], view: &RequestView) -> Option<Uuid> {
    first_value(sources, view).and_then(|v| Uuid::parse_str(v).ok())
}

/// Identifiers resolved for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedParams {
    pub shelter_id: Option<Uuid>,
    pub module_key: Option<String>,
    pub module_id: Option<Uuid>,
}

/// Maps a request path to the family its `id` parameter refers to
pub fn classify_path(path: &str) -> Option<ResourceFamily> {
    let path = path.to_ascii_lowercase();
    let families = [
        ("/animals/", ResourceFamily::Record(RecordFamily::Animals)),
        ("/resources/", ResourceFamily::Record(RecordFamily::Resources)),
        (
            "/sheltered-people/",
            ResourceFamily::Record(RecordFamily::ShelteredPeople),
        ),
        ("/volunteers/", ResourceFamily::Volunteer),
    ];

    families
        .into_iter()
        .find(|(segment, _)| path.contains(segment))
        .map(|(_, family)| family)
}

/// Shelter id from the request itself, without any store access
pub fn direct_shelter_id(view: &RequestView) -> Option<Uuid> {
    first_uuid(SHELTER_ID_SOURCES, view)
}

/// Resolves shelter id, module key and module id for a request
///
/// Performs at most one store lookup and never mutates anything.
pub async fn extract_params(
    store: &dyn TenantStore,
    view: &RequestView,
    declared_key: Option<ModuleKey>,
    metrics: &GateMetrics,
) -> ExtractedParams {
    let mut shelter_id = direct_shelter_id(view);

    if shelter_id.is_none() {
        shelter_id = reverse_lookup(store, view, metrics).await;
    }

    let module_key = declared_key
        .map(|k| k.as_str().to_string())
        .or_else(|| first_value(MODULE_KEY_SOURCES, view).map(str::to_string));

    ExtractedParams {
        shelter_id,
        module_key,
        module_id: first_uuid(MODULE_ID_SOURCES, view),
    }
}

async fn reverse_lookup(
    store: &dyn TenantStore,
    view: &RequestView,
    metrics: &GateMetrics,
) -> Option<Uuid> {
    let raw_id = Source::Path("id").read(view)?;
    let family = classify_path(&view.path)?;
    let id = Uuid::parse_str(raw_id).ok()?;

    match store.shelter_id_of(family, id).await {
        Ok(shelter_id) => shelter_id,
        Err(e) => {
            metrics.record_reverse_lookup_failure();
            warn!(
                error = %e,
                path = %view.path,
                resource_id = %id,
                "Reverse shelter lookup failed; continuing without shelter id"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_param_wins_over_query_and_body() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let view = RequestView::new("/v1/shelters/x")
            .with_path_param("shelterId", a.to_string())
            .with_query_param("shelterId", b.to_string())
            .with_json_body(json!({ "shelterId": b.to_string() }));

        assert_eq!(direct_shelter_id(&view), Some(a));
    }

    #[test]
    fn test_shelter_alias_param() {
        let a = Uuid::new_v4();
        let view = RequestView::new("/x").with_path_param("shelter", a.to_string());
        assert_eq!(direct_shelter_id(&view), Some(a));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let a = Uuid::new_v4();
        let view = RequestView::new("/x")
            .with_query_param("shelterId", "")
            .with_json_body(json!({ "shelterId": a.to_string() }));

        assert_eq!(direct_shelter_id(&view), Some(a));
    }

    #[test]
    fn test_multipart_body_is_never_read() {
        let a = Uuid::new_v4();
        let view = RequestView::new("/v1/animals")
            .with_content_type("multipart/form-data; boundary=xyz")
            .with_json_body(json!({ "shelterId": a.to_string() }));

        assert!(!view.body_readable());
        assert_eq!(direct_shelter_id(&view), None);
    }

    #[test]
    fn test_invalid_uuid_is_absent() {
        let view = RequestView::new("/x").with_query_param("shelterId", "not-a-uuid");
        assert_eq!(direct_shelter_id(&view), None);
    }

    #[test]
    fn test_non_string_body_field_is_absent() {
        let view = RequestView::new("/x").with_json_body(json!({ "shelterId": 42 }));
        assert_eq!(direct_shelter_id(&view), None);
    }

    #[test]
    fn test_classify_path() {
        assert_eq!(
            classify_path("/v1/Animals/123"),
            Some(ResourceFamily::Record(RecordFamily::Animals))
        );
        assert_eq!(
            classify_path("/v1/sheltered-people/123"),
            Some(ResourceFamily::Record(RecordFamily::ShelteredPeople))
        );
        assert_eq!(classify_path("/v1/volunteers/123"), Some(ResourceFamily::Volunteer));
        assert_eq!(classify_path("/v1/reports/123"), None);
        // collection paths have no trailing segment separator
        assert_eq!(classify_path("/v1/animals"), None);
    }

    #[test]
    fn test_module_id_prefers_module_id_param() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let view = RequestView::new("/x")
            .with_path_param("moduleId", a.to_string())
            .with_path_param("id", b.to_string());

        assert_eq!(first_uuid(MODULE_ID_SOURCES, &view), Some(a));
    }
}

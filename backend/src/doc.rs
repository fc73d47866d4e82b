//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the harbor ingestion endpoint, the health probes and
//! the wire schemas they use. The document is served by Swagger UI in debug
//! builds and exported via `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::inbound::http::harbors::{ErrorBody, HarborBatch, HarborPayload, MessageBody};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Harbor ingestion API",
        description = "Bulk insert-or-update of harbors keyed by UN/LOCODE."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::harbors::upsert_harbors,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(HarborBatch, HarborPayload, MessageBody, ErrorBody)),
    tags(
        (name = "harbors", description = "Harbor batch ingestion"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/harbors")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn documents_every_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("HarborPayload", "coordinates")]
    #[case("HarborPayload", "unlocs")]
    #[case("MessageBody", "message")]
    #[case("ErrorBody", "error")]
    fn schemas_expose_wire_fields(#[case] schema: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let found = schemas.get(schema).expect("schema registered");
        assert_object_schema_has_field(found, field);
    }
}

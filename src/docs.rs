//! OpenAPI documentation.
//!
//! [`ApiDoc`] collects the annotated handlers and response schemas. The
//! router serves it as JSON at [`OPENAPI_JSON_PATH`] and renders Swagger UI
//! at [`DOCS_PATH`].

use utoipa::OpenApi;

use crate::errors::ErrorResponse;
use crate::http::handlers::HelloResponse;

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_JSON_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        description = "Greeting endpoint and authentication proxy."
    ),
    paths(
        crate::http::handlers::root,
        crate::http::handlers::auth_proxy,
    ),
    components(schemas(HelloResponse, ErrorResponse)),
    tags(
        (name = "greeting", description = "Hello world"),
        (name = "auth", description = "Requests relayed to the authentication handler")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::openapi::{schema::Schema, RefOr};

    use super::*;

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

    #[test]
    fn openapi_lists_greeting_and_auth_paths() {
        let doc = ApiDoc::openapi();

        let root = doc.paths.paths.get("/").expect("root path");
        assert!(root.get.is_some());

        let auth = doc.paths.paths.get("/api/auth/{path}").expect("auth path");
        assert!(auth.get.is_some());
        assert!(auth.post.is_some());
        assert!(auth.put.is_some());
        assert!(auth.patch.is_some());
        assert!(auth.delete.is_some());
    }

    #[test]
    fn openapi_title_comes_from_package() {
        assert_eq!(ApiDoc::openapi().info.title, env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn openapi_schemas_have_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;

        assert_object_schema_has_field(schemas.get("HelloResponse").expect("hello"), "message");
        let error = schemas.get("ErrorResponse").expect("error schema");
        assert_object_schema_has_field(error, "error");
        assert_object_schema_has_field(error, "code");
    }
}

//! OpenAPI document for the versioned review API.

use bookreviews_core::{BookReview, ReviewPayload, ReviewSummary};
use utoipa::openapi::Deprecated;
use utoipa::{Modify, OpenApi};

use super::handlers::{reviews, ErrorBody};

/// Path at which the generated document is served.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/v1/openapi.json";
/// Path of the interactive documentation UI.
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
/// Name of the v1 document in the UI's version picker.
pub const SWAGGER_UI_LABEL: &str = "Book Reviews - V1 (deprecated)";

/// Version 1 of the Book Reviews API.
///
/// Paths are listed without prefix; the `/v1` server entry makes the
/// interactive UI call the versioned routes. Version 1 is deprecated, so
/// every operation carries `deprecated: true`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Reviews",
        version = "1.0",
        description = "Create, read, update and delete book reviews, and summarise ratings per title."
    ),
    servers((url = "/v1", description = "Version 1")),
    modifiers(&DeprecatedVersion),
    paths(
        reviews::list_reviews,
        reviews::get_review,
        reviews::review_summary,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
    ),
    components(schemas(BookReview, ReviewPayload, ReviewSummary, ErrorBody)),
    tags((name = "reviews", description = "Book review management"))
)]
pub struct ApiDoc;

/// Marks every operation of the document as deprecated.
struct DeprecatedVersion;

impl Modify for DeprecatedVersion {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for item in openapi.paths.paths.values_mut() {
            for operation in [&mut item.get, &mut item.post, &mut item.put, &mut item.delete]
                .into_iter()
                .flatten()
            {
                operation.deprecated = Some(Deprecated::True);
            }
        }
    }
}

use askama::Template;

use crate::repository::Mapping;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub mappings: Vec<Mapping>,
    pub base_iri: String,
}

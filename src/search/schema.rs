//! Index definition for the product image index.

use serde::Serialize;

pub const KEY_FIELD: &str = "id";
pub const DESCRIPTION_FIELD: &str = "description";
pub const VECTOR_FIELD: &str = "image_vector";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub name: String,
    pub fields: Vec<SearchField>,
    pub vector_search: VectorSearch,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub facetable: bool,
    pub retrievable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VectorSearch {
    pub algorithms: Vec<VectorAlgorithm>,
    pub profiles: Vec<VectorProfile>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VectorAlgorithm {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VectorProfile {
    pub name: String,
    pub algorithm: String,
}

impl IndexSchema {
    /// `id` key, filterable `description`, and a hidden `image_vector` of `dimensions`
    /// floats bound to one HNSW profile.
    pub fn product_images(
        name: &str,
        dimensions: usize,
        profile: &str,
        algorithm: &str,
    ) -> Self {
        let plain = |name: &str, field_type: &str| SearchField {
            name: name.to_string(),
            field_type: field_type.to_string(),
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            retrievable: true,
            dimensions: None,
            vector_search_profile: None,
        };

        let fields = vec![
            SearchField {
                key: true,
                ..plain(KEY_FIELD, "Edm.String")
            },
            SearchField {
                searchable: true,
                filterable: true,
                sortable: true,
                facetable: true,
                ..plain(DESCRIPTION_FIELD, "Edm.String")
            },
            SearchField {
                searchable: true,
                retrievable: false,
                dimensions: Some(dimensions),
                vector_search_profile: Some(profile.to_string()),
                ..plain(VECTOR_FIELD, "Collection(Edm.Single)")
            },
        ];

        Self {
            name: name.to_string(),
            fields,
            vector_search: VectorSearch {
                algorithms: vec![VectorAlgorithm {
                    name: algorithm.to_string(),
                    kind: "hnsw".into(),
                }],
                profiles: vec![VectorProfile {
                    name: profile.to_string(),
                    algorithm: algorithm.to_string(),
                }],
            },
        }
    }
}

//! Cached OpenAPI documents and the lookups the client performs on them.
//!
//! A registry serves either one OpenAPI document or a map of version string to
//! document:
//!
//! ```text
//! { "openapi": "3.1.0", "paths": { ... } }            single
//! { "v1": { "openapi": ... }, "v2": { "openapi": ... } }  versioned
//! ```

use http::Method;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// Operation keys recognized inside a path item.
const OPERATION_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// How many `$ref` hops are inlined before a reference is replaced by `{}`.
const MAX_REF_DEPTH: usize = 8;

/// An OpenAPI document as served by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiDocument {
    root: JsonValue,
    versioned: bool,
}

impl OpenApiDocument {
    /// Wrap a parsed registry payload, detecting the versioned layout.
    pub fn new(root: JsonValue) -> Self {
        let versioned = is_versioned(&root);
        OpenApiDocument { root, versioned }
    }

    /// The payload exactly as served.
    pub fn as_json(&self) -> &JsonValue {
        &self.root
    }

    /// Whether the payload is a version → document map.
    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    /// Every contained document with its version key.
    pub fn documents(&self) -> Vec<(Option<&str>, &JsonValue)> {
        if !self.versioned {
            return vec![(None, &self.root)];
        }
        self.root
            .as_object()
            .map(|versions| {
                versions
                    .iter()
                    .map(|(version, doc)| (Some(version.as_str()), doc))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find the response object declared for `route`, `method` and `status`.
    ///
    /// `route` may use `:name` tokens; the lookup also tries the OpenAPI
    /// `{name}` spelling. Local `$ref`s inside the response are inlined.
    pub fn find_response(&self, route: &str, method: &Method, status: u16) -> Option<ResponseSpec> {
        self.find_versioned_response(route, method, status, None)
    }

    /// Like [`OpenApiDocument::find_response`], restricted to the document
    /// stored under `version` when both the registry and the caller are
    /// versioned. Without a version every document is searched in order.
    pub fn find_versioned_response(
        &self,
        route: &str,
        method: &Method,
        status: u16,
        version: Option<&str>,
    ) -> Option<ResponseSpec> {
        let method = method.as_str().to_ascii_lowercase();
        let status = status.to_string();
        let candidates = route_candidates(route);

        let documents = self
            .documents()
            .into_iter()
            .filter(|(key, _)| version.is_none() || key.is_none() || *key == version);
        for (version, doc) in documents {
            let Some(paths) = doc.get("paths").and_then(JsonValue::as_object) else {
                continue;
            };
            for candidate in &candidates {
                let response = paths
                    .get(candidate.as_str())
                    .map(|item| dereference(item, doc))
                    .and_then(|item| {
                        item.get(&method)?
                            .get("responses")?
                            .get(&status)
                            .cloned()
                    });
                if let Some(response) = response {
                    return Some(ResponseSpec {
                        response: dereference(&response, doc),
                        version: version.map(str::to_string),
                    });
                }
            }
        }
        None
    }

    /// Build the operation index for this document.
    pub fn path_map(&self) -> SdkPathMap {
        SdkPathMap::from_document(self)
    }
}

/// A response object with local references already inlined.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    response: JsonValue,
    version: Option<String>,
}

impl ResponseSpec {
    /// The response object.
    pub fn as_json(&self) -> &JsonValue {
        &self.response
    }

    /// Version key of the document that declared this response.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Schema declared for `media_type`, falling back to the first declared
    /// media type when there is no exact entry.
    pub fn schema_for(&self, media_type: &str) -> Option<&JsonValue> {
        let content = self.response.get("content")?.as_object()?;
        content
            .get(media_type)
            .or_else(|| content.values().next())
            .and_then(|media| media.get("schema"))
    }
}

/// Where one operation lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkOperation {
    /// HTTP method
    pub method: Method,
    /// OpenAPI path template
    pub path: String,
    /// Version key, for versioned registries
    pub version: Option<String>,
}

/// Index of `operationId[.version]` to method and path.
///
/// Later entries overwrite earlier ones with the same key.
#[derive(Debug, Clone, Default)]
pub struct SdkPathMap {
    operations: HashMap<String, SdkOperation>,
}

impl SdkPathMap {
    /// Scan every path item of every document.
    pub fn from_document(document: &OpenApiDocument) -> Self {
        let mut operations = HashMap::new();

        for (version, doc) in document.documents() {
            let Some(paths) = doc.get("paths").and_then(JsonValue::as_object) else {
                continue;
            };
            for (path, item) in paths {
                for name in OPERATION_METHODS {
                    let Some(operation_id) = item
                        .get(name)
                        .and_then(|op| op.get("operationId"))
                        .and_then(JsonValue::as_str)
                    else {
                        continue;
                    };
                    let Ok(method) = Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                    else {
                        continue;
                    };
                    let key = match version {
                        Some(v) => format!("{}.{}", operation_id, v),
                        None => operation_id.to_string(),
                    };
                    operations.insert(
                        key,
                        SdkOperation {
                            method,
                            path: path.clone(),
                            version: version.map(str::to_string),
                        },
                    );
                }
            }
        }

        SdkPathMap { operations }
    }

    /// Look up an operation key.
    pub fn get(&self, key: &str) -> Option<&SdkOperation> {
        self.operations.get(key)
    }

    /// Number of indexed operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// All indexed operations.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SdkOperation)> {
        self.operations.iter()
    }
}

fn is_versioned(root: &JsonValue) -> bool {
    let Some(map) = root.as_object() else {
        return false;
    };
    if map.contains_key("paths") || map.contains_key("openapi") || map.is_empty() {
        return false;
    }
    map.values()
        .all(|doc| doc.get("paths").is_some() || doc.get("openapi").is_some())
}

/// `/widgets/:id` also matches `/widgets/{id}`.
fn route_candidates(route: &str) -> Vec<String> {
    let braced = route
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    if braced == route {
        vec![route.to_string()]
    } else {
        vec![route.to_string(), braced]
    }
}

/// Inline local `#/...` references found in `node`, resolving against `root`.
pub fn dereference(node: &JsonValue, root: &JsonValue) -> JsonValue {
    inline_refs(node, root, 0)
}

fn inline_refs(node: &JsonValue, root: &JsonValue, depth: usize) -> JsonValue {
    match node {
        JsonValue::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(JsonValue::as_str) {
                let target = reference
                    .strip_prefix('#')
                    .and_then(|pointer| root.pointer(pointer));
                let Some(target) = target.filter(|_| depth < MAX_REF_DEPTH) else {
                    tracing::debug!(reference, "leaving unresolved schema reference open");
                    return JsonValue::Object(Map::new());
                };

                let mut resolved = inline_refs(target, root, depth + 1);
                if let JsonValue::Object(resolved_map) = &mut resolved {
                    for (key, value) in map.iter().filter(|(key, _)| *key != "$ref") {
                        resolved_map.insert(key.clone(), inline_refs(value, root, depth));
                    }
                }
                return resolved;
            }
            JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), inline_refs(value, root, depth)))
                    .collect(),
            )
        }
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| inline_refs(v, root, depth)).collect())
        }
        other => other.clone(),
    }
}

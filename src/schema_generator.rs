use crate::error::{Error, Result};
use crate::parser::AstParser;
use crate::scanner::FileScanner;
use crate::type_resolver::{
    PrimitiveType, ResolvedType, StructDef, TypeInfo, TypeKind, TypeResolver,
};
use log::{debug, info};
use serde_json::{json, Map, Value};
use std::path::Path;

/// Prefix of references between generated definitions
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Produces draft-07 JSON schemas for the types declared under a source folder.
///
/// The result is an object with a `definitions` map keyed by type name. Optional values
/// are described as `type: [T, "null"]` or `anyOf: [..., {"type": "null"}]`, and
/// references point at `#/definitions/{Name}`.
pub trait TypeSchemaGenerator: Send + Sync {
    /// Generate the definitions for every type found under `folder`.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder does not exist or a source file cannot be read or parsed.
    fn create_schema(&self, folder: &Path) -> Result<Value>;
}

/// Default [`TypeSchemaGenerator`]: scans a folder (or a single file) for `.rs` sources and
/// describes every struct, enum and alias declared there.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceSchemaGenerator;

impl TypeSchemaGenerator for SourceSchemaGenerator {
    fn create_schema(&self, folder: &Path) -> Result<Value> {
        info!("Generating type schemas from {}", folder.display());

        let sources = FileScanner::new(folder).scan()?;
        let parsed = AstParser::parse_all(&sources)?;

        let type_resolver = TypeResolver::new(parsed);
        let definitions = SchemaGenerator::new(&type_resolver).generate_definitions();
        debug!("Generated {} definitions", definitions.len());

        Ok(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": definitions,
        }))
    }
}

/// Schema generator - converts resolved Rust types to JSON schemas
pub struct SchemaGenerator<'a> {
    /// Type resolver for looking up type definitions
    type_resolver: &'a TypeResolver,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(type_resolver: &'a TypeResolver) -> Self {
        debug!("Initializing SchemaGenerator");
        Self { type_resolver }
    }

    /// Describe every definition known to the resolver
    pub fn generate_definitions(&self) -> Map<String, Value> {
        self.type_resolver
            .definitions()
            .map(|resolved| (resolved.name.clone(), self.definition_schema(resolved)))
            .collect()
    }

    /// Schema of a single definition
    fn definition_schema(&self, resolved: &ResolvedType) -> Value {
        debug!("Generating definition for: {}", resolved.name);

        let mut schema = match &resolved.kind {
            TypeKind::Struct(struct_def) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                let mut visiting = vec![resolved.name.clone()];
                self.collect_properties(struct_def, &mut properties, &mut required, &mut visiting);

                let mut schema = json!({
                    "type": "object",
                    "properties": properties,
                });
                if !required.is_empty() {
                    schema["required"] = json!(required);
                }
                schema["additionalProperties"] = Value::Bool(false);
                schema
            }
            TypeKind::Enum(enum_def) => json!({
                "type": "string",
                "enum": enum_def.variants,
            }),
            TypeKind::Alias(type_info) => self.generate_schema(type_info),
        };

        if let Some(description) = &resolved.description {
            if let Value::Object(map) = &mut schema {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
        }
        schema
    }

    /// Add the serialized fields of `struct_def` to `properties` and `required`.
    /// Flattened struct fields contribute their own fields.
    fn collect_properties(
        &self,
        struct_def: &StructDef,
        properties: &mut Map<String, Value>,
        required: &mut Vec<String>,
        visiting: &mut Vec<String>,
    ) {
        for field in &struct_def.fields {
            // Skip fields marked with #[serde(skip)]
            if field.serde_attrs.skip {
                continue;
            }

            if field.serde_attrs.flatten {
                let target = self
                    .type_resolver
                    .resolve_type(&field.type_info.name)
                    .filter(|_| !field.type_info.is_option && !field.type_info.is_vec);
                if let Some(ResolvedType {
                    name,
                    kind: TypeKind::Struct(inner),
                    ..
                }) = target
                {
                    if !visiting.contains(name) {
                        visiting.push(name.clone());
                        self.collect_properties(inner, properties, required, visiting);
                        visiting.pop();
                    }
                    continue;
                }
                debug!(
                    "Flattened field {} is not a known struct, documenting it as a property",
                    field.name
                );
            }

            let mut property = self.generate_schema(&field.type_info);
            if let (Some(description), Value::Object(map)) = (&field.description, &mut property) {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            properties.insert(field.name.clone(), property);

            if !field.optional {
                required.push(field.name.clone());
            }
        }
    }

    /// Generate a schema for a TypeInfo
    pub fn generate_schema(&self, type_info: &TypeInfo) -> Value {
        if type_info.is_option {
            if let Some(inner) = type_info.inner() {
                return nullable(self.generate_schema(inner));
            }
        }

        if type_info.is_vec {
            if let Some(inner) = type_info.inner() {
                return json!({ "type": "array", "items": self.generate_schema(inner) });
            }
        }

        if type_info.is_map {
            if let Some(inner) = type_info.inner() {
                return json!({
                    "type": "object",
                    "additionalProperties": self.generate_schema(inner),
                });
            }
        }

        if let Some(primitive) = TypeResolver::parse_primitive_type(&type_info.name) {
            return primitive_to_schema(&primitive);
        }

        if self.type_resolver.resolve_type(&type_info.name).is_some() {
            return json!({ "$ref": format!("{}{}", DEFINITIONS_PREFIX, type_info.name) });
        }

        well_known_schema(&type_info.name).unwrap_or_else(|| {
            // Fallback for unknown types
            debug!("Unknown type: {}, using object placeholder", type_info.name);
            json!({ "type": "object" })
        })
    }
}

/// Convert a primitive type to a JSON schema
fn primitive_to_schema(primitive: &PrimitiveType) -> Value {
    let (schema_type, format) = match primitive {
        PrimitiveType::String => ("string", None),
        PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 => ("integer", Some("int32")),
        PrimitiveType::I64 | PrimitiveType::I128 => ("integer", Some("int64")),
        PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 => ("integer", Some("int32")),
        PrimitiveType::U64 | PrimitiveType::U128 => ("integer", Some("int64")),
        PrimitiveType::F32 => ("number", Some("float")),
        PrimitiveType::F64 => ("number", Some("double")),
        PrimitiveType::Bool => ("boolean", None),
        PrimitiveType::Char => ("string", None),
    };

    match format {
        Some(format) => json!({ "type": schema_type, "format": format }),
        None => json!({ "type": schema_type }),
    }
}

/// Common library types that serialize as formatted strings or arbitrary JSON
fn well_known_schema(type_name: &str) -> Option<Value> {
    match type_name {
        "Uuid" => Some(json!({ "type": "string", "format": "uuid" })),
        "DateTime" | "NaiveDateTime" | "SystemTime" => {
            Some(json!({ "type": "string", "format": "date-time" }))
        }
        "NaiveDate" => Some(json!({ "type": "string", "format": "date" })),
        "PathBuf" | "Path" => Some(json!({ "type": "string" })),
        "Value" => Some(json!({})),
        _ => None,
    }
}

/// Allow `null` in addition to what `schema` accepts
fn nullable(mut schema: Value) -> Value {
    match schema.get("type").and_then(Value::as_str).map(str::to_string) {
        Some(schema_type) => {
            schema["type"] = json!([schema_type, "null"]);
            schema
        }
        None => json!({ "anyOf": [schema, { "type": "null" }] }),
    }
}

/// Check that `schema` has the `{"definitions": {...}}` shape
pub fn definitions(schema: &Value) -> Result<&Map<String, Value>> {
    match schema.get("definitions") {
        Some(Value::Object(definitions)) => Ok(definitions),
        None => Err(Error::SchemaError("missing 'definitions'".to_string())),
        Some(_) => Err(Error::SchemaError("'definitions' is not an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_file(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn create_resolver_from_code(code: &str) -> TypeResolver {
        let parsed = AstParser::parse_source(Path::new("models.rs"), code).unwrap();
        TypeResolver::new(vec![parsed])
    }

    fn definitions_of(code: &str) -> Map<String, Value> {
        let resolver = create_resolver_from_code(code);
        SchemaGenerator::new(&resolver).generate_definitions()
    }

    #[test]
    fn test_primitive_types() {
        let resolver = create_resolver_from_code("");
        let generator = SchemaGenerator::new(&resolver);

        let cases = vec![
            ("String", json!({ "type": "string" })),
            ("i32", json!({ "type": "integer", "format": "int32" })),
            ("i64", json!({ "type": "integer", "format": "int64" })),
            ("f32", json!({ "type": "number", "format": "float" })),
            ("f64", json!({ "type": "number", "format": "double" })),
            ("bool", json!({ "type": "boolean" })),
        ];

        for (name, expected) in cases {
            assert_eq!(generator.generate_schema(&TypeInfo::new(name)), expected, "{}", name);
        }
    }

    #[test]
    fn test_option_type_is_nullable() {
        let resolver = create_resolver_from_code("pub struct User { pub id: u32 }");
        let generator = SchemaGenerator::new(&resolver);

        let primitive = TypeInfo::option(TypeInfo::new("i32"));
        assert_eq!(
            generator.generate_schema(&primitive),
            json!({ "type": ["integer", "null"], "format": "int32" })
        );

        let reference = TypeInfo::option(TypeInfo::new("User"));
        assert_eq!(
            generator.generate_schema(&reference),
            json!({ "anyOf": [{ "$ref": "#/definitions/User" }, { "type": "null" }] })
        );
    }

    #[test]
    fn test_vec_and_map_types() {
        let resolver = create_resolver_from_code("");
        let generator = SchemaGenerator::new(&resolver);

        assert_eq!(
            generator.generate_schema(&TypeInfo::vec(TypeInfo::new("String"))),
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(
            generator.generate_schema(&TypeInfo::map(TypeInfo::new("u8"))),
            json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "format": "int32" }
            })
        );
    }

    #[test]
    fn test_struct_definition() {
        let definitions = definitions_of(
            r#"
            /// Entity used in tests
            pub struct TestingEntity {
                pub id: u32,
                /// Display name
                pub name: String,
                pub nickname: Option<String>,
                pub tags: Vec<String>,
            }
        "#,
        );

        assert_eq!(
            definitions["TestingEntity"],
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "format": "int32" },
                    "name": { "type": "string", "description": "Display name" },
                    "nickname": { "type": ["string", "null"] },
                    "tags": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["id", "name", "tags"],
                "additionalProperties": false,
                "description": "Entity used in tests"
            })
        );
    }

    #[test]
    fn test_serde_rename_and_skip() {
        let definitions = definitions_of(
            r#"
            pub struct User {
                #[serde(rename = "userId")]
                pub id: u32,
                #[serde(skip)]
                pub password: String,
            }
        "#,
        );

        let user = &definitions["User"];
        assert!(user["properties"].get("userId").is_some());
        assert!(user["properties"].get("password").is_none());
        assert_eq!(user["required"], json!(["userId"]));
    }

    #[test]
    fn test_enum_definition() {
        let definitions = definitions_of(
            r#"
            pub enum Status { Active, Inactive, Pending }
        "#,
        );
        assert_eq!(
            definitions["Status"],
            json!({ "type": "string", "enum": ["Active", "Inactive", "Pending"] })
        );
    }

    #[test]
    fn test_nested_struct_uses_reference() {
        let definitions = definitions_of(
            r#"
            pub struct Address { pub city: String }
            pub struct User {
                pub address: Address,
                pub previous: Vec<Address>,
                pub billing: Option<Address>,
            }
        "#,
        );

        let properties = &definitions["User"]["properties"];
        assert_eq!(properties["address"], json!({ "$ref": "#/definitions/Address" }));
        assert_eq!(
            properties["previous"],
            json!({ "type": "array", "items": { "$ref": "#/definitions/Address" } })
        );
        assert_eq!(
            properties["billing"],
            json!({ "anyOf": [{ "$ref": "#/definitions/Address" }, { "type": "null" }] })
        );
    }

    #[test]
    fn test_flatten_merges_fields() {
        let definitions = definitions_of(
            r#"
            pub struct Audit { pub created_by: String, pub note: Option<String> }
            pub struct Document {
                pub title: String,
                #[serde(flatten)]
                pub audit: Audit,
            }
        "#,
        );

        let document = &definitions["Document"];
        let keys: Vec<&String> = document["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["title", "created_by", "note"]);
        assert_eq!(document["required"], json!(["title", "created_by"]));
    }

    #[test]
    fn test_alias_definition() {
        let definitions = definitions_of("pub type Tags = Vec<String>;");
        assert_eq!(
            definitions["Tags"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
    }

    #[test]
    fn test_unknown_type_fallback() {
        let resolver = create_resolver_from_code("");
        let generator = SchemaGenerator::new(&resolver);
        assert_eq!(
            generator.generate_schema(&TypeInfo::new("Mystery")),
            json!({ "type": "object" })
        );
        assert_eq!(
            generator.generate_schema(&TypeInfo::new("Uuid")),
            json!({ "type": "string", "format": "uuid" })
        );
    }

    #[test]
    fn test_source_generator_on_folder() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_file(&temp_dir, "entity.rs", "pub struct TestingEntity { pub name: String }");
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        create_temp_file(&temp_dir, "nested/kind.rs", "pub enum Kind { A, B }");

        let schema = SourceSchemaGenerator.create_schema(temp_dir.path()).unwrap();
        let definitions = definitions(&schema).unwrap();
        assert!(definitions.contains_key("TestingEntity"));
        assert!(definitions.contains_key("Kind"));
    }

    #[test]
    fn test_source_generator_missing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = SourceSchemaGenerator.create_schema(&missing).unwrap_err();
        assert!(matches!(err, Error::FolderNotFound(_)));
    }

    #[test]
    fn test_source_generator_propagates_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_file(&temp_dir, "broken.rs", "pub struct {");
        let err = SourceSchemaGenerator.create_schema(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn test_definitions_shape_check() {
        assert!(definitions(&json!({ "definitions": {} })).is_ok());
        assert!(matches!(
            definitions(&json!({ "definitions": [] })),
            Err(Error::SchemaError(_))
        ));
        assert!(definitions(&json!({})).is_err());
    }
}

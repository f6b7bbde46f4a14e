use crate::parser::ParsedFile;
use indexmap::IndexMap;
use log::{debug, warn};
use syn::meta::ParseNestedMeta;
use syn::visit::Visit;

/// Shape of a Rust type as written in a field or alias.
///
/// Wrapper types are recorded as flags: `Option<T>` sets `is_option`, `Vec<T>` and slices set
/// `is_vec`, maps set `is_map`. In each case `generic_args` holds the inner type and `name`
/// mirrors the innermost named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// The base type name (e.g., "String", "User", "i32")
    pub name: String,
    /// Generic type arguments (e.g., for `Vec<String>`, contains TypeInfo for String)
    pub generic_args: Vec<TypeInfo>,
    /// Whether this type is wrapped in `Option<T>`
    pub is_option: bool,
    /// Whether this type is a `Vec<T>` (array type)
    pub is_vec: bool,
    /// Whether this type is a string-keyed map; `generic_args[0]` is the value type
    pub is_map: bool,
}

impl TypeInfo {
    /// Create a new TypeInfo for a simple type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
            is_option: false,
            is_vec: false,
            is_map: false,
        }
    }

    /// Create a TypeInfo for an `Option<T>` type
    pub fn option(inner: TypeInfo) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: true,
            is_vec: false,
            is_map: false,
        }
    }

    /// Create a TypeInfo for a `Vec<T>` type
    pub fn vec(inner: TypeInfo) -> Self {
        Self {
            name: inner.name.clone(),
            generic_args: vec![inner],
            is_option: false,
            is_vec: true,
            is_map: false,
        }
    }

    /// Create a TypeInfo for a map with values of type `value`
    pub fn map(value: TypeInfo) -> Self {
        Self {
            name: value.name.clone(),
            generic_args: vec![value],
            is_option: false,
            is_vec: false,
            is_map: true,
        }
    }

    /// The wrapped type of an `Option`, `Vec` or map
    pub fn inner(&self) -> Option<&TypeInfo> {
        if self.is_option || self.is_vec || self.is_map {
            self.generic_args.first()
        } else {
            None
        }
    }
}

/// Type resolver - collects the type definitions of a set of parsed files
pub struct TypeResolver {
    /// Definitions by type name, in discovery order
    definitions: IndexMap<String, ResolvedType>,
}

/// Resolved type information
#[derive(Debug, Clone)]
pub struct ResolvedType {
    /// The type name
    pub name: String,
    /// Doc comment of the definition
    pub description: Option<String>,
    /// The kind of type (struct, enum, alias)
    pub kind: TypeKind,
}

/// Type kind - represents different categories of definitions
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A struct type with fields
    Struct(StructDef),
    /// An enum type with variants
    Enum(EnumDef),
    /// A `type Name = ...;` alias
    Alias(TypeInfo),
}

/// Struct definition with fields
#[derive(Debug, Clone)]
pub struct StructDef {
    /// The fields of the struct
    pub fields: Vec<FieldDef>,
}

/// Field definition in a struct
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Serialized field name (serde renames applied)
    pub name: String,
    /// Type information for the field
    pub type_info: TypeInfo,
    /// Whether the field may be absent (`Option<T>` or `#[serde(default)]`)
    pub optional: bool,
    /// Serde attributes applied to this field
    pub serde_attrs: SerdeAttributes,
    /// Doc comment of the field
    pub description: Option<String>,
}

/// Enum definition with variants
#[derive(Debug, Clone)]
pub struct EnumDef {
    /// Serialized variant names
    pub variants: Vec<String>,
}

/// Primitive types supported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
}

/// Serde attributes of a field, variant or container
#[derive(Debug, Clone, Default)]
pub struct SerdeAttributes {
    /// Renamed field name
    pub rename: Option<String>,
    /// Container-level `rename_all` rule
    pub rename_all: Option<String>,
    /// Whether to skip this field during serialization
    pub skip: bool,
    /// Whether to flatten this field
    pub flatten: bool,
    /// Whether a missing value falls back to `Default`
    pub default: bool,
}

/// Visitor gathering struct, enum and alias items, including those in inline modules
struct DefinitionCollector {
    definitions: IndexMap<String, ResolvedType>,
}

impl DefinitionCollector {
    fn insert(&mut self, resolved: ResolvedType) {
        if self.definitions.contains_key(&resolved.name) {
            warn!("Type {} is defined more than once, keeping the last definition", resolved.name);
        }
        self.definitions.insert(resolved.name.clone(), resolved);
    }
}

impl<'ast> Visit<'ast> for DefinitionCollector {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        let resolved = TypeResolver::parse_struct_definition(item);
        self.insert(resolved);
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        let resolved = TypeResolver::parse_enum_definition(item);
        self.insert(resolved);
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        self.insert(ResolvedType {
            name: item.ident.to_string(),
            description: TypeResolver::doc_comment(&item.attrs),
            kind: TypeKind::Alias(TypeResolver::extract_type_info(&item.ty)),
        });
    }

    fn visit_item_fn(&mut self, _item: &'ast syn::ItemFn) {}

    fn visit_item_impl(&mut self, _item: &'ast syn::ItemImpl) {}
}

impl TypeResolver {
    /// Create a new TypeResolver holding every definition found in `parsed_files`
    pub fn new(parsed_files: Vec<ParsedFile>) -> Self {
        debug!("Initializing TypeResolver with {} files", parsed_files.len());
        let mut collector = DefinitionCollector {
            definitions: IndexMap::new(),
        };
        for parsed_file in &parsed_files {
            debug!("Collecting definitions from {}", parsed_file.path.display());
            collector.visit_file(&parsed_file.syntax_tree);
        }
        debug!("Collected {} type definitions", collector.definitions.len());
        Self {
            definitions: collector.definitions,
        }
    }

    /// Look up a definition by type name
    pub fn resolve_type(&self, type_name: &str) -> Option<&ResolvedType> {
        let resolved = self.definitions.get(type_name);
        if resolved.is_none() && Self::parse_primitive_type(type_name).is_none() {
            debug!("Type {} has no definition", type_name);
        }
        resolved
    }

    /// All definitions, in discovery order
    pub fn definitions(&self) -> impl Iterator<Item = &ResolvedType> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Parse a struct definition into a ResolvedType
    fn parse_struct_definition(item_struct: &syn::ItemStruct) -> ResolvedType {
        let struct_name = item_struct.ident.to_string();
        debug!("Parsing struct definition: {}", struct_name);

        let container = Self::parse_serde_attributes(&item_struct.attrs);
        let mut fields = Vec::new();

        match &item_struct.fields {
            syn::Fields::Named(named_fields) => {
                for field in &named_fields.named {
                    if let Some(field_def) = Self::parse_field(field, &container) {
                        fields.push(field_def);
                    }
                }
            }
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                // Newtype structs serialize as their inner value
                let inner = Self::extract_type_info(&unnamed.unnamed[0].ty);
                return ResolvedType {
                    name: struct_name,
                    description: Self::doc_comment(&item_struct.attrs),
                    kind: TypeKind::Alias(inner),
                };
            }
            _ => {}
        }

        debug!("Parsed {} fields", fields.len());

        ResolvedType {
            name: struct_name,
            description: Self::doc_comment(&item_struct.attrs),
            kind: TypeKind::Struct(StructDef { fields }),
        }
    }

    /// Parse an enum definition into a ResolvedType
    fn parse_enum_definition(item_enum: &syn::ItemEnum) -> ResolvedType {
        let enum_name = item_enum.ident.to_string();
        debug!("Parsing enum definition: {}", enum_name);

        let container = Self::parse_serde_attributes(&item_enum.attrs);
        let variants: Vec<String> = item_enum
            .variants
            .iter()
            .filter_map(|variant| {
                let attrs = Self::parse_serde_attributes(&variant.attrs);
                if attrs.skip {
                    return None;
                }
                if !matches!(variant.fields, syn::Fields::Unit) {
                    debug!(
                        "Variant {}::{} carries data, documenting its name only",
                        enum_name, variant.ident
                    );
                }
                let name = variant.ident.to_string();
                Some(match (attrs.rename, &container.rename_all) {
                    (Some(rename), _) => rename,
                    (None, Some(rule)) => apply_rename_rule(rule, &name, true),
                    (None, None) => name,
                })
            })
            .collect();

        debug!("Parsed {} variants", variants.len());

        ResolvedType {
            name: enum_name,
            description: Self::doc_comment(&item_enum.attrs),
            kind: TypeKind::Enum(EnumDef { variants }),
        }
    }

    /// Parse a single named field
    fn parse_field(field: &syn::Field, container: &SerdeAttributes) -> Option<FieldDef> {
        let ident = field.ident.as_ref()?.to_string();
        let ident = ident.strip_prefix("r#").unwrap_or(&ident).to_string();
        debug!("Parsing field: {}", ident);

        let type_info = Self::extract_type_info(&field.ty);
        let serde_attrs = Self::parse_serde_attributes(&field.attrs);
        let name = match (&serde_attrs.rename, &container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => apply_rename_rule(rule, &ident, false),
            (None, None) => ident,
        };
        let optional = type_info.is_option || serde_attrs.default || container.default;

        Some(FieldDef {
            name,
            type_info,
            optional,
            serde_attrs,
            description: Self::doc_comment(&field.attrs),
        })
    }

    /// Parse Serde attributes from item attributes
    pub fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
        let mut serde_attrs = SerdeAttributes::default();

        for attr in attrs {
            // Check if this is a serde attribute
            if !attr.path().is_ident("serde") {
                continue;
            }

            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if meta.input.peek(syn::Token![=]) {
                        let value: syn::LitStr = meta.value()?.parse()?;
                        debug!("Found serde rename: {}", value.value());
                        serde_attrs.rename = Some(value.value());
                    } else {
                        skip_meta_value(&meta)?;
                    }
                } else if meta.path.is_ident("rename_all") {
                    if meta.input.peek(syn::Token![=]) {
                        let value: syn::LitStr = meta.value()?.parse()?;
                        serde_attrs.rename_all = Some(value.value());
                    } else {
                        skip_meta_value(&meta)?;
                    }
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    debug!("Found serde skip");
                    serde_attrs.skip = true;
                } else if meta.path.is_ident("flatten") {
                    debug!("Found serde flatten");
                    serde_attrs.flatten = true;
                } else if meta.path.is_ident("default") {
                    serde_attrs.default = true;
                    skip_meta_value(&meta)?;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            });

            if let Err(e) = result {
                debug!("Ignoring unparseable serde attribute: {}", e);
            }
        }

        serde_attrs
    }

    /// Join `///` doc lines into a description
    fn doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
        let lines: Vec<String> = attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .filter_map(|attr| match &attr.meta {
                syn::Meta::NameValue(syn::MetaNameValue {
                    value:
                        syn::Expr::Lit(syn::ExprLit {
                            lit: syn::Lit::Str(lit),
                            ..
                        }),
                    ..
                }) => Some(lit.value().trim().to_string()),
                _ => None,
            })
            .collect();

        let joined = lines.join("\n").trim().to_string();
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    /// Extract TypeInfo from a syn::Type
    pub fn extract_type_info(ty: &syn::Type) -> TypeInfo {
        match ty {
            syn::Type::Path(type_path) => Self::extract_type_info_from_path(&type_path.path),
            syn::Type::Reference(reference) => Self::extract_type_info(&reference.elem),
            syn::Type::Paren(paren) => Self::extract_type_info(&paren.elem),
            syn::Type::Group(group) => Self::extract_type_info(&group.elem),
            syn::Type::Array(array) => TypeInfo::vec(Self::extract_type_info(&array.elem)),
            syn::Type::Slice(slice) => TypeInfo::vec(Self::extract_type_info(&slice.elem)),
            _ => {
                // For other types, use a generic placeholder
                TypeInfo::new("Unknown")
            }
        }
    }

    /// Extract TypeInfo from a syn::Path
    fn extract_type_info_from_path(path: &syn::Path) -> TypeInfo {
        let Some(segment) = path.segments.last() else {
            return TypeInfo::new("Unknown");
        };
        let type_name = segment.ident.to_string();

        let type_args: Vec<&syn::Type> = match &segment.arguments {
            syn::PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    syn::GenericArgument::Type(ty) => Some(ty),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        match (type_name.as_str(), type_args.as_slice()) {
            ("Option", [inner]) => TypeInfo::option(Self::extract_type_info(inner)),
            ("Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet", [inner]) => {
                TypeInfo::vec(Self::extract_type_info(inner))
            }
            ("HashMap" | "BTreeMap" | "IndexMap", [_, value]) => {
                TypeInfo::map(Self::extract_type_info(value))
            }
            ("Box" | "Arc" | "Rc" | "Cow", [inner]) => Self::extract_type_info(inner),
            _ => TypeInfo {
                name: type_name,
                generic_args: type_args.iter().map(|ty| Self::extract_type_info(ty)).collect(),
                is_option: false,
                is_vec: false,
                is_map: false,
            },
        }
    }

    /// Parse a primitive type name
    pub fn parse_primitive_type(type_name: &str) -> Option<PrimitiveType> {
        match type_name {
            "String" | "str" => Some(PrimitiveType::String),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" | "isize" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" | "usize" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            "bool" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }
}

/// Consume the value of a serde meta item this resolver does not interpret
fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta_value(&nested))?;
    }
    Ok(())
}

/// Apply a serde `rename_all` rule. Fields are snake_case, variants PascalCase.
fn apply_rename_rule(rule: &str, name: &str, is_variant: bool) -> String {
    let words: Vec<String> = if is_variant {
        let mut words = Vec::new();
        let mut current = String::new();
        for c in name.chars() {
            if c.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            words.push(current);
        }
        words
    } else {
        name.split('_')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    };

    let capitalize = |word: &str| {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        }
    };

    match rule {
        "lowercase" => words.concat(),
        "UPPERCASE" => words.concat().to_uppercase(),
        "PascalCase" => words.iter().map(|w| capitalize(w)).collect(),
        "camelCase" => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
            .collect(),
        "snake_case" => words.join("_"),
        "SCREAMING_SNAKE_CASE" => words.join("_").to_uppercase(),
        "kebab-case" => words.join("-"),
        "SCREAMING-KEBAB-CASE" => words.join("-").to_uppercase(),
        other => {
            warn!("Unknown serde rename_all rule: {}", other);
            name.to_string()
        }
    }
}

use serde_derive::{Deserialize, Serialize};

/* ============================================================================
   Schema File
   ============================================================================ */

/* Top-level schema document. One file describes one namespace. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
    /* Dotted namespace path ("MyGame.Sample"); empty for the global namespace */
    #[serde(default)]
    pub namespace: String,
    /* Name of the table used as buffer root */
    #[serde(default)]
    pub root_type: Option<String>,
    /* Four character magic stored after the root offset */
    #[serde(default)]
    pub file_identifier: Option<String>,
    /* Extension recorded for the binary files of this schema */
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub services: Vec<ServiceDecl>,
}

impl SchemaFile {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

/* ============================================================================
   Definitions
   ============================================================================ */

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Definition {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub kind: DefinitionKind,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionKind {
    Enum(EnumDecl),
    Union(UnionDecl),
    Struct(StructDecl),
    Table(StructDecl),
}

impl DefinitionKind {
    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Enum(_) => "enum",
            DefinitionKind::Union(_) => "union",
            DefinitionKind::Struct(_) => "struct",
            DefinitionKind::Table(_) => "table",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct EnumDecl {
    /* Scalar type name backing the enum; defaults to ubyte */
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub bit_flags: bool,
    #[serde(default)]
    pub private: bool,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumValueDecl {
    pub name: String,
    /* Omitted values continue from the previous one */
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct UnionDecl {
    #[serde(default)]
    pub private: bool,
    pub variants: Vec<UnionVariantDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct UnionVariantDecl {
    /* Variant label; defaults to the payload type name */
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub variant_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl UnionVariantDecl {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.variant_type)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct StructDecl {
    #[serde(flatten)]
    pub container_attributes: ContainerAttributes,
    pub fields: Vec<FieldDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerAttributes {
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub partial: bool,
    /* Keep declaration order in single-call constructors */
    #[serde(default)]
    pub original_order: bool,
    /* Minimum alignment for fixed structs */
    #[serde(default)]
    pub force_align: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub shared: bool,
    /* Scalar with no default: absent reads as null */
    #[serde(default)]
    pub optional: bool,
    /* Explicit vtable slot */
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub nested_flatbuffer: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/* ============================================================================
   Services
   ============================================================================ */

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceDecl {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub calls: Vec<RpcDecl>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct RpcDecl {
    pub name: String,
    pub request: String,
    pub response: String,
    #[serde(default)]
    pub streaming: Streaming,
    #[serde(default)]
    pub idempotent: bool,
    /* Return ValueTask instead of Task */
    #[serde(default)]
    pub value_task: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Streaming {
    #[default]
    None,
    Client,
    Server,
    Bidi,
}

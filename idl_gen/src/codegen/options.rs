/* Generator configuration.
 *
 * Loaded from an optional YAML file and then overridden by command line flags.
 * Every option only changes surface text; none of them changes layout.
 */

use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorOptions {
  /* Concatenate every entity into one file instead of one file per entity */
  pub one_file: bool,
  /* Mutators and writable spans become public instead of internal */
  pub mutable_buffer: bool,
  /* Emit owned mirror classes with Pack/UnPack */
  pub object_api: bool,
  /* Emit JSON attributes, union converters and root (de)serialization */
  pub json_serializer: bool,
  /* Appended to the schema name in one-file mode */
  pub filename_suffix: String,
  pub filename_extension: String,
  /* Mark nullable reference returns with `?` under `#nullable enable` */
  pub nullable_annotation: bool,
  pub object_prefix: String,
  pub object_suffix: String,
}

impl Default for GeneratorOptions {
  fn default() -> Self {
    Self {
      one_file: false,
      mutable_buffer: false,
      object_api: false,
      json_serializer: false,
      filename_suffix: "_generated".to_string(),
      filename_extension: "cs".to_string(),
      nullable_annotation: false,
      object_prefix: String::new(),
      object_suffix: "T".to_string(),
    }
  }
}

impl GeneratorOptions {
  pub fn from_yaml(text: &str) -> Result<Self, serde_yml::Error> {
    serde_yml::from_str(text)
  }

  /* Visibility of members that write into the buffer */
  pub fn mutator_visibility(&self) -> &'static str {
    if self.mutable_buffer { "public" } else { "internal" }
  }

  /* `readonly ` qualifier on reference accessors */
  pub fn ref_qualifier(&self) -> &'static str {
    if self.mutable_buffer { "" } else { "readonly " }
  }

  /* Suffix for reference-typed returns that may be null */
  pub fn nullable_ref(&self) -> &'static str {
    if self.nullable_annotation { "?" } else { "" }
  }

  pub fn extension(&self) -> String {
    let ext = self.filename_extension.trim_start_matches('.');
    format!(".{}", ext)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_config_keeps_defaults() {
    let options = GeneratorOptions::from_yaml("object-api: true\nfilename-extension: \".g.cs\"\n").unwrap();
    assert!(options.object_api);
    assert!(!options.one_file);
    assert_eq!(options.object_suffix, "T");
    assert_eq!(options.extension(), ".g.cs");
  }

  #[test]
  fn test_mutable_buffer_switches_visibility() {
    let mut options = GeneratorOptions::default();
    assert_eq!(options.mutator_visibility(), "internal");
    assert_eq!(options.ref_qualifier(), "readonly ");
    options.mutable_buffer = true;
    assert_eq!(options.mutator_visibility(), "public");
    assert_eq!(options.ref_qualifier(), "");
  }
}

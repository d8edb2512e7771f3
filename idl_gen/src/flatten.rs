/* Tree flattening for nested fixed structs.
 *
 * A fixed struct is a tree: inner nodes are nested structs and arrays, leaves are
 * scalars. Constructors take the leaves as an ordered parameter list and then
 * have to write each one back through the path it came from, so flattening keeps
 * that path next to every leaf.
 */

use crate::schema::{FieldDef, Schema, StructId, Type};

pub enum Node<S, N, L> {
  Branch(Vec<(S, N)>),
  Leaf(L),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flattened<S, L> {
  pub path: Vec<S>,
  pub leaf: L,
}

/* Depth-first, children in the order `expand` yields them */
pub fn flatten<S: Clone, N, L>(root: N, expand: impl Fn(N) -> Node<S, N, L>) -> Vec<Flattened<S, L>> {
  let mut out = Vec::new();
  let mut stack: Vec<(Vec<S>, N)> = vec![(Vec::new(), root)];

  while let Some((path, node)) = stack.pop() {
    match expand(node) {
      Node::Leaf(leaf) => out.push(Flattened { path, leaf }),
      Node::Branch(children) => {
        for (step, child) in children.into_iter().rev() {
          let mut child_path = path.clone();
          child_path.push(step);
          stack.push((child_path, child));
        }
      }
    }
  }

  out
}

/* One step from a struct into its contents */
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructStep<'s> {
  Field(&'s FieldDef),
  Element(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructLeaf<'s> {
  /* Scalar field the leaf value belongs to */
  pub field: &'s FieldDef,
  pub ty: &'s Type,
  /* Byte offset from the start of the outermost struct */
  pub offset: u64,
}

#[derive(Clone, Copy)]
enum StructNode<'s> {
  Struct(StructId, u64),
  Value(&'s FieldDef, &'s Type, u64),
}

/* Every scalar slot of a fixed struct, with its access path and absolute offset */
pub fn struct_leaves(schema: &Schema, id: StructId) -> Vec<Flattened<StructStep<'_>, StructLeaf<'_>>> {
  flatten(StructNode::Struct(id, 0), |node| match node {
    StructNode::Struct(sid, base) => expand_struct(schema, sid, base),
    StructNode::Value(field, ty, offset) => match ty {
      Type::Struct(sid) => expand_struct(schema, *sid, offset),
      Type::Array(elem, len) => {
        let stride = crate::layout::inline_layout(schema, elem).0;
        Node::Branch(
          (0..*len).map(|i| (StructStep::Element(i), StructNode::Value(field, &**elem, offset + stride * i as u64))).collect(),
        )
      }
      _ => Node::Leaf(StructLeaf { field, ty, offset }),
    },
  })
}

fn expand_struct(schema: &Schema, id: StructId, base: u64) -> Node<StructStep<'_>, StructNode<'_>, StructLeaf<'_>> {
  Node::Branch(
    schema
      .struct_def(id)
      .fields
      .iter()
      .map(|f| (StructStep::Field(f), StructNode::Value(f, &f.ty, base + f.offset)))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  struct Tree {
    label: &'static str,
    kids: Vec<Tree>,
  }

  fn tree(label: &'static str, kids: Vec<Tree>) -> Tree {
    Tree { label, kids }
  }

  #[test]
  fn test_flatten_preserves_order_and_paths() {
    let root = tree("root", vec![tree("a", vec![]), tree("b", vec![tree("b1", vec![]), tree("b2", vec![])]), tree("c", vec![])]);

    let flat = flatten(root, |node: Tree| {
      if node.kids.is_empty() {
        Node::Leaf(node.label)
      } else {
        Node::Branch(node.kids.into_iter().map(|k| (k.label, k)).collect())
      }
    });

    let leaves: Vec<&str> = flat.iter().map(|f| f.leaf).collect();
    assert_eq!(leaves, vec!["a", "b1", "b2", "c"]);
    assert_eq!(flat[1].path, vec!["b", "b1"]);
    assert_eq!(flat[3].path, vec!["c"]);
  }

  #[test]
  fn test_struct_leaves_follow_nested_structs_and_arrays() {
    let yaml = r#"
definitions:
  - name: Inner
    kind:
      struct:
        fields:
          - { name: a, type: short }
          - { name: b, type: byte }
  - name: Outer
    kind:
      struct:
        fields:
          - { name: x, type: int }
          - { name: inner, type: Inner }
          - { name: arr, type: "[ubyte:2]" }
          - { name: pairs, type: "[Inner:2]" }
"#;
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();
    let outer = schema.find_struct("Outer").unwrap();

    let leaves = struct_leaves(&schema, outer);
    let described: Vec<(String, u64)> = leaves
      .iter()
      .map(|l| {
        let path: Vec<String> = l
          .path
          .iter()
          .map(|s| match s {
            StructStep::Field(f) => f.name.clone(),
            StructStep::Element(i) => i.to_string(),
          })
          .collect();
        (path.join("."), l.leaf.offset)
      })
      .collect();

    assert_eq!(
      described,
      vec![
        ("x".to_string(), 0),
        ("inner.a".to_string(), 4),
        ("inner.b".to_string(), 6),
        ("arr.0".to_string(), 8),
        ("arr.1".to_string(), 9),
        ("pairs.0.a".to_string(), 10),
        ("pairs.0.b".to_string(), 12),
        ("pairs.1.a".to_string(), 14),
        ("pairs.1.b".to_string(), 16),
      ]
    );
  }
}

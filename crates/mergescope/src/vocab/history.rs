//! # Derivation History
//!
//! A [`HistoryTree`] is stored as a flat pre-order node arena; building,
//! walking, cloning and dropping one never recurses, however long the
//! merge chain behind the token.

use std::io::Write;

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::{errors::MSResult, types::TokenId};

/// One node of a [`HistoryTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNode {
    /// The debug display form of the token.
    pub name: String,

    /// The token id.
    pub id: TokenId,

    /// Arena indices of the ``[left, right]`` children; `None` for byte tokens.
    pub children: Option<[usize; 2]>,
}

impl HistoryNode {
    /// Is this a byte token leaf?
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// The binary unfolding of a token's composition down to byte tokens.
///
/// Nodes are kept in pre-order, left before right; the root is node 0.
///
/// Serializes to the ``{ name, id, children? }`` shape used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTree {
    nodes: Vec<HistoryNode>,
}

impl HistoryTree {
    /// Unfold a composition table into a tree.
    ///
    /// ## Arguments
    /// * `root` - the root token id.
    /// * `label` - maps an id to ``(name, composition)``.
    pub(crate) fn unfold<F>(
        root: TokenId,
        mut label: F,
    ) -> Self
    where
        F: FnMut(TokenId) -> (String, Option<(TokenId, TokenId)>),
    {
        let mut nodes: Vec<HistoryNode> = Vec::new();

        // ``(id, (parent, side))`` work items; right pushed first so left pops first.
        let mut stack: Vec<(TokenId, Option<(usize, usize)>)> = vec![(root, None)];
        while let Some((id, slot)) = stack.pop() {
            let idx = nodes.len();
            if let Some((parent, side)) = slot
                && let Some(children) = nodes[parent].children.as_mut()
            {
                children[side] = idx;
            }

            let (name, composition) = label(id);
            nodes.push(HistoryNode {
                name,
                id,
                children: composition.map(|_| [idx; 2]),
            });

            if let Some((left, right)) = composition {
                stack.push((right, Some((idx, 1))));
                stack.push((left, Some((idx, 0))));
            }
        }

        Self { nodes }
    }

    /// The root node.
    pub fn root(&self) -> &HistoryNode {
        &self.nodes[0]
    }

    /// The root token's display name.
    pub fn name(&self) -> &str {
        &self.root().name
    }

    /// The root token id.
    pub fn id(&self) -> TokenId {
        self.root().id
    }

    /// Is the root a byte token leaf?
    pub fn is_leaf(&self) -> bool {
        self.root().is_leaf()
    }

    /// All nodes, in pre-order.
    pub fn nodes(&self) -> &[HistoryNode] {
        &self.nodes
    }

    /// The number of nodes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The ``[left, right]`` children of `node`, if any.
    pub fn children(
        &self,
        node: &HistoryNode,
    ) -> Option<[&HistoryNode; 2]> {
        node.children
            .map(|[left, right]| [&self.nodes[left], &self.nodes[right]])
    }

    /// The depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        // Pre-order puts every parent before its children.
        let mut depths = vec![1usize; self.nodes.len()];
        let mut max = 1;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(children) = node.children {
                for child in children {
                    depths[child] = depths[idx] + 1;
                    max = max.max(depths[child]);
                }
            }
        }
        max
    }

    /// The leaf ids, left to right.
    pub fn leaves(&self) -> Vec<TokenId> {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.id)
            .collect()
    }

    /// Write the ``{ name, id, children? }`` JSON form to `writer`.
    ///
    /// Produces the same text as `serde_json::to_writer`, without nesting
    /// a call frame per tree level.
    pub fn write_json<W: Write>(
        &self,
        writer: &mut W,
    ) -> MSResult<()> {
        enum Emit {
            Node(usize),
            Text(&'static [u8]),
        }

        let mut stack = vec![Emit::Node(0)];
        while let Some(item) = stack.pop() {
            let idx = match item {
                Emit::Text(text) => {
                    writer.write_all(text)?;
                    continue;
                }
                Emit::Node(idx) => idx,
            };

            let node = &self.nodes[idx];
            writer.write_all(b"{\"name\":")?;
            serde_json::to_writer(&mut *writer, &node.name).map_err(std::io::Error::from)?;
            write!(writer, ",\"id\":{}", node.id)?;

            match node.children {
                None => writer.write_all(b"}")?,
                Some([left, right]) => {
                    writer.write_all(b",\"children\":[")?;
                    stack.push(Emit::Text(b"]}"));
                    stack.push(Emit::Node(right));
                    stack.push(Emit::Text(b","));
                    stack.push(Emit::Node(left));
                }
            }
        }
        Ok(())
    }

    /// The ``{ name, id, children? }`` JSON form.
    pub fn to_json_string(&self) -> MSResult<String> {
        let mut buf = Vec::with_capacity(self.nodes.len() * 32);
        self.write_json(&mut buf)?;
        // Names are `String`s and the rest is ASCII.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Serializes one arena node and its subtree.
struct NodeView<'a> {
    tree: &'a HistoryTree,
    idx: usize,
}

impl Serialize for NodeView<'_> {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let node = &self.tree.nodes[self.idx];
        let fields = if node.is_leaf() { 2 } else { 3 };
        let mut state = serializer.serialize_struct("HistoryTree", fields)?;
        state.serialize_field("name", &node.name)?;
        state.serialize_field("id", &node.id)?;
        if let Some([left, right]) = node.children {
            let children = [
                NodeView {
                    tree: self.tree,
                    idx: left,
                },
                NodeView {
                    tree: self.tree,
                    idx: right,
                },
            ];
            state.serialize_field("children", &children)?;
        }
        state.end()
    }
}

/// Nests one serializer call per tree level; for very deep merge chains
/// prefer [`HistoryTree::write_json`].
impl Serialize for HistoryTree {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        NodeView { tree: self, idx: 0 }.serialize(serializer)
    }
}

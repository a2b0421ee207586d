//! Type graph: interned node types and edge labels, plus the subtype relation.
//!
//! Every node-type name and every edge label is interned once into a dense
//! [`LabelId`]. Both namespaces share the id space, so a label variable can hold
//! either kind of label without a wrapper, and the kind of an id can always be
//! recovered from the [`TypeGraph`].

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::algebra::Sort;
use crate::error::TypeError;

/// Dense identifier of an interned node type or edge label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u32);

impl LabelId {
    /// Position of this label in the type graph's tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Namespace of a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelKind {
    /// A node type (including the built-in sort types).
    NodeType,
    /// A binary edge label.
    EdgeLabel,
}

#[derive(Clone, Debug)]
struct LabelInfo {
    kind: LabelKind,
    name: String,
}

/// Immutable type graph shared by patterns and host graphs.
#[derive(Clone, Debug)]
pub struct TypeGraph {
    labels: Vec<LabelInfo>,
    node_types: IndexMap<String, LabelId>,
    edge_labels: IndexMap<String, LabelId>,
    /// Reflexive-transitive subtypes per node type, sorted. Empty for edge labels.
    subtypes: Vec<Vec<LabelId>>,
    sorts: [LabelId; 3],
}

impl TypeGraph {
    /// Start building a type graph. The sort types are registered up front.
    pub fn builder() -> TypeGraphBuilder {
        TypeGraphBuilder::new()
    }

    /// Look up a node type by name.
    pub fn node_type(&self, name: &str) -> Option<LabelId> {
        self.node_types.get(name).copied()
    }

    /// Look up an edge label by name.
    pub fn edge_label(&self, name: &str) -> Option<LabelId> {
        self.edge_labels.get(name).copied()
    }

    /// The node type that value nodes of `sort` carry.
    pub const fn sort_type(&self, sort: Sort) -> LabelId {
        match sort {
            Sort::Bool => self.sorts[0],
            Sort::Int => self.sorts[1],
            Sort::String => self.sorts[2],
        }
    }

    /// The sort represented by `ty`, if it is one of the built-in sort types.
    pub fn sort_of(&self, ty: LabelId) -> Option<Sort> {
        [Sort::Bool, Sort::Int, Sort::String]
            .into_iter()
            .find(|&s| self.sort_type(s) == ty)
    }

    /// Name of a label.
    pub fn name(&self, id: LabelId) -> &str {
        &self.labels[id.index()].name
    }

    /// Namespace of a label.
    pub fn kind(&self, id: LabelId) -> LabelKind {
        self.labels[id.index()].kind
    }

    /// Number of interned labels of both kinds.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// All edge labels, in declaration order.
    pub fn edge_labels(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.edge_labels.values().copied()
    }

    /// The node types matched by a pattern node of type `ty`.
    ///
    /// A sharp type matches exactly itself; otherwise every transitive subtype
    /// matches as well. The result is sorted.
    pub fn matching_types(&self, ty: LabelId, sharp: bool) -> Vec<LabelId> {
        if sharp {
            vec![ty]
        } else {
            self.subtypes[ty.index()].clone()
        }
    }

    /// Whether a host node of type `actual` satisfies a pattern type constraint.
    pub fn is_subtype(&self, actual: LabelId, expected: LabelId) -> bool {
        self.subtypes[expected.index()].binary_search(&actual).is_ok()
    }
}

/// Builder for a [`TypeGraph`].
#[derive(Debug)]
pub struct TypeGraphBuilder {
    labels: Vec<LabelInfo>,
    node_types: IndexMap<String, LabelId>,
    edge_labels: IndexMap<String, LabelId>,
    supertypes: Vec<(LabelId, LabelId)>,
}

impl TypeGraphBuilder {
    fn new() -> Self {
        let mut builder = Self {
            labels: Vec::new(),
            node_types: IndexMap::new(),
            edge_labels: IndexMap::new(),
            supertypes: Vec::new(),
        };
        for sort in [Sort::Bool, Sort::Int, Sort::String] {
            builder.intern(LabelKind::NodeType, sort.name());
        }
        builder
    }

    fn intern(&mut self, kind: LabelKind, name: &str) -> LabelId {
        let table = match kind {
            LabelKind::NodeType => &mut self.node_types,
            LabelKind::EdgeLabel => &mut self.edge_labels,
        };
        if let Some(id) = table.get(name) {
            return *id;
        }
        let id = LabelId(self.labels.len() as u32);
        table.insert(name.to_owned(), id);
        self.labels.push(LabelInfo {
            kind,
            name: name.to_owned(),
        });
        id
    }

    /// Declare a node type (idempotent).
    pub fn node_type(&mut self, name: &str) -> LabelId {
        self.intern(LabelKind::NodeType, name)
    }

    /// Declare an edge label (idempotent).
    pub fn edge_label(&mut self, name: &str) -> LabelId {
        self.intern(LabelKind::EdgeLabel, name)
    }

    /// Declare `sub` to be a direct subtype of `sup`.
    pub fn subtype(&mut self, sub: &str, sup: &str) -> &mut Self {
        let sub = self.node_type(sub);
        let sup = self.node_type(sup);
        self.supertypes.push((sub, sup));
        self
    }

    /// Freeze the type graph, computing the subtype closure.
    pub fn build(self) -> Result<TypeGraph, TypeError> {
        let count = self.labels.len();
        let mut direct_subs: Vec<Vec<LabelId>> = vec![Vec::new(); count];
        for &(sub, sup) in &self.supertypes {
            if sub == sup {
                return Err(TypeError::CyclicSubtype(self.labels[sub.index()].name.clone()));
            }
            direct_subs[sup.index()].push(sub);
        }

        let mut subtypes: Vec<Vec<LabelId>> = vec![Vec::new(); count];
        for (ix, info) in self.labels.iter().enumerate() {
            if info.kind != LabelKind::NodeType {
                continue;
            }
            let root = LabelId(ix as u32);
            let mut seen = vec![false; count];
            let mut stack = vec![root];
            let mut closure = Vec::new();
            while let Some(ty) = stack.pop() {
                if seen[ty.index()] {
                    continue;
                }
                seen[ty.index()] = true;
                closure.push(ty);
                for &sub in &direct_subs[ty.index()] {
                    if sub == root {
                        return Err(TypeError::CyclicSubtype(info.name.clone()));
                    }
                    stack.push(sub);
                }
            }
            closure.sort_unstable();
            subtypes[ix] = closure;
        }

        let sorts = [Sort::Bool, Sort::Int, Sort::String].map(|s| self.node_types[s.name()]);

        Ok(TypeGraph {
            labels: self.labels,
            node_types: self.node_types,
            edge_labels: self.edge_labels,
            subtypes,
            sorts,
        })
    }
}

impl fmt::Display for TypeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TypeGraph({} node types, {} edge labels)",
            self.node_types.len(),
            self.edge_labels.len()
        )
    }
}

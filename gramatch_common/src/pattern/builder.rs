//! Incremental, validating construction of a [`Pattern`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::algebra::{Operator, SetOperator, Sort, Value};
use crate::error::PatternError;
use crate::regex::{Guard, RegAut, RegExpr};
use crate::types::{LabelId, LabelKind, TypeGraph};

use super::{
    Condition, ConditionId, Equation, Operation, PEdgeId, PNodeId, PVarId, Pattern, PatternEdge,
    PatternLabel, PatternNode, PatternNodeKind, PatternVar, Quantifier, SetOperation, VarKind,
};

/// Builder for a [`Pattern`]. The root condition exists from the start.
#[derive(Debug)]
pub struct PatternBuilder {
    types: Arc<TypeGraph>,
    nodes: Vec<PatternNode>,
    edges: Vec<PatternEdge>,
    vars: Vec<PatternVar>,
    conditions: Vec<Condition>,
}

impl PatternBuilder {
    pub(super) fn new(types: Arc<TypeGraph>) -> Self {
        Self {
            types,
            nodes: Vec::new(),
            edges: Vec::new(),
            vars: Vec::new(),
            conditions: vec![Condition::new(
                ConditionId(0),
                "root".to_owned(),
                Quantifier::Exists,
                None,
            )],
        }
    }

    /// The type graph.
    pub fn types(&self) -> &Arc<TypeGraph> {
        &self.types
    }

    /// The root condition.
    pub const fn root(&self) -> ConditionId {
        ConditionId(0)
    }

    fn check_condition(&self, cond: ConditionId) -> Result<(), PatternError> {
        if cond.index() < self.conditions.len() {
            Ok(())
        } else {
            Err(PatternError::UnknownCondition(cond))
        }
    }

    fn encloses(&self, ancestor: ConditionId, cond: ConditionId) -> bool {
        let mut current = Some(cond);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.conditions[c.index()].parent;
        }
        false
    }

    fn check_node(&self, cond: ConditionId, node: PNodeId) -> Result<&PatternNode, PatternError> {
        self.check_condition(cond)?;
        let pn = self
            .nodes
            .get(node.index())
            .ok_or(PatternError::UnknownNode(node))?;
        if self.encloses(pn.owner, cond) {
            Ok(pn)
        } else {
            Err(PatternError::NotVisible {
                element: pn.name.clone(),
                condition: cond,
            })
        }
    }

    fn check_var(&self, cond: ConditionId, var: PVarId, kind: VarKind) -> Result<(), PatternError> {
        let pv = self.vars.get(var.index()).ok_or(PatternError::UnknownVar(var))?;
        if pv.kind != kind {
            return Err(PatternError::VarKindMismatch(pv.name.clone()));
        }
        if !self.encloses(pv.owner, cond) {
            return Err(PatternError::NotVisible {
                element: pv.name.clone(),
                condition: cond,
            });
        }
        Ok(())
    }

    fn check_value_node(&self, cond: ConditionId, node: PNodeId) -> Result<Sort, PatternError> {
        match &self.check_node(cond, node)?.kind {
            PatternNodeKind::Value { sort, .. } => Ok(*sort),
            PatternNodeKind::Typed { .. } => Err(PatternError::NotAValueNode(node)),
        }
    }

    fn push_node(&mut self, cond: ConditionId, name: &str, kind: PatternNodeKind) -> Result<PNodeId, PatternError> {
        self.check_condition(cond)?;
        let id = PNodeId(self.nodes.len() as u32);
        self.nodes.push(PatternNode {
            name: name.to_owned(),
            kind,
            relevant: true,
            owner: cond,
        });
        self.conditions[cond.index()].nodes.push(id);
        Ok(id)
    }

    /// Add a typed node by type id.
    pub fn typed_node(
        &mut self,
        cond: ConditionId,
        name: &str,
        ty: LabelId,
        sharp: bool,
    ) -> Result<PNodeId, PatternError> {
        if ty.index() >= self.types.label_count() || self.types.kind(ty) != LabelKind::NodeType {
            return Err(PatternError::UnknownLabel(format!("#{}", ty.0)));
        }
        self.push_node(
            cond,
            name,
            PatternNodeKind::Typed {
                ty,
                sharp,
                type_var: None,
            },
        )
    }

    fn lookup_type(&self, ty: &str) -> Result<LabelId, PatternError> {
        self.types
            .node_type(ty)
            .ok_or_else(|| PatternError::UnknownLabel(ty.to_owned()))
    }

    /// Add a node matching `ty` and its subtypes.
    pub fn node(&mut self, cond: ConditionId, name: &str, ty: &str) -> Result<PNodeId, PatternError> {
        let ty = self.lookup_type(ty)?;
        self.typed_node(cond, name, ty, false)
    }

    /// Add a node matching exactly `ty`.
    pub fn sharp_node(&mut self, cond: ConditionId, name: &str, ty: &str) -> Result<PNodeId, PatternError> {
        let ty = self.lookup_type(ty)?;
        self.typed_node(cond, name, ty, true)
    }

    /// Add a value node of `sort` without a fixed value.
    pub fn value_node(&mut self, cond: ConditionId, name: &str, sort: Sort) -> Result<PNodeId, PatternError> {
        self.push_node(
            cond,
            name,
            PatternNodeKind::Value {
                sort,
                constant: None,
            },
        )
    }

    /// Add a value node fixed to `value`.
    pub fn constant(&mut self, cond: ConditionId, name: &str, value: Value) -> Result<PNodeId, PatternError> {
        self.push_node(
            cond,
            name,
            PatternNodeKind::Value {
                sort: value.sort(),
                constant: Some(value),
            },
        )
    }

    fn push_var(&mut self, cond: ConditionId, name: &str, kind: VarKind) -> Result<PVarId, PatternError> {
        self.check_condition(cond)?;
        let id = PVarId(self.vars.len() as u32);
        self.vars.push(PatternVar {
            name: name.to_owned(),
            kind,
            owner: cond,
        });
        self.conditions[cond.index()].vars.push(id);
        Ok(id)
    }

    /// Declare a variable ranging over edge labels.
    pub fn label_var(&mut self, cond: ConditionId, name: &str) -> Result<PVarId, PatternError> {
        self.push_var(cond, name, VarKind::EdgeLabel)
    }

    /// Declare a variable ranging over node types.
    pub fn type_var(&mut self, cond: ConditionId, name: &str) -> Result<PVarId, PatternError> {
        self.push_var(cond, name, VarKind::NodeType)
    }

    /// Bind the actual type of `node` to `var`.
    pub fn bind_type(&mut self, node: PNodeId, var: PVarId) -> Result<(), PatternError> {
        let owner = self
            .nodes
            .get(node.index())
            .ok_or(PatternError::UnknownNode(node))?
            .owner;
        self.check_var(owner, var, VarKind::NodeType)?;
        match &mut self.nodes[node.index()].kind {
            PatternNodeKind::Typed { type_var, .. } => {
                *type_var = Some(var);
                Ok(())
            }
            PatternNodeKind::Value { .. } => Err(PatternError::TypeVarOnValueNode(node)),
        }
    }

    fn push_edge(
        &mut self,
        cond: ConditionId,
        source: PNodeId,
        label: PatternLabel,
        target: PNodeId,
    ) -> Result<PEdgeId, PatternError> {
        self.check_node(cond, source)?;
        self.check_node(cond, target)?;
        let id = PEdgeId(self.edges.len() as u32);
        self.edges.push(PatternEdge {
            source,
            target,
            label,
            relevant: true,
            owner: cond,
        });
        self.conditions[cond.index()].edges.push(id);
        Ok(id)
    }

    /// Add an edge with a fixed label.
    pub fn edge(
        &mut self,
        cond: ConditionId,
        source: PNodeId,
        label: &str,
        target: PNodeId,
    ) -> Result<PEdgeId, PatternError> {
        let label = self
            .types
            .edge_label(label)
            .ok_or_else(|| PatternError::UnknownLabel(label.to_owned()))?;
        self.push_edge(cond, source, PatternLabel::Plain(label), target)
    }

    /// Add a wildcard edge, optionally binding its label to `var`.
    pub fn wildcard_edge(
        &mut self,
        cond: ConditionId,
        source: PNodeId,
        var: Option<PVarId>,
        guard: Guard,
        target: PNodeId,
    ) -> Result<PEdgeId, PatternError> {
        if let Some(var) = var {
            self.check_var(cond, var, VarKind::EdgeLabel)?;
        }
        self.push_edge(cond, source, PatternLabel::Wildcard { var, guard }, target)
    }

    /// Add an edge standing for a path matched by `expr`.
    pub fn regex_edge(
        &mut self,
        cond: ConditionId,
        source: PNodeId,
        expr: RegExpr,
        target: PNodeId,
    ) -> Result<PEdgeId, PatternError> {
        for var in expr.vars() {
            self.check_var(cond, var, VarKind::EdgeLabel)?;
        }
        self.push_edge(cond, source, PatternLabel::Regex(expr), target)
    }

    /// Mark a node as not distinguishing matches.
    pub fn irrelevant_node(&mut self, node: PNodeId) -> Result<(), PatternError> {
        let pn = self
            .nodes
            .get_mut(node.index())
            .ok_or(PatternError::UnknownNode(node))?;
        pn.relevant = false;
        Ok(())
    }

    /// Mark an edge as not distinguishing matches.
    pub fn irrelevant_edge(&mut self, edge: PEdgeId) -> Result<(), PatternError> {
        let pe = self
            .edges
            .get_mut(edge.index())
            .ok_or(PatternError::UnknownEdge(edge))?;
        pe.relevant = false;
        Ok(())
    }

    fn push_equation(&mut self, cond: ConditionId, left: PNodeId, right: PNodeId, equal: bool) -> Result<(), PatternError> {
        self.check_node(cond, left)?;
        self.check_node(cond, right)?;
        self.conditions[cond.index()]
            .equations
            .push(Equation { left, right, equal });
        Ok(())
    }

    /// Require two nodes to have the same image.
    pub fn equal(&mut self, cond: ConditionId, left: PNodeId, right: PNodeId) -> Result<(), PatternError> {
        self.push_equation(cond, left, right, true)
    }

    /// Require two nodes to have different images.
    pub fn distinct(&mut self, cond: ConditionId, left: PNodeId, right: PNodeId) -> Result<(), PatternError> {
        self.push_equation(cond, left, right, false)
    }

    /// Compute `target = op(args)` over value nodes.
    pub fn operation(
        &mut self,
        cond: ConditionId,
        op: Operator,
        args: &[PNodeId],
        target: PNodeId,
    ) -> Result<(), PatternError> {
        if args.len() != op.arity() {
            return Err(PatternError::ArityMismatch {
                op,
                expected: op.arity(),
                actual: args.len(),
            });
        }
        for &arg in args {
            self.check_value_node(cond, arg)?;
        }
        let sort = self.check_value_node(cond, target)?;
        if sort != op.result_sort() {
            return Err(PatternError::SortMismatch {
                node: target,
                expected: op.result_sort(),
                actual: sort,
            });
        }
        self.conditions[cond.index()].operations.push(Operation {
            op,
            args: args.to_vec(),
            target,
        });
        Ok(())
    }

    /// Compute `target = op({ arg | sub-match of sub })`.
    pub fn set_operation(
        &mut self,
        cond: ConditionId,
        op: SetOperator,
        sub: ConditionId,
        arg: PNodeId,
        target: PNodeId,
    ) -> Result<(), PatternError> {
        self.check_condition(sub)?;
        if self.conditions[sub.index()].parent != Some(cond) {
            return Err(PatternError::NotAChild { parent: cond, child: sub });
        }
        if matches!(self.conditions[sub.index()].quantifier, Quantifier::Not) {
            return Err(PatternError::NegatedAggregate(sub));
        }
        self.check_value_node(sub, arg)?;
        let sort = self.check_value_node(cond, target)?;
        if sort != op.result_sort() {
            return Err(PatternError::SortMismatch {
                node: target,
                expected: op.result_sort(),
                actual: sort,
            });
        }
        self.conditions[cond.index()].set_operations.push(SetOperation {
            op,
            condition: sub,
            arg,
            target,
        });
        Ok(())
    }

    /// Add a nested condition below `parent`.
    pub fn condition(
        &mut self,
        parent: ConditionId,
        name: &str,
        quantifier: Quantifier,
    ) -> Result<ConditionId, PatternError> {
        self.check_condition(parent)?;
        let id = ConditionId(self.conditions.len() as u32);
        self.conditions
            .push(Condition::new(id, name.to_owned(), quantifier, Some(parent)));
        self.conditions[parent.index()].children.push(id);
        Ok(id)
    }

    /// Bind the number of matches of `sub` to the parent-owned integer node `node`.
    pub fn count(&mut self, sub: ConditionId, node: PNodeId) -> Result<(), PatternError> {
        self.check_condition(sub)?;
        let parent = self.conditions[sub.index()]
            .parent
            .ok_or_else(|| PatternError::InvalidCountNode(self.conditions[sub.index()].name.clone()))?;
        let sort = self.check_value_node(parent, node)?;
        if sort != Sort::Int
            || self.nodes[node.index()].owner != parent
            || matches!(self.conditions[sub.index()].quantifier, Quantifier::Not | Quantifier::True)
        {
            return Err(PatternError::InvalidCountNode(self.nodes[node.index()].name.clone()));
        }
        self.conditions[sub.index()].count_node = Some(node);
        Ok(())
    }

    /// Validate, compute condition roots and compile regular expressions.
    pub fn build(mut self) -> Result<Arc<Pattern>, PatternError> {
        self.compute_roots();
        self.check_vars_bound()?;
        self.check_values_bound()?;

        let automata = self
            .edges
            .iter()
            .map(|edge| match &edge.label {
                PatternLabel::Regex(expr) => Some(Arc::new(RegAut::compile(expr))),
                _ => None,
            })
            .collect();

        tracing::debug!(
            "built pattern: {} nodes, {} edges, {} vars, {} conditions",
            self.nodes.len(),
            self.edges.len(),
            self.vars.len(),
            self.conditions.len()
        );

        Ok(Arc::new(Pattern {
            types: self.types,
            nodes: self.nodes,
            edges: self.edges,
            vars: self.vars,
            conditions: self.conditions,
            automata,
        }))
    }

    /// Roots are computed bottom-up; children always have larger ids than their parents.
    fn compute_roots(&mut self) {
        for ix in (0..self.conditions.len()).rev() {
            let cond = &self.conditions[ix];
            let mut nodes: BTreeSet<PNodeId> = BTreeSet::new();
            let mut vars: BTreeSet<PVarId> = BTreeSet::new();

            for &e in &cond.edges {
                let edge = &self.edges[e.index()];
                nodes.insert(edge.source);
                nodes.insert(edge.target);
                match &edge.label {
                    PatternLabel::Plain(_) => {}
                    PatternLabel::Wildcard { var, .. } => vars.extend(*var),
                    PatternLabel::Regex(expr) => vars.extend(expr.vars()),
                }
            }
            for eq in &cond.equations {
                nodes.insert(eq.left);
                nodes.insert(eq.right);
            }
            for op in &cond.operations {
                nodes.extend(op.args.iter().copied());
                nodes.insert(op.target);
            }
            for op in &cond.set_operations {
                nodes.insert(op.target);
            }
            for &n in &cond.nodes {
                vars.extend(self.nodes[n.index()].type_var());
            }
            for &child in &cond.children {
                let child = &self.conditions[child.index()];
                nodes.extend(child.root_nodes.iter().copied());
                vars.extend(child.root_vars.iter().copied());
                nodes.extend(child.count_node);
            }

            let id = ConditionId(ix as u32);
            let root_nodes = nodes
                .into_iter()
                .filter(|n| self.nodes[n.index()].owner != id)
                .collect();
            let root_vars = vars
                .into_iter()
                .filter(|v| self.vars[v.index()].owner != id)
                .collect();
            let cond = &mut self.conditions[ix];
            cond.root_nodes = root_nodes;
            cond.root_vars = root_vars;
        }
    }

    /// Every variable needs a binder (wildcard edge or typed node) in its own condition.
    fn check_vars_bound(&self) -> Result<(), PatternError> {
        let mut bound = vec![false; self.vars.len()];
        for edge in &self.edges {
            if let PatternLabel::Wildcard { var: Some(v), .. } = edge.label {
                if self.vars[v.index()].owner == edge.owner {
                    bound[v.index()] = true;
                }
            }
        }
        for node in &self.nodes {
            if let Some(v) = node.type_var() {
                if self.vars[v.index()].owner == node.owner {
                    bound[v.index()] = true;
                }
            }
        }
        match bound.iter().position(|b| !b) {
            Some(ix) => Err(PatternError::UnboundVariable(self.vars[ix].name.clone())),
            None => Ok(()),
        }
    }

    /// Value nodes without a constant need an edge, operation or count in their own condition.
    fn check_values_bound(&self) -> Result<(), PatternError> {
        let mut bound = vec![false; self.nodes.len()];
        for (ix, node) in self.nodes.iter().enumerate() {
            bound[ix] = match &node.kind {
                PatternNodeKind::Value { constant, .. } => constant.is_some(),
                PatternNodeKind::Typed { .. } => true,
            };
        }
        for edge in &self.edges {
            for n in [edge.source, edge.target] {
                if self.nodes[n.index()].owner == edge.owner {
                    bound[n.index()] = true;
                }
            }
        }
        for cond in &self.conditions {
            let targets = cond
                .operations
                .iter()
                .map(|op| op.target)
                .chain(cond.set_operations.iter().map(|op| op.target))
                .chain(
                    cond.children
                        .iter()
                        .filter_map(|c| self.conditions[c.index()].count_node),
                );
            for n in targets {
                if self.nodes[n.index()].owner == cond.id {
                    bound[n.index()] = true;
                }
            }
        }
        match bound.iter().position(|b| !b) {
            Some(ix) => Err(PatternError::UnboundValueNode(self.nodes[ix].name.clone())),
            None => Ok(()),
        }
    }
}

//! Presence-test discovery and index generation.
//!
//! The indexer finds every `has(...)` over a pure field-qualification
//! chain, ranks the queried paths by frequency, and specializes the
//! expression once per distinct effective mask: selected presence tests
//! become literal booleans and the constant folder collapses the branches
//! they guarded.

use rustc_hash::FxHashMap;

use pel_eval::Env;
use pel_ir::{
    match_descendants, navigate, Ast, Constant, ExprId, ExprKind, NavigableExpr, SelectExpr,
};
use pel_opt::{AstOptimizer, ConstantFolding, OptimizeError, StaticOptimizer};
use pel_types::TypeEnv;

use crate::field_trie::{FieldFrequency, FieldTrie};
use crate::mask;
use crate::{IndexError, MAX_FIELD_PATTERNS};

/// A stateless index generator.
pub struct Indexer;

impl Indexer {
    pub fn new() -> Self {
        Indexer
    }

    /// Build the specialization index for one expression.
    ///
    /// With no presence tests the index degenerates to a single slot
    /// holding the input unchanged.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn generate_index(&self, env: &Env, ast: &Ast) -> Result<IndexedAst, IndexError> {
        let folder = ConstantFolding;
        let fields = self.find_frequent_presence_fields(ast);
        if fields.is_empty() {
            tracing::debug!("no presence tests; index is a single pass-through slot");
            return Ok(IndexedAst {
                fields,
                mask_to_slot: vec![0],
                asts: vec![ast.clone()],
            });
        }
        let plan = mask::plan(&fields);
        tracing::debug!(
            fields = fields.len(),
            slots = plan.effective_masks.len(),
            "planned specializations"
        );
        let mut asts = Vec::with_capacity(plan.effective_masks.len());
        for &effective in &plan.effective_masks {
            let rewriter = PresenceRewriter::new(effective, &fields);
            let passes: [&dyn AstOptimizer; 2] = [&rewriter, &folder];
            let optimizer = StaticOptimizer::new(&passes);
            let specialized = optimizer.optimize(env.types(), ast)?;
            asts.push(specialized);
        }
        Ok(IndexedAst { fields, mask_to_slot: plan.mask_to_slot, asts })
    }

    /// Locate presence tests, rank their paths, and keep the top
    /// `MAX_FIELD_PATTERNS`.
    fn find_frequent_presence_fields(&self, ast: &Ast) -> Vec<FieldFrequency> {
        let tests = match_descendants(navigate(ast), is_presence_test);
        let mut trie = FieldTrie::new();
        for test in &tests {
            let Some(select) = test.as_select() else { continue };
            let Some(field) = qualified_field_name(ast, &select) else { continue };
            trie.add(&field, test.id());
        }
        let mut fields = trie.sorted_presence_fields();
        fields.truncate(MAX_FIELD_PATTERNS);
        fields
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

/// The specialization index for one expression.
pub struct IndexedAst {
    /// Selected presence fields, frequency-descending; index i owns bit i.
    pub(crate) fields: Vec<FieldFrequency>,
    /// Slot for every raw mask, indexed by the mask itself.
    pub(crate) mask_to_slot: Vec<usize>,
    /// Specialized trees, one per distinct effective mask.
    pub(crate) asts: Vec<Ast>,
}

impl IndexedAst {
    pub fn fields(&self) -> &[FieldFrequency] {
        &self.fields
    }

    pub fn mask_to_slot(&self) -> &[usize] {
        &self.mask_to_slot
    }

    pub fn asts(&self) -> &[Ast] {
        &self.asts
    }
}

/// Rewrites the selected presence-test nodes to literal booleans for one
/// effective mask. Every other node keeps its id and kind, so the
/// folder's id-indexed bookkeeping stays valid.
struct PresenceRewriter {
    updates: FxHashMap<ExprId, bool>,
}

impl PresenceRewriter {
    fn new(effective_mask: u8, fields: &[FieldFrequency]) -> Self {
        let mut updates = FxHashMap::default();
        for (i, field) in fields.iter().enumerate() {
            updates.insert(field.id(), effective_mask & (1 << i) != 0);
        }
        PresenceRewriter { updates }
    }
}

impl AstOptimizer for PresenceRewriter {
    fn optimize(&self, _env: &TypeEnv, ast: &mut Ast) -> Result<(), OptimizeError> {
        let matches: Vec<ExprId> = match_descendants(navigate(ast), |e| {
            self.updates.contains_key(&e.id())
        })
        .iter()
        .map(NavigableExpr::id)
        .collect();
        for id in matches {
            let present = self.updates[&id];
            ast.arena_mut()
                .set_kind(id, ExprKind::Literal(Constant::Bool(present)));
        }
        Ok(())
    }
}

/// Matches a presence test whose operand is a pure field-qualification
/// chain: a root identifier followed only by plain field selections. Any
/// other operand (a call, an index, a comprehension) disqualifies the
/// node.
fn is_presence_test(expr: &NavigableExpr) -> bool {
    match expr.as_select() {
        Some(select) if select.test_only => is_field_qualification(&select.operand),
        _ => false,
    }
}

fn is_field_qualification(expr: &NavigableExpr) -> bool {
    if expr.as_ident().is_some() {
        return true;
    }
    match expr.as_select() {
        Some(select) if !select.test_only => is_field_qualification(&select.operand),
        _ => false,
    }
}

/// The full dotted path a presence test queries, assembled left to right.
fn qualified_field_name(ast: &Ast, select: &SelectExpr) -> Option<String> {
    let prefix = operand_path(ast, &select.operand)?;
    Some(format!("{prefix}.{}", ast.name(select.field)))
}

fn operand_path(ast: &Ast, expr: &NavigableExpr) -> Option<String> {
    if let Some(name) = expr.as_ident() {
        return Some(ast.name(name).to_owned());
    }
    let select = expr.as_select()?;
    if select.test_only {
        return None;
    }
    let prefix = operand_path(ast, &select.operand)?;
    Some(format!("{prefix}.{}", ast.name(select.field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pel_ir::SharedInterner;
    use pel_parse::parse;

    fn located_fields(src: &str) -> Vec<(String, ExprId)> {
        let ast = parse(src, SharedInterner::new()).unwrap();
        let tests = match_descendants(navigate(&ast), is_presence_test);
        tests
            .iter()
            .map(|t| {
                let select = t.as_select().unwrap();
                (qualified_field_name(&ast, &select).unwrap(), t.id())
            })
            .collect()
    }

    #[test]
    fn locates_chained_presence_tests() {
        let fields = located_fields("has(a.b) && has(a.b.c.d) || has(x.y)");
        let names: Vec<&str> = fields.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, ["a.b", "a.b.c.d", "x.y"]);
    }

    #[test]
    fn rejects_non_qualification_operands() {
        // The operand of the has() is a call, not a field chain.
        let ast = parse("has(f(x).y)", SharedInterner::new()).unwrap();
        let tests = match_descendants(navigate(&ast), is_presence_test);
        assert!(tests.is_empty());
    }

    #[test]
    fn locator_sees_tests_inside_quantifiers() {
        let fields = located_fields("xs.all(x, has(a.b))");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "a.b");
    }

    #[test]
    fn rewriter_touches_only_selected_nodes() {
        let ast = parse("has(a.b) ? a : has(b.c) ? b : c", SharedInterner::new()).unwrap();
        let tests = match_descendants(navigate(&ast), is_presence_test);
        let mut trie = FieldTrie::new();
        for test in &tests {
            let select = test.as_select().unwrap();
            trie.add(&qualified_field_name(&ast, &select).unwrap(), test.id());
        }
        let fields = trie.sorted_presence_fields();
        // Mask 0b01: a.b present, b.c absent.
        let rewriter = PresenceRewriter::new(0b01, &fields);
        let mut rewritten = ast.clone();
        rewriter.optimize(&TypeEnv::new(), &mut rewritten).unwrap();
        assert_eq!(
            rewritten.arena().kind(fields[0].id()),
            ExprKind::Literal(Constant::Bool(true))
        );
        assert_eq!(
            rewritten.arena().kind(fields[1].id()),
            ExprKind::Literal(Constant::Bool(false))
        );
        // The original tree is untouched; unselected nodes keep their kind.
        assert!(matches!(
            ast.arena().kind(fields[0].id()),
            ExprKind::Select { test_only: true, .. }
        ));
    }
}

//! Indexed execution: probe the fields, build the mask, dispatch.

use pel_eval::{Activation, Attribute, Env, EvalResult, Program, Qualifier};
use pel_types::Type;

use crate::field_trie::FieldFrequency;
use crate::{IndexError, IndexedAst};

/// A compiled index: one probe per selected field and one executable per
/// specialization slot. Everything is read-only after construction, so a
/// single `IndexedProgram` serves concurrent evaluations.
#[derive(Debug)]
pub struct IndexedProgram {
    /// Probe for each selected field; `None` marks a field whose root was
    /// undeclared, so its bit never fires.
    probes: Vec<Option<Attribute>>,
    mask_to_slot: Vec<usize>,
    programs: Vec<Program>,
}

impl IndexedProgram {
    /// Compile probes and per-slot programs for an index.
    #[tracing::instrument(level = "debug", skip_all, fields(
        fields = indexed.fields().len(),
        slots = indexed.asts().len(),
    ))]
    pub fn new(env: &Env, indexed: &IndexedAst) -> Result<Self, IndexError> {
        let mut probes = Vec::with_capacity(indexed.fields().len());
        for field in indexed.fields() {
            probes.push(compile_probe(env, field)?);
        }
        let programs = indexed.asts().iter().map(|ast| env.program(ast)).collect();
        Ok(IndexedProgram {
            probes,
            mask_to_slot: indexed.mask_to_slot().to_vec(),
            programs,
        })
    }

    /// Probe the selected fields on `activation`, assemble the raw mask,
    /// and run the specialization its slot points at.
    ///
    /// A probe that resolves absent leaves its bit clear; a probe error
    /// aborts the evaluation. The planner already folded every raw mask
    /// onto the right specialization, so no effective-mask computation
    /// happens per request.
    pub fn eval(&self, activation: &dyn Activation) -> EvalResult {
        let mut mask = 0u8;
        for (bit, probe) in self.probes.iter().enumerate() {
            let Some(attribute) = probe else { continue };
            if attribute.resolve(activation)?.is_some() {
                mask |= 1 << bit;
            }
        }
        let slot = self.mask_to_slot[mask as usize];
        self.programs[slot].eval(activation)
    }
}

/// Build the minimal presence probe for one field path.
///
/// The root variable's declared type anchors the chain; each segment gets
/// a presence-only qualifier, and the "current type" advances through
/// declared struct fields, falling back to `Dyn` once static knowledge
/// runs out. An undeclared root is a soft skip, not an error.
fn compile_probe(env: &Env, field: &FieldFrequency) -> Result<Option<Attribute>, IndexError> {
    let mut segments = field.field().split('.');
    let Some(root) = segments.next() else {
        return Ok(None);
    };
    let Some(decl) = env.find_variable(root) else {
        tracing::debug!(field = field.field(), "root variable undeclared; probe skipped");
        return Ok(None);
    };
    let mut attribute = Attribute::absolute(field.id(), decl.name());
    let mut current = decl.ty().clone();
    for segment in segments {
        let qualifier = Qualifier::new(&current, field.id(), segment, true)
            .map_err(IndexError::TypeResolution)?;
        attribute = attribute.add_qualifier(qualifier);
        current = match current
            .struct_name()
            .and_then(|name| env.find_struct_field_type(name, segment))
        {
            Some(field_type) => field_type.clone(),
            None => Type::Dyn,
        };
    }
    Ok(Some(attribute))
}

//! Graph relations: mapping a relation across sequences, and rewriting
//! expression trees to (and from) fixed points of a one-step relation.
//!
//! Everything here is bidirectional. A ground input and free output runs
//! as a reduction; a free input and ground output enumerates expansions;
//! both free enumerates the relation's graph. There is no cycle detection:
//! fair interleaving stands in for termination, and memoizing here would
//! change which answers are observable.

use crate::goal::{conde, eq, fresh, lall, succeed, Goal};
use crate::lists::{conso, nullo_as};
use crate::proto::applyo;
use crate::term::TermId;
use std::sync::Arc;

/// A binary relation packaged as a goal constructor.
pub type BinaryRel = Arc<dyn Fn(TermId, TermId) -> Goal>;

/// Lift a closure into a [`BinaryRel`].
pub fn rel2(f: impl Fn(TermId, TermId) -> Goal + 'static) -> BinaryRel {
    Arc::new(f)
}

/// The identity relation.
pub fn eq_rel() -> BinaryRel {
    Arc::new(eq)
}

/// Goal: `rel` holds pairwise between the elements of `a` and `b`, which
/// end together.
pub fn mapo(rel: BinaryRel, a: TermId, b: TermId) -> Goal {
    mapo_step(rel, a, b, None)
}

fn mapo_step(rel: BinaryRel, a: TermId, b: TermId, null: Option<TermId>) -> Goal {
    Goal::new(move |s| {
        let rel = rel.clone();
        conde(vec![
            vec![nullo_as(null, vec![a, b])],
            vec![fresh(move |[ac, ad, bc, bd]| {
                lall(vec![
                    conso(ac, ad, a),
                    conso(bc, bd, b),
                    rel(ac, bc),
                    mapo_step(rel.clone(), ad, bd, null),
                ])
            })],
        ])
        .apply(s)
    })
}

/// Goal: the sequences `a` and `b` have the same length.
pub fn eq_length(a: TermId, b: TermId) -> Goal {
    mapo(rel2(|_, _| succeed()), a, b)
}

/// Goal: `rel` holds between at least one pair of corresponding elements
/// of `a` and `b`; every other pair is equal.
pub fn map_anyo(rel: BinaryRel, a: TermId, b: TermId) -> Goal {
    map_anyo_step(rel, a, b, None, false, true, false)
}

/// The recursion worker. `null_res` decides whether two empty sequences
/// relate with zero applications; `first` marks the outermost call;
/// `any_succeed` records that some earlier pair already applied `rel`.
pub(crate) fn map_anyo_step(
    rel: BinaryRel,
    a: TermId,
    b: TermId,
    null: Option<TermId>,
    null_res: bool,
    first: bool,
    any_succeed: bool,
) -> Goal {
    Goal::new(move |s| {
        let base = if any_succeed || (first && null_res) {
            nullo_as(null, vec![a, b])
        } else {
            crate::goal::fail()
        };
        let rel = rel.clone();
        let step = fresh(move |[ac, ad, bc, bd]| {
            let rel = rel.clone();
            let applied =
                map_anyo_step(rel.clone(), ad, bd, null, null_res, false, true);
            let skipped =
                map_anyo_step(rel.clone(), ad, bd, null, null_res, false, any_succeed);
            lall(vec![
                conso(ac, ad, a),
                conso(bc, bd, b),
                conde(vec![
                    vec![rel(ac, bc), applied],
                    vec![eq(ac, bc), skipped],
                ]),
            ])
        });
        conde(vec![vec![base], vec![step]]).apply(s)
    })
}

/// Close a one-step relation under repeated application.
///
/// `reduceo(rel)` relates a term to the terms reachable by one or more
/// steps of `rel`; an irreducible input relates to nothing. Running
/// backward (free input) it enumerates ever larger terms that reduce to
/// the output, associating the reduced term with the output before
/// generating so finite expansions surface early.
pub fn reduceo(rel: BinaryRel) -> BinaryRel {
    Arc::new(move |a, b| reduceo_goal(rel.clone(), a, b))
}

fn reduceo_goal(rel: BinaryRel, a: TermId, c: TermId) -> Goal {
    Goal::new(move |s| {
        let a_rf = s.walk_all(a);
        let c_rf = s.walk_all(c);

        // The result of one application of the relation.
        let m = s.store().var();

        let single_apply = rel(a_rf, m);
        let single_res = eq(m, c_rf);
        let another_apply = reduceo_goal(rel.clone(), m, c_rf);

        let g = if s.is_var(a_rf) {
            // Expanding: the input is unknown. Unify the reduced term with
            // the output before generating; there is no fixed point to
            // reach, only an unbounded family of preimages.
            lall(vec![
                conde(vec![vec![single_res], vec![another_apply]]),
                single_apply,
            ])
        } else {
            // Reducing: take a step, then keep reducing alongside the
            // single-step result. Recursion bottoms out where no step
            // fires, which is what makes the fixed point reachable.
            lall(vec![
                single_apply,
                conde(vec![vec![another_apply], vec![single_res]]),
            ])
        };
        g.apply(s)
    })
}

/// Options for [`walko_with`]: how heads are related, and which empty term
/// stands in when the walk invents compounds for unbound outputs.
#[derive(Clone)]
pub struct WalkOpts {
    /// Relation between the heads of corresponding compounds.
    pub head_goal: BinaryRel,
    /// The null sentinel for invented sequences (the empty sequence when
    /// unset).
    pub null: Option<TermId>,
}

impl Default for WalkOpts {
    fn default() -> Self {
        Self {
            head_goal: eq_rel(),
            null: None,
        }
    }
}

/// Goal: applying `rel` at every position of the tree `a` yields the tree
/// `b`. Either `rel` holds at the root, or both trees decompose into head
/// and children, the heads are related, and at least one child pair is
/// related by the recursive walk (the rest staying equal). Children are
/// walked with fair interleaving, so an infinite descent in one child
/// cannot starve its siblings or the root alternative.
pub fn walko(rel: BinaryRel, a: TermId, b: TermId) -> Goal {
    walko_with(WalkOpts::default(), rel, a, b)
}

/// [`walko`] with an explicit head relation and null sentinel.
pub fn walko_with(opts: WalkOpts, rel: BinaryRel, a: TermId, b: TermId) -> Goal {
    Goal::new(move |s| {
        let a_rf = s.walk_all(a);
        let b_rf = s.walk_all(b);

        let root = rel(a_rf, b_rf);

        let wrel: BinaryRel = {
            let opts = opts.clone();
            let rel = rel.clone();
            Arc::new(move |x, y| walko_with(opts.clone(), rel.clone(), x, y))
        };
        let head_goal = opts.head_goal.clone();
        let null = opts.null;
        let descend = fresh(move |[h_in, r_in, h_out, r_out]| {
            lall(vec![
                applyo(h_in, r_in, a_rf),
                applyo(h_out, r_out, b_rf),
                head_goal(h_in, h_out),
                map_anyo_step(wrel.clone(), r_in, r_out, null, false, true, false),
            ])
        });

        conde(vec![vec![root], vec![descend]]).apply(s)
    })
}

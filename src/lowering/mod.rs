//! Lowering driver
//!   Takes one SSA method through every stage, in order:
//!
//!   liveness -> allocation -> mapping -> phi elimination
//!     -> (parameter placement) -> (goto elision) -> ROP conversion
//!     -> (identical block merging)
//!
//!   The stages in parentheses are skipped when the allocator or the config
//!   says so. A stage either hands its output to the next one or aborts the
//!   method with an [`InvariantViolation`].

mod convert;
mod phi;

use anyhow::{Context, Result};
use enum_as_inner::EnumAsInner;
use rayon::prelude::*;
use strum_macros::AsRefStr;

use crate::{
  config::LoweringConfig,
  error::InvariantViolation,
  optimization::{elide_gotos, merge_identical_blocks},
  regalloc::{
    debug_show_liveness, params_to_top, AllocatorKind, InterferenceGraph, Liveness,
    RegisterMapper,
  },
  rop::RopMethod,
  ssa::SsaMethod,
  DEFAULT_CONFIG,
};

use self::{convert::convert_to_rop, phi::eliminate_phis};

/// The stages of lowering one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Stage {
  AnalyzingLiveness,
  Allocating,
  ApplyingMapping,
  EliminatingPhis,
  FixingParamPlacement,
  ElidingGotos,
  ConvertingToRop,
  MergingIdenticalBlocks,
  Done,
}

/// A stage together with the input it works on.
#[derive(EnumAsInner)]
enum State {
  AnalyzingLiveness(SsaMethod),
  Allocating(SsaMethod, InterferenceGraph),
  ApplyingMapping(SsaMethod, RegisterMapper),
  EliminatingPhis(SsaMethod),
  FixingParamPlacement(SsaMethod),
  ElidingGotos(SsaMethod),
  ConvertingToRop(SsaMethod),
  MergingIdenticalBlocks(RopMethod),
  Done(RopMethod),
}

/// What stays fixed while one method is lowered.
struct Lowering<'c> {
  config: &'c LoweringConfig,
  allocator: AllocatorKind,
}

impl State {
  fn stage(&self) -> Stage {
    match self {
      State::AnalyzingLiveness(..) => Stage::AnalyzingLiveness,
      State::Allocating(..) => Stage::Allocating,
      State::ApplyingMapping(..) => Stage::ApplyingMapping,
      State::EliminatingPhis(..) => Stage::EliminatingPhis,
      State::FixingParamPlacement(..) => Stage::FixingParamPlacement,
      State::ElidingGotos(..) => Stage::ElidingGotos,
      State::ConvertingToRop(..) => Stage::ConvertingToRop,
      State::MergingIdenticalBlocks(..) => Stage::MergingIdenticalBlocks,
      State::Done(..) => Stage::Done,
    }
  }

  /// (blocks, registers) of the method being worked on.
  fn size(&self) -> (usize, u32) {
    match self {
      State::AnalyzingLiveness(m)
      | State::Allocating(m, _)
      | State::ApplyingMapping(m, _)
      | State::EliminatingPhis(m)
      | State::FixingParamPlacement(m)
      | State::ElidingGotos(m)
      | State::ConvertingToRop(m) => (m.blocks().len(), m.reg_count()),
      State::MergingIdenticalBlocks(rop) | State::Done(rop) => (rop.blocks().len(), rop.reg_count()),
    }
  }
}

impl<'c> Lowering<'c> {
  fn step(&self, state: State) -> Result<State, InvariantViolation> {
    let next = match state {
      State::AnalyzingLiveness(method) => {
        let liveness = Liveness::from_method(&method);
        debug_show_liveness(&method, &liveness);
        let igraph = InterferenceGraph::from_liveness(&liveness, &method);
        if self.config.dump_interference {
          match igraph.dump() {
            Ok(json) => log::debug!("interference graph: {}", json),
            Err(e) => log::warn!("cannot dump interference graph: {}", e),
          }
        }
        State::Allocating(method, igraph)
      }
      State::Allocating(method, igraph) => {
        let mapper = self.allocator.allocate(&method, &igraph);
        State::ApplyingMapping(method, mapper)
      }
      State::ApplyingMapping(mut method, mapper) => {
        method.map_registers(&mapper);
        State::EliminatingPhis(method)
      }
      State::EliminatingPhis(method) => {
        let method = eliminate_phis(method)?;
        if self.allocator.wants_params_moved_high()
          && method.params_at_top()
          && method.param_width() > 0
        {
          State::FixingParamPlacement(method)
        } else {
          self.after_param_placement(method)
        }
      }
      State::FixingParamPlacement(mut method) => {
        let mapper = params_to_top(method.param_width(), method.reg_count());
        method.map_registers(&mapper);
        self.after_param_placement(method)
      }
      State::ElidingGotos(method) => State::ConvertingToRop(elide_gotos(method)),
      State::ConvertingToRop(method) => {
        let rop = convert_to_rop(&method)?;
        if self.config.merge_identical_blocks {
          State::MergingIdenticalBlocks(rop)
        } else {
          State::Done(rop)
        }
      }
      State::MergingIdenticalBlocks(rop) => State::Done(merge_identical_blocks(rop)),
      State::Done(rop) => State::Done(rop),
    };
    Ok(next)
  }

  fn after_param_placement(&self, method: SsaMethod) -> State {
    if self.config.elide_gotos {
      State::ElidingGotos(method)
    } else {
      State::ConvertingToRop(method)
    }
  }
}

/// Lowers `method` with the process-wide configuration.
///
/// `minimize_registers` picks the allocator that coalesces local copies;
/// otherwise plain first-fit is used.
pub fn lower(method: SsaMethod, minimize_registers: bool) -> Result<RopMethod> {
  lower_with_config(method, minimize_registers, &DEFAULT_CONFIG)
}

pub fn lower_with_config(
  method: SsaMethod,
  minimize_registers: bool,
  config: &LoweringConfig,
) -> Result<RopMethod> {
  let lowering = Lowering {
    config,
    allocator: config.allocator_for(minimize_registers),
  };
  let entry_label = method.block(method.entry()).label();
  log::debug!(
    "lowering method at block {}: {} blocks, {} regs, {} allocator",
    entry_label,
    method.blocks().len(),
    method.reg_count(),
    lowering.allocator.as_ref()
  );

  let mut state = State::AnalyzingLiveness(method);
  while state.stage() != Stage::Done {
    let stage = state.stage();
    state = lowering
      .step(state)
      .with_context(|| format!("lowering failed while {}", stage.as_ref()))?;
    let (blocks, regs) = state.size();
    log::debug!(
      "{} -> {}: {} blocks, {} regs",
      stage.as_ref(),
      state.stage().as_ref(),
      blocks,
      regs
    );
  }

  match state.into_done() {
    Ok(rop) => {
      log::debug!(
        "lowered method at block {}: {} blocks, {} regs",
        entry_label,
        rop.blocks().len(),
        rop.reg_count()
      );
      Ok(rop)
    }
    Err(state) => unreachable!("lowering stopped in {}", state.stage().as_ref()),
  }
}

/// Lowers independent methods in parallel. Results are in input order.
pub fn lower_methods(methods: Vec<SsaMethod>, minimize_registers: bool) -> Vec<Result<RopMethod>> {
  methods
    .into_par_iter()
    .map(|method| lower(method, minimize_registers))
    .collect()
}

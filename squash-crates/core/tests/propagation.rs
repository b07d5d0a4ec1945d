//! End-to-end behaviour of the propagation engine through the search-facing state.
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;
use squash_core::environment::ReversibleSet;
use squash_core::environment::SetCursor;
use squash_core::environment::SetKind;
use squash_core::environment::UndoStrategy;
use squash_core::options::QueueOrder;
use squash_core::options::SolverOptions;
use squash_core::propagation::DomainEvents;
use squash_core::propagation::Domains;
use squash_core::propagation::Entailment;
use squash_core::propagation::LocalId;
use squash_core::propagation::PropagationContext;
use squash_core::propagation::PropagationMask;
use squash_core::propagation::Priority;
use squash_core::propagation::Propagator;
use squash_core::propagation::PropagatorConstructor;
use squash_core::propagation::PropagatorConstructorContext;
use squash_core::propagation::ReadDomains;
use squash_core::propagators::LessOrEqualArgs;
use squash_core::propagators::NotEqualArgs;
use squash_core::state::Population;
use squash_core::state::State;
use squash_core::variables::DomainId;
use squash_core::Contradiction;
use squash_core::PropagationStatus;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Removes `value` from `target` whenever one of the watched variables changes.
struct RemoveValueArgs {
    watched: Vec<DomainId>,
    target: DomainId,
    value: i32,
}

impl PropagatorConstructor for RemoveValueArgs {
    type PropagatorImpl = RemoveValue;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        for (index, &var) in self.watched.iter().enumerate() {
            context.register(var, LocalId::from(index as u32));
        }

        RemoveValue {
            target: self.target,
            value: self.value,
            num_calls: 0,
        }
    }
}

struct RemoveValue {
    target: DomainId,
    value: i32,
    num_calls: usize,
}

impl Propagator for RemoveValue {
    fn name(&self) -> &str {
        "RemoveValue"
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        self.num_calls += 1;
        let _ = context.remove(self.target, self.value)?;
        Ok(())
    }

    fn is_entailed(&self, domains: Domains) -> Entailment {
        if domains.contains(self.target, self.value) {
            Entailment::Undefined
        } else {
            Entailment::True
        }
    }
}

/// Raises the lower bound of its only variable by one per call, and asks to be called again
/// `num_repeats` times.
struct IncrementArgs {
    var: DomainId,
    num_repeats: usize,
}

impl PropagatorConstructor for IncrementArgs {
    type PropagatorImpl = Increment;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        context.register(self.var, LocalId::from(0));
        Increment {
            var: self.var,
            num_repeats: self.num_repeats,
            masks: vec![],
        }
    }
}

struct Increment {
    var: DomainId,
    num_repeats: usize,
    masks: Vec<PropagationMask>,
}

impl Propagator for Increment {
    fn name(&self) -> &str {
        "Increment"
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        mask: PropagationMask,
    ) -> PropagationStatus {
        self.masks.push(mask);
        let lower_bound = context.lower_bound(self.var);
        let _ = context.set_lower_bound(self.var, lower_bound + 1)?;

        if self.masks.len() <= self.num_repeats {
            context.force_propagate(DomainEvents::LOWER_BOUND);
        }
        Ok(())
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::Undefined
    }
}

/// Fails on every call.
struct AlwaysFailArgs;

impl PropagatorConstructor for AlwaysFailArgs {
    type PropagatorImpl = AlwaysFail;

    fn create(self, _context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        AlwaysFail
    }
}

struct AlwaysFail;

impl Propagator for AlwaysFail {
    fn name(&self) -> &str {
        "AlwaysFail"
    }

    fn priority(&self) -> Priority {
        Priority::Unary
    }

    fn propagate(
        &mut self,
        context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        Err(context.fail(None, "this propagator always fails"))
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::False
    }
}

/// Does nothing, but reports its constraint as violated.
struct ViolatedArgs;

impl PropagatorConstructor for ViolatedArgs {
    type PropagatorImpl = Violated;

    fn create(self, _context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        Violated
    }
}

struct Violated;

impl Propagator for Violated {
    fn name(&self) -> &str {
        "Violated"
    }

    fn propagate(
        &mut self,
        _context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        Ok(())
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::False
    }
}

/// Watches nothing at first; its first call subscribes it to `var`, a call caused by `var` removes
/// it from the scope again.
struct GrowingScopeArgs {
    var: DomainId,
}

impl PropagatorConstructor for GrowingScopeArgs {
    type PropagatorImpl = GrowingScope;

    fn create(self, _context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        GrowingScope {
            var: self.var,
            local_id: None,
            num_calls: 0,
        }
    }
}

struct GrowingScope {
    var: DomainId,
    local_id: Option<LocalId>,
    num_calls: usize,
}

impl Propagator for GrowingScope {
    fn name(&self) -> &str {
        "GrowingScope"
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        self.num_calls += 1;
        match self.local_id.take() {
            None => self.local_id = Some(context.add_to_scope(self.var)),
            Some(local_id) => {
                assert_eq!(context.remove_from_scope(local_id), Some(self.var));
            }
        }
        Ok(())
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::Undefined
    }
}

/// Subscribes to `var` and fails on its first call; later calls succeed.
struct FailAfterGrowingArgs {
    var: DomainId,
}

impl PropagatorConstructor for FailAfterGrowingArgs {
    type PropagatorImpl = FailAfterGrowing;

    fn create(self, _context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        FailAfterGrowing {
            var: self.var,
            num_calls: 0,
        }
    }
}

struct FailAfterGrowing {
    var: DomainId,
    num_calls: usize,
}

impl Propagator for FailAfterGrowing {
    fn name(&self) -> &str {
        "FailAfterGrowing"
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        self.num_calls += 1;
        let _ = context.add_to_scope(self.var);
        if self.num_calls == 1 {
            return Err(context.fail(Some(self.var), "first call fails"));
        }
        Ok(())
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::Undefined
    }
}

/// Forward checking for `vars` being pairwise different: the value of a fixed variable is removed
/// from every variable which is not fixed yet. The indices of those variables are kept in a
/// reversible set.
struct AllDifferentArgs {
    vars: Vec<DomainId>,
    kind: SetKind,
}

impl PropagatorConstructor for AllDifferentArgs {
    type PropagatorImpl = AllDifferent;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        for (index, &var) in self.vars.iter().enumerate() {
            context.register(var, LocalId::from(index as u32));
        }
        let unfixed = context.new_full_reversible_set(self.kind, 0, self.vars.len());

        AllDifferent {
            vars: self.vars,
            unfixed,
        }
    }
}

struct AllDifferent {
    vars: Vec<DomainId>,
    unfixed: ReversibleSet,
}

impl Propagator for AllDifferent {
    fn name(&self) -> &str {
        "AllDifferent"
    }

    fn propagation_conditions(&self, _local_id: LocalId) -> DomainEvents {
        DomainEvents::ASSIGN
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        // Own removals do not wake the propagator up, so iterate until nothing gets fixed.
        loop {
            let mut changed = false;
            let mut outer = SetCursor::default();
            while let Some(index) = context.next_in_set(self.unfixed, &mut outer) {
                let Some(value) = context.fixed_value(self.vars[index as usize]) else {
                    continue;
                };
                assert!(context.remove_from_set(self.unfixed, index));
                context.notify_removed_from_set(self.unfixed, &mut outer);

                let mut inner = SetCursor::default();
                while let Some(other) = context.next_in_set(self.unfixed, &mut inner) {
                    changed |= context.remove(self.vars[other as usize], value)?;
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    fn is_entailed(&self, domains: Domains) -> Entailment {
        let fixed = self
            .vars
            .iter()
            .filter_map(|&var| domains.fixed_value(var))
            .collect::<Vec<_>>();
        let distinct = fixed
            .iter()
            .enumerate()
            .all(|(index, value)| !fixed[..index].contains(value));
        match (distinct, fixed.len() == self.vars.len()) {
            (false, _) => Entailment::False,
            (true, true) => Entailment::True,
            (true, false) => Entailment::Undefined,
        }
    }
}

/// Removes the odd values of `var` while walking its domain with a cursor.
struct RemoveOddArgs {
    var: DomainId,
}

impl PropagatorConstructor for RemoveOddArgs {
    type PropagatorImpl = RemoveOdd;

    fn create(self, mut context: PropagatorConstructorContext) -> Self::PropagatorImpl {
        context.register(self.var, LocalId::from(0));
        RemoveOdd { var: self.var }
    }
}

struct RemoveOdd {
    var: DomainId,
}

impl Propagator for RemoveOdd {
    fn name(&self) -> &str {
        "RemoveOdd"
    }

    fn propagate(
        &mut self,
        mut context: PropagationContext,
        _mask: PropagationMask,
    ) -> PropagationStatus {
        let mut cursor = SetCursor::default();
        while let Some(value) = context.next_in_domain(self.var, &mut cursor) {
            if value % 2 != 0 {
                let _ = context.remove(self.var, value)?;
                context.notify_removed_from_domain(self.var, &mut cursor);
            }
        }
        Ok(())
    }

    fn is_entailed(&self, _domains: Domains) -> Entailment {
        Entailment::Undefined
    }
}

const HOLEY_KINDS: [SetKind; 3] = [SetKind::Bitset, SetKind::SwapList, SetKind::LinkedList];

#[test]
fn two_propagators_on_a_shared_variable() {
    init_logging();
    let mut state = State::default();
    let x = state.new_interval_variable(0, 0);
    let y = state.new_interval_variable(1, 3);
    let z = state.new_interval_variable(4, 4);

    let p1 = state.add_propagator(RemoveValueArgs {
        watched: vec![x, y],
        target: y,
        value: 3,
    });
    let p2 = state.add_propagator(RemoveValueArgs {
        watched: vec![y, z],
        target: y,
        value: 1,
    });

    state.propagate().expect("y keeps the value 2");

    assert_eq!(state.values(y), vec![2]);
    let p1_calls = state.get_propagator(p1).expect("present").num_calls;
    let p2_calls = state.get_propagator(p2).expect("present").num_calls;
    assert!(p1_calls <= 2);
    assert!(p2_calls <= 2);
}

#[test]
fn temporary_propagators_are_retracted_and_permanent_ones_rerun() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    state.propagate().expect("nothing to propagate");

    for _ in 0..4 {
        state.push();
    }
    assert_eq!(state.get_world_index(), 4);

    let temporary = state.dynamic_addition(
        false,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 7,
        },
    );
    let permanent = state.dynamic_addition(
        true,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 8,
        },
    );
    assert_eq!(
        state.propagator_population(temporary.id()),
        Some(Population::Temporary)
    );
    state.propagate().expect("two removals");
    assert!(!state.contains(v, 7));
    assert!(!state.contains(v, 8));
    assert_eq!(state.get_propagator(permanent).expect("present").num_calls, 1);

    state.pop_until(2);

    assert!(!state.is_propagator_present(temporary.id()));
    assert!(state.get_propagator(temporary).is_none());
    assert!(state.is_propagator_present(permanent.id()));
    assert!(state.contains(v, 8));
    assert!(state.need_to_run());

    state.propagate().expect("the permanent propagator runs again");
    assert_eq!(state.get_propagator(permanent).expect("present").num_calls, 2);
    assert!(!state.contains(v, 8));
    assert!(state.contains(v, 7));

    state.propagate().expect("nothing changed");
    assert_eq!(state.get_propagator(permanent).expect("present").num_calls, 2);
}

#[test]
fn contradiction_keeps_work_pending_until_flushed() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    let failing = state.add_propagator(AlwaysFailArgs);
    let _ = state.add_propagator(RemoveValueArgs {
        watched: vec![v],
        target: v,
        value: 5,
    });

    let error = state.propagate().expect_err("the failing propagator runs first");

    assert!(matches!(error, Contradiction::Propagator(_)));
    assert_eq!(error.cause(), squash_core::Cause::Propagator(failing.id()));
    assert_eq!(error.message(), "this propagator always fails");
    assert!(state.need_to_run());
    assert_eq!(state.statistics().num_failures, 1);

    state.flush();
    assert!(!state.need_to_run());
    assert!(state.contains(v, 5));
}

#[test]
fn second_propagation_without_changes_is_a_no_op() {
    init_logging();
    let mut state = State::default();
    let x = state.new_interval_variable(0, 10);
    let y = state.new_interval_variable(0, 8);
    let z = state.new_interval_variable(2, 9);
    let _ = state.add_propagator(LessOrEqualArgs { x, y, offset: 0 });
    let _ = state.add_propagator(LessOrEqualArgs { x: y, y: z, offset: -1 });

    state.propagate().expect("consistent");
    let num_calls = state.engine_statistics().num_propagator_calls;
    assert!(!state.need_to_run());

    state.propagate().expect("consistent");

    assert_eq!(state.engine_statistics().num_propagator_calls, num_calls);
    assert_eq!(state.upper_bound(x), 8);
    assert_eq!(state.lower_bound(y), 0);
    assert_eq!(state.upper_bound(y), 8);
    assert_eq!(state.lower_bound(z), 2);
}

#[test]
fn propagators_are_not_woken_by_their_own_changes() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 100);
    let handle = state.add_propagator(IncrementArgs {
        var: v,
        num_repeats: 0,
    });

    state.propagate().expect("100 values to go");

    assert_eq!(state.lower_bound(v), 1);
    assert_eq!(state.get_propagator(handle).expect("present").masks.len(), 1);
}

#[test]
fn forced_propagation_passes_the_requested_events() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 100);
    let handle = state.add_propagator(IncrementArgs {
        var: v,
        num_repeats: 2,
    });

    state.propagate().expect("100 values to go");

    assert_eq!(state.lower_bound(v), 3);
    let masks = &state.get_propagator(handle).expect("present").masks;
    assert_eq!(masks.len(), 3);
    assert!(masks[0].is_full());
    assert_eq!(masks[1], PropagationMask::Incremental(DomainEvents::LOWER_BOUND.events()));
    assert_eq!(masks[2], PropagationMask::Incremental(DomainEvents::LOWER_BOUND.events()));
}

#[test]
fn scope_updates_change_which_events_wake_the_propagator() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    let handle = state.add_propagator(GrowingScopeArgs { var: v });

    state.propagate().expect("consistent");
    assert_eq!(state.get_propagator(handle).expect("present").num_calls, 1);

    // Now subscribed to `v`; this call unsubscribes it again.
    let _ = state.post_upper_bound(v, 9).expect("in domain");
    state.propagate().expect("consistent");
    assert_eq!(state.get_propagator(handle).expect("present").num_calls, 2);

    let _ = state.post_upper_bound(v, 8).expect("in domain");
    state.propagate().expect("consistent");
    assert_eq!(state.get_propagator(handle).expect("present").num_calls, 2);
}

#[test]
fn deleted_propagators_are_never_called_again() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    let handle = state.add_propagator(RemoveValueArgs {
        watched: vec![v],
        target: v,
        value: 3,
    });
    state.propagate().expect("consistent");
    assert_eq!(state.num_propagators(), 1);

    state.dynamic_deletion([handle.id()]);
    let _ = state.post_upper_bound(v, 9).expect("in domain");
    state.propagate().expect("consistent");

    assert!(state.get_propagator(handle).is_none());
    assert_eq!(state.num_propagators(), 0);
    assert_eq!(state.engine_statistics().num_dynamic_deletions, 1);
}

#[test]
fn violated_constraints_are_caught_at_the_fixpoint() {
    init_logging();
    let mut state = State::new(SolverOptions {
        check_entailment_at_fixpoint: true,
        ..SolverOptions::default()
    });
    let handle = state.add_propagator(ViolatedArgs);

    let error = state.propagate().expect_err("the constraint is violated");

    assert_eq!(error.cause(), squash_core::Cause::Propagator(handle.id()));
}

#[test]
fn external_decisions_report_empty_domains() {
    let mut state = State::default();
    let v = state.new_interval_variable(3, 6);

    let error = state.post_upper_bound(v, 2).expect_err("below the lower bound");

    assert_eq!(error.cause(), squash_core::Cause::External);
    assert_eq!(error.domain(), Some(v));
    assert_eq!(state.lower_bound(v), 3);
    assert_eq!(state.upper_bound(v), 6);
}

/// Posts the same random network of binary constraints into a fresh state.
fn random_network(options: SolverOptions, seed: u64) -> (State, Vec<DomainId>) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut state = State::new(options);
    let vars = (0..8)
        .map(|_| {
            let lower_bound = rng.gen_range(0..5);
            state.new_interval_variable(lower_bound, lower_bound + rng.gen_range(3..10))
        })
        .collect::<Vec<_>>();

    for _ in 0..12 {
        let x = vars[rng.gen_range(0..vars.len())];
        let y = vars[rng.gen_range(0..vars.len())];
        if x == y {
            continue;
        }
        let offset = rng.gen_range(-3..3);
        if rng.gen_bool(0.7) {
            let _ = state.add_propagator(LessOrEqualArgs { x, y, offset });
        } else {
            let _ = state.add_propagator(NotEqualArgs { x, y, offset });
        }
    }

    for _ in 0..3 {
        let var = vars[rng.gen_range(0..vars.len())];
        let value = rng.gen_range(0..10);
        let _ = state.post_remove(var, value);
    }

    (state, vars)
}

#[test]
fn fixpoint_does_not_depend_on_queue_order() {
    init_logging();
    for seed in 0..20 {
        let (mut fifo, vars) = random_network(SolverOptions::default(), seed);
        let fifo_result = fifo.propagate();

        for random_seed in 0..3 {
            let (mut random, _) = random_network(
                SolverOptions {
                    queue_order: QueueOrder::Random,
                    random_seed,
                    ..SolverOptions::default()
                },
                seed,
            );
            let random_result = random.propagate();

            assert_eq!(fifo_result.is_ok(), random_result.is_ok(), "seed {seed}");
            if fifo_result.is_ok() {
                for &var in &vars {
                    assert_eq!(fifo.values(var), random.values(var), "seed {seed}, {var}");
                }
            }
        }
    }
}

#[test]
fn statistics_can_be_logged() {
    init_logging();
    let mut state = State::default();
    let x = state.new_interval_variable(0, 3);
    let y = state.new_interval_variable(0, 3);
    let _ = state.add_propagator(NotEqualArgs { x, y, offset: 0 });
    state.propagate().expect("consistent");
    state.push();
    state.pop();

    state.log_statistics(true);

    assert_eq!(state.statistics().num_backtracks, 1);
    assert_eq!(state.engine_statistics().num_fixpoints, 1);
}

#[test]
fn failed_calls_do_not_change_the_scope() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    let handle = state.add_propagator(FailAfterGrowingArgs { var: v });

    let _ = state.propagate().expect_err("the first call fails");
    state.flush();

    let _ = state.post_upper_bound(v, 9).expect("in domain");
    state.propagate().expect("not subscribed to v");
    assert_eq!(state.get_propagator(handle).expect("present").num_calls, 1);
}

#[test]
fn temporary_propagators_do_not_grow_the_state() {
    init_logging();
    let mut state = State::default();
    let x = state.new_interval_variable(0, 10);
    let y = state.new_interval_variable(0, 10);
    let z = state.new_interval_variable(0, 10);
    state.propagate().expect("nothing to propagate");
    let num_integers = state.environment().num_integers();
    let num_sets = state.environment().num_sets();

    let mut first_ids = None;
    for _ in 0..1000 {
        state.push();
        let less_or_equal = state.dynamic_addition(false, LessOrEqualArgs { x, y, offset: 0 });
        let all_different = state.dynamic_addition(
            false,
            AllDifferentArgs {
                vars: vec![x, y, z],
                kind: SetKind::SwapList,
            },
        );
        state.propagate().expect("consistent");
        state.pop();

        assert_eq!(state.environment().num_integers(), num_integers);
        assert_eq!(state.environment().num_sets(), num_sets);
        assert!(state.get_propagator(less_or_equal).is_none());
        assert!(state.get_propagator(all_different).is_none());
        let ids = first_ids.get_or_insert([less_or_equal.id(), all_different.id()]);
        assert!(ids.contains(&less_or_equal.id()));
        assert!(ids.contains(&all_different.id()));
    }
    assert_eq!(state.num_propagators(), 0);
}

#[test]
fn reused_identifiers_do_not_revive_old_handles() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    state.propagate().expect("nothing to propagate");

    state.push();
    let old = state.dynamic_addition(
        false,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 3,
        },
    );
    state.propagate().expect("consistent");
    state.pop();

    state.push();
    let new = state.dynamic_addition(
        false,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 4,
        },
    );
    state.propagate().expect("consistent");

    assert_eq!(new.id(), old.id());
    assert!(state.get_propagator(old).is_none());
    assert!(state.get_propagator_mut(old).is_none());
    assert_eq!(state.get_propagator(new).expect("present").value, 4);
    assert!(state.contains(v, 3));
    assert!(!state.contains(v, 4));
}

#[test]
fn deleted_propagators_are_released_at_the_root() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    state.propagate().expect("nothing to propagate");
    let num_integers = state.environment().num_integers();

    state.push();
    let permanent = state.dynamic_addition(
        true,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 3,
        },
    );
    state.propagate().expect("consistent");
    state.push();
    let temporary = state.dynamic_addition(
        false,
        RemoveValueArgs {
            watched: vec![v],
            target: v,
            value: 4,
        },
    );
    state.propagate().expect("consistent");

    state.dynamic_deletion([permanent.id(), temporary.id()]);
    assert_eq!(state.num_propagators(), 0);
    assert_eq!(state.environment().num_integers(), num_integers + 2);

    state.pop();
    assert_eq!(state.environment().num_integers(), num_integers + 1);

    state.pop();
    assert_eq!(state.environment().num_integers(), num_integers);
    let reused = state.add_propagator(RemoveValueArgs {
        watched: vec![v],
        target: v,
        value: 5,
    });
    assert!([permanent.id(), temporary.id()].contains(&reused.id()));
    assert!(state.get_propagator(permanent).is_none());
    assert!(state.get_propagator(temporary).is_none());
}

#[test]
fn propagators_added_during_search_survive_backtracking() {
    init_logging();
    let mut state = State::default();
    let v = state.new_interval_variable(0, 10);
    state.propagate().expect("nothing to propagate");

    state.push();
    let handle = state.add_propagator(RemoveValueArgs {
        watched: vec![v],
        target: v,
        value: 7,
    });
    assert_eq!(
        state.propagator_population(handle.id()),
        Some(Population::Permanent)
    );
    state.propagate().expect("consistent");
    assert!(!state.contains(v, 7));

    state.pop();
    assert!(state.contains(v, 7));
    assert!(state.is_propagator_present(handle.id()));
    assert!(state.need_to_run());

    state.propagate().expect("consistent");
    assert!(!state.contains(v, 7));
    assert_eq!(state.get_propagator(handle).expect("present").num_calls, 2);
}

#[test]
fn interleaved_cursors_over_a_reversible_set() {
    init_logging();
    for kind in HOLEY_KINDS {
        for undo_strategy in [UndoStrategy::Trailing, UndoStrategy::Copying] {
            let mut state = State::new(SolverOptions {
                undo_strategy,
                ..SolverOptions::default()
            });
            let a = state.new_variable(kind, vec![1, 2]);
            let b = state.new_variable(kind, vec![1, 2]);
            let c = state.new_variable(kind, vec![1, 2, 3]);
            let d = state.new_variable(kind, vec![1, 2, 3, 4]);
            let handle = state.add_propagator(AllDifferentArgs {
                vars: vec![a, b, c, d],
                kind,
            });
            state.propagate().expect("nothing is fixed");
            let unfixed = state.get_propagator(handle).expect("present").unfixed;
            assert_eq!(state.environment().set_size(unfixed), 4);

            state.push();
            let _ = state.post_instantiate(a, 1).expect("in domain");
            state.propagate().expect("consistent");
            assert_eq!(
                [b, c, d].map(|var| state.fixed_value(var)),
                [Some(2), Some(3), Some(4)],
                "{kind:?} {undo_strategy:?}"
            );
            assert_eq!(state.environment().set_size(unfixed), 0);

            state.pop();
            assert_eq!(state.environment().set_size(unfixed), 4);
            assert_eq!(state.values(d), vec![1, 2, 3, 4]);

            state.push();
            let _ = state.post_instantiate(a, 2).expect("in domain");
            state.propagate().expect("consistent");
            assert_eq!(
                [b, c, d].map(|var| state.fixed_value(var)),
                [Some(1), Some(3), Some(4)],
                "{kind:?} {undo_strategy:?}"
            );
        }
    }
}

#[test]
fn domain_cursors_survive_removals() {
    init_logging();
    for kind in HOLEY_KINDS {
        let mut state = State::default();
        let v = state.new_variable(kind, (0..=10).collect());
        let _ = state.add_propagator(RemoveOddArgs { var: v });

        state.propagate().expect("consistent");

        assert_eq!(state.values(v), vec![0, 2, 4, 6, 8, 10], "{kind:?}");
    }
}

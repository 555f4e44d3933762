use chrono::NaiveDate;
use ledger_timeline_wasm::domain::timeline::viewport::{self, ViewportLimits};
use ledger_timeline_wasm::domain::timeline::zoom::{self, ZoomDirection};
use ledger_timeline_wasm::domain::timeline::{
    DatasetBounds, Granularity, NavDirection, ViewportState,
};
use quickcheck_macros::quickcheck;

const TIERS: [Granularity; 4] =
    [Granularity::Daily, Granularity::Weekly, Granularity::Monthly, Granularity::Quarterly];

fn limits(tier: u8, total: u16) -> ViewportLimits {
    let granularity = TIERS[usize::from(tier) % TIERS.len()];
    let total = usize::from(total % 1000) + 1;
    let origin = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
    let dataset = DatasetBounds {
        granularity,
        origin,
        earliest_index: 0,
        latest_index: total - 1,
        total_buckets: total,
    };
    ViewportLimits::new(dataset, granularity.bounds())
}

/// Arbitrary state squeezed into the limits.
fn state(limits: &ViewportLimits, start: u16, width: u8) -> ViewportState {
    limits.clamp(ViewportState::new(limits.dataset.granularity, usize::from(start), usize::from(width)))
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Prev,
    Next,
    PagePrev,
    PageNext,
    Jump(i64),
    Pan(f64),
    Reset,
    ZoomIn(f64),
    ZoomOut(f64),
}

fn op(code: u8, arg: i16) -> Op {
    match code % 9 {
        0 => Op::Prev,
        1 => Op::Next,
        2 => Op::PagePrev,
        3 => Op::PageNext,
        4 => Op::Jump(i64::from(arg)),
        5 => Op::Pan(f64::from(arg) / 7.0),
        6 => Op::Reset,
        7 => Op::ZoomIn(f64::from(arg.rem_euclid(101)) / 100.0),
        _ => Op::ZoomOut(f64::from(arg.rem_euclid(101)) / 100.0),
    }
}

fn apply(state: ViewportState, limits: &ViewportLimits, op: Op) -> ViewportState {
    match op {
        Op::Prev => viewport::navigate(state, limits, NavDirection::Prev),
        Op::Next => viewport::navigate(state, limits, NavDirection::Next),
        Op::PagePrev => viewport::page(state, limits, NavDirection::Prev),
        Op::PageNext => viewport::page(state, limits, NavDirection::Next),
        Op::Jump(index) => viewport::jump_to(state, limits, index),
        Op::Pan(delta) => viewport::pan_by(state, limits, delta),
        Op::Reset => viewport::reset(state, limits),
        Op::ZoomIn(ratio) => zoom::wheel_zoom(state, limits, ZoomDirection::In, ratio),
        Op::ZoomOut(ratio) => zoom::wheel_zoom(state, limits, ZoomDirection::Out, ratio),
    }
}

#[quickcheck]
fn every_transition_keeps_the_viewport_valid(tier: u8, total: u16, ops: Vec<(u8, i16)>) -> bool {
    let limits = limits(tier, total);
    let mut current = viewport::present(&limits);
    if !limits.is_valid(&current) {
        return false;
    }
    for (code, arg) in ops {
        current = apply(current, &limits, op(code, arg));
        if !limits.is_valid(&current) {
            return false;
        }
    }
    true
}

#[quickcheck]
fn prev_flag_matches_earliest_edge(tier: u8, total: u16, start: u16, width: u8) -> bool {
    let limits = limits(tier, total);
    let s = state(&limits, start, width);
    viewport::can_go_prev(&s, &limits) == (s.start_index > limits.dataset.earliest_index)
}

#[quickcheck]
fn next_flag_matches_latest_edge(tier: u8, total: u16, start: u16, width: u8) -> bool {
    let limits = limits(tier, total);
    let s = state(&limits, start, width);
    viewport::can_go_next(&s, &limits) == (s.start_index + s.width - 1 < limits.dataset.latest_index)
}

#[quickcheck]
fn reset_is_idempotent(tier: u8, total: u16, start: u16, width: u8) -> bool {
    let limits = limits(tier, total);
    let once = viewport::reset(state(&limits, start, width), &limits);
    viewport::reset(once, &limits) == once && !viewport::can_go_next(&once, &limits)
}

#[quickcheck]
fn switching_tiers_always_lands_on_present(to: u8, total: u16) -> bool {
    let after = limits(to, total);
    let switched = zoom::switch_granularity(&after);
    !viewport::can_go_next(&switched, &after)
        && switched.width == after.default_width()
        && switched.granularity == after.dataset.granularity
}

#[quickcheck]
fn wheel_zoom_stays_inside_width_bounds(tier: u8, total: u16, start: u16, width: u8, ratio: u8, zoom_in: bool) -> bool {
    let limits = limits(tier, total);
    let direction = if zoom_in { ZoomDirection::In } else { ZoomDirection::Out };
    let zoomed = zoom::wheel_zoom(state(&limits, start, width), &limits, direction, f64::from(ratio) / 255.0);
    zoomed.width >= limits.min_width() && zoomed.width <= limits.max_width() && limits.is_valid(&zoomed)
}

#[quickcheck]
fn boundary_moves_are_no_ops(tier: u8, total: u16) -> bool {
    let limits = limits(tier, total);
    let present = viewport::present(&limits);
    let earliest = viewport::jump_to_earliest(present, &limits);
    viewport::navigate(present, &limits, NavDirection::Next) == present
        && viewport::navigate(earliest, &limits, NavDirection::Prev) == earliest
}

//! Headless session driver used by the command-line adapter.

use std::{str::FromStr, time::Duration};

use log::{info, warn};
use rampart_core::{CellCoord, Event, TowerKind, UnknownKindError};
use rampart_simulation::Simulation;
use serde::Serialize;
use thiserror::Error;

/// Tower purchase requested on the command line as `KIND@COLUMN,ROW`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerOrder {
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
}

impl FromStr for TowerOrder {
    type Err = TowerOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, cell) = value
            .trim()
            .split_once('@')
            .ok_or(TowerOrderError::MissingSeparator)?;
        let (column, row) = cell
            .split_once(',')
            .ok_or(TowerOrderError::MissingSeparator)?;

        Ok(Self {
            kind: kind.parse()?,
            cell: CellCoord::new(parse_axis(column)?, parse_axis(row)?),
        })
    }
}

fn parse_axis(value: &str) -> Result<u32, TowerOrderError> {
    value
        .trim()
        .parse()
        .map_err(|_| TowerOrderError::InvalidCoordinate(value.trim().to_owned()))
}

/// Reasons a tower order cannot be parsed.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum TowerOrderError {
    /// The order is not shaped like `KIND@COLUMN,ROW`.
    #[error("expected KIND@COLUMN,ROW")]
    MissingSeparator,
    /// The tower kind is not recognised.
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),
    /// A coordinate is not a non-negative integer.
    #[error("invalid coordinate `{0}`")]
    InvalidCoordinate(String),
}

/// Scripted inputs for a headless session.
#[derive(Clone, Debug)]
pub(crate) struct SessionPlan {
    pub(crate) duration: Duration,
    pub(crate) step: Duration,
    pub(crate) towers: Vec<TowerOrder>,
    pub(crate) extra_waves: u32,
}

/// Summary printed once a session ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct SessionReport {
    pub(crate) elapsed_secs: f64,
    pub(crate) wave: u32,
    pub(crate) health: u32,
    pub(crate) money: u32,
    pub(crate) kills: u32,
    pub(crate) damage_dealt: f64,
    pub(crate) towers_built: usize,
    pub(crate) orders_rejected: usize,
    pub(crate) waves_completed: usize,
    pub(crate) enemies_escaped: usize,
    pub(crate) game_over: bool,
}

/// Places the ordered towers, starts the first wave and ticks until the
/// planned duration elapses or the base falls.
pub(crate) fn run(simulation: &mut Simulation, plan: &SessionPlan) -> SessionReport {
    let mut report = SessionReport::default();

    for order in &plan.towers {
        match simulation.place_tower(order.kind, order.cell) {
            Ok(tower) => {
                info!("ordered {} tower {tower:?} at {:?}", order.kind.name(), order.cell);
                report.towers_built += 1;
            }
            Err(reason) => {
                warn!(
                    "could not place {} tower at {:?}: {reason}",
                    order.kind.name(),
                    order.cell
                );
                report.orders_rejected += 1;
            }
        }
    }

    if let Err(reason) = simulation.start_wave() {
        warn!("first wave did not start: {reason}");
    }
    for _ in 0..plan.extra_waves {
        let _ = simulation.send_extra_wave();
    }

    let mut elapsed = Duration::ZERO;
    while elapsed < plan.duration && !simulation.is_game_over() && !plan.step.is_zero() {
        simulation.tick(plan.step);
        elapsed += plan.step;
        tally(&simulation.drain_events(), &mut report);
    }

    let stats = simulation.stats();
    report.elapsed_secs = elapsed.as_secs_f64();
    report.wave = simulation.current_wave().get();
    report.health = simulation.health();
    report.money = simulation.money();
    report.kills = stats.kills;
    report.damage_dealt = stats.damage_dealt;
    report.game_over = simulation.is_game_over();
    report
}

fn tally(events: &[Event], report: &mut SessionReport) {
    for event in events {
        match event {
            Event::WaveCompleted { .. } => report.waves_completed += 1,
            Event::EnemyReachedEnd { .. } => report.enemies_escaped += 1,
            _ => {}
        }
    }
}

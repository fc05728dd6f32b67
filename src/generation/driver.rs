//! # Generation Driver
//!
//! Runs the door-by-door expansion as an explicit state machine. Each call to
//! [`MapGenerator::step`] resolves at most one open door, so callers decide how
//! runs are paced: a tight loop for headless generation, a timer when the
//! progress is being watched.

use super::utils;
use crate::{
    can_place_tile, commit_placement, Cell, Direction, DoorRef, GeneratedMap, GenerationConfig,
    GenerationOutcome, Grid, GridIndex, PlacedTile, PlacementObserver, PlacementPlan, StepStatus,
    TileCatalog, TileDefinition, TileType, TilewrightError, TilewrightResult, MAX_RARITY,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which tile types a candidate query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePool {
    AllButEntrances,
    RoomsOnly,
    PathsOnly,
    EntrancesOnly,
}

impl CandidatePool {
    /// Tile types left out of the query.
    pub fn excluded(self) -> &'static [TileType] {
        match self {
            CandidatePool::AllButEntrances => &[TileType::EntranceExit],
            CandidatePool::RoomsOnly => &[TileType::EntranceExit, TileType::Path],
            CandidatePool::PathsOnly => &[TileType::EntranceExit, TileType::Room],
            CandidatePool::EntrancesOnly => &[TileType::Room, TileType::Path],
        }
    }
}

/// Ordered candidate queries for resolving one door, as `(pool, use_rarity)`.
///
/// Once `placed` reaches `max_rooms` the map is being closed: the last open
/// door gets the second entrance, otherwise rooms are preferred over paths.
/// While growing, one or two open doors are extended with paths and anything
/// busier draws from every non-entrance tile.
pub fn selection_policy(
    placed: usize,
    max_rooms: usize,
    open_doors: usize,
    entrances: usize,
) -> &'static [(CandidatePool, bool)] {
    use CandidatePool::*;

    if placed >= max_rooms {
        if open_doors == 1 && entrances < 2 {
            &[(EntrancesOnly, true), (EntrancesOnly, false)]
        } else {
            &[(RoomsOnly, true), (PathsOnly, true), (PathsOnly, false)]
        }
    } else if open_doors <= 2 {
        &[(PathsOnly, true), (PathsOnly, false), (AllButEntrances, false)]
    } else {
        &[(AllButEntrances, true), (AllButEntrances, false)]
    }
}

/// Everything owned by a single run. Discarded wholesale on restart.
#[derive(Debug)]
struct GenerationState {
    grid: Grid,
    placed_tiles: Vec<PlacedTile>,
    current_cell: Option<usize>,
    current_door: Option<DoorRef>,
    can_continue: bool,
    seed: u64,
    rng: StdRng,
    outcome: Option<GenerationOutcome>,
    /// Times a door leading to `watch_index` was resolved
    watch_hits: u32,
}

impl GenerationState {
    fn new(seed: u64) -> Self {
        Self {
            grid: Grid::new(),
            placed_tiles: Vec::new(),
            current_cell: None,
            current_door: None,
            can_continue: true,
            seed,
            rng: StdRng::seed_from_u64(seed),
            outcome: None,
            watch_hits: 0,
        }
    }

    /// Stays on the current cell while it has an open door, otherwise moves
    /// to the first cell in storage order that does.
    fn advance_cursor(&mut self) {
        let stays = self
            .current_cell
            .and_then(|id| self.grid.cell(id))
            .is_some_and(Cell::has_disconnected_door);
        if !stays {
            self.current_cell = self.grid.first_cell_with_disconnected_door();
        }

        let grid = &self.grid;
        self.current_door = self.current_cell.and_then(|id| {
            grid.cell(id)?
                .first_disconnected_door()
                .map(|door| DoorRef::new(id, door))
        });
    }
}

/// Where a step left the run before restart handling.
enum RunProgress {
    Running,
    Done(GenerationOutcome),
    Failed(String),
}

/// Grows maps from a tile catalog.
///
/// # Examples
///
/// ```
/// use tilewright::{sample_catalog, GenerationConfig, MapGenerator};
///
/// let mut generator = MapGenerator::new(sample_catalog()?, GenerationConfig::for_testing(7))?;
/// let map = generator.generate()?;
/// assert!(map.outcome.is_some());
/// assert!(map.validate(None).is_ok());
/// # Ok::<(), tilewright::TilewrightError>(())
/// ```
pub struct MapGenerator<C: TileCatalog> {
    catalog: C,
    config: GenerationConfig,
    state: Option<GenerationState>,
    tries: u32,
    base_seed: u64,
    observers: Vec<Box<dyn PlacementObserver>>,
}

impl<C: TileCatalog> MapGenerator<C> {
    /// Creates a generator. The configuration is normalized here, so an
    /// unusable one is reported before any run starts.
    pub fn new(catalog: C, config: GenerationConfig) -> TilewrightResult<Self> {
        let config = config.normalized()?;
        let base_seed = config.seed;

        Ok(Self {
            catalog,
            config,
            state: None,
            tries: 0,
            base_seed,
            observers: Vec::new(),
        })
    }

    pub fn add_observer<O: PlacementObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Restarts used by the current run.
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Seed of the current attempt.
    pub fn seed(&self) -> Option<u64> {
        self.state.as_ref().map(|state| state.seed)
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.state.as_ref().map(|state| &state.grid)
    }

    pub fn placed_tiles(&self) -> &[PlacedTile] {
        self.state
            .as_ref()
            .map(|state| state.placed_tiles.as_slice())
            .unwrap_or_default()
    }

    /// How often the current attempt tried to fill the configured watch index.
    pub fn watch_hits(&self) -> u32 {
        self.state.as_ref().map_or(0, |state| state.watch_hits)
    }

    pub fn outcome(&self) -> Option<GenerationOutcome> {
        self.state.as_ref().and_then(|state| state.outcome)
    }

    /// Whether a run has started and not yet finished.
    pub fn is_running(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.outcome.is_none())
    }

    /// Starts a new run, cancelling any run still in progress.
    pub fn start(&mut self) -> TilewrightResult<()> {
        if self.is_running() {
            self.cancel();
        }

        self.tries = 0;
        self.base_seed = if self.config.use_seed {
            self.config.seed
        } else {
            utils::clock_seed()
        };
        info!("Starting generation with seed {}", self.base_seed);

        self.bootstrap()
    }

    /// Stops the current run, keeping its partial map.
    pub fn cancel(&mut self) {
        if let Some(state) = self.state.as_mut() {
            if state.outcome.is_none() {
                state.outcome = Some(GenerationOutcome::Cancelled);
                info!("Generation cancelled with {} tiles placed", state.placed_tiles.len());
            }
        }
    }

    /// Advances the run by resolving at most one open door.
    pub fn step(&mut self) -> TilewrightResult<StepStatus> {
        let mut state = self.state.take().ok_or_else(|| {
            TilewrightError::InvalidState("generation has not been started".to_string())
        })?;
        let progress = self.advance(&mut state);
        self.state = Some(state);

        match progress? {
            RunProgress::Running => Ok(StepStatus::Continue),
            RunProgress::Done(outcome) => Ok(StepStatus::Finished(outcome)),
            RunProgress::Failed(reason) => self.restart_or_abort(&reason),
        }
    }

    /// Runs a whole generation without pausing and returns the final map.
    pub fn generate(&mut self) -> TilewrightResult<GeneratedMap> {
        self.start()?;
        while !self.step()?.is_finished() {}

        self.snapshot().ok_or_else(|| {
            TilewrightError::InvalidState("generation finished without a map".to_string())
        })
    }

    /// Copy of the current map, finished or not.
    pub fn snapshot(&self) -> Option<GeneratedMap> {
        self.state.as_ref().map(|state| GeneratedMap {
            cells: utils::snapshot_cells(&state.grid),
            tiles: state.placed_tiles.clone(),
            seed: state.seed,
            tries: self.tries,
            outcome: state.outcome,
        })
    }

    /// Discards the current map and places the first entrance.
    fn bootstrap(&mut self) -> TilewrightResult<()> {
        self.state = None;
        for observer in &mut self.observers {
            observer.on_map_cleared();
        }

        let mut state = GenerationState::new(utils::attempt_seed(self.base_seed, self.tries));
        let entrance = self
            .catalog
            .entrance_exit_tile(&mut state.rng)
            .ok_or(TilewrightError::NoEntranceTile)?;
        let anchor_door = entrance.random_door(&mut state.rng).ok_or_else(|| {
            TilewrightError::InvalidTile(format!("entrance '{}' has no doors", entrance.name))
        })?;

        let plan = PlacementPlan::unresolved(&entrance, anchor_door, self.config.start_index);
        if let Some(bounds) = self.config.bounds() {
            if let Some(outside) = plan
                .footprint()
                .into_iter()
                .chain(plan.exterior)
                .find(|index| !bounds.contains(*index))
            {
                return Err(TilewrightError::InvalidConfig(format!(
                    "start tile '{}' reaches {} outside the map bounds",
                    entrance.name, outside
                )));
            }
        }
        self.commit(&mut state, &entrance, &plan, None)?;

        if self.config.verbose {
            debug!(
                "Attempt {} seeded with {} starts from '{}'",
                self.tries, state.seed, entrance.name
            );
        }
        self.state = Some(state);
        Ok(())
    }

    fn advance(&mut self, state: &mut GenerationState) -> TilewrightResult<RunProgress> {
        if let Some(outcome) = state.outcome {
            return Ok(RunProgress::Done(outcome));
        }
        if !state.can_continue || state.grid.disconnected_door_count() == 0 {
            return Ok(self.finish_run(state));
        }

        if state.current_door.is_none() {
            state.advance_cursor();
        }
        let Some(resolving) = state.current_door else {
            return Ok(self.finish_run(state));
        };
        let (cell_index, direction) = match (state.grid.cell(resolving.cell), state.grid.door(resolving)) {
            (Some(cell), Some(door)) => (cell.index, door.direction),
            _ => {
                return Err(TilewrightError::InvalidState(format!(
                    "cursor points at missing door {:?}",
                    resolving
                )))
            }
        };

        let target = utils::target_index(cell_index, direction);
        if self.config.watch_index == Some(target) {
            state.watch_hits += 1;
            info!("Resolving watched index {} from cell {}", target, cell_index);
        }

        if let Some(bounds) = self.config.bounds() {
            if !bounds.contains(target) {
                return Ok(RunProgress::Failed(format!(
                    "door {} of cell {} leads outside the map bounds",
                    direction, cell_index
                )));
            }
        }

        if !self.resolve_door(state, resolving, direction, target)? {
            if self.config.verbose {
                debug!("Nothing fits at {}, run cannot continue", target);
            }
            state.can_continue = false;
        }

        if !state.can_continue || state.grid.disconnected_door_count() == 0 {
            return Ok(self.finish_run(state));
        }
        Ok(RunProgress::Running)
    }

    /// Tries each candidate query the selection policy allows, in order.
    fn resolve_door(
        &mut self,
        state: &mut GenerationState,
        resolving: DoorRef,
        direction: Direction,
        target: GridIndex,
    ) -> TilewrightResult<bool> {
        let policy = selection_policy(
            state.placed_tiles.len(),
            self.config.max_rooms as usize,
            state.grid.disconnected_door_count(),
            utils::entrance_count(&state.placed_tiles),
        );

        for (pool, use_rarity) in policy {
            if self.try_spawn_tile(state, resolving, direction, target, *pool, *use_rarity)? {
                return Ok(true);
            }
            if self.config.verbose {
                debug!(
                    "No {:?} candidate fits at {} (rarity {})",
                    pool, target, use_rarity
                );
            }
        }

        Ok(false)
    }

    /// Places the first candidate from `pool` that passes the rarity gate and
    /// validation.
    fn try_spawn_tile(
        &mut self,
        state: &mut GenerationState,
        resolving: DoorRef,
        direction: Direction,
        target: GridIndex,
        pool: CandidatePool,
        use_rarity: bool,
    ) -> TilewrightResult<bool> {
        let facing = self.catalog.opposite(direction);
        let candidates = self
            .catalog
            .tiles_with_door_facing(facing, pool.excluded(), &mut state.rng);
        let bounds = self.config.bounds();

        for tile in candidates {
            if use_rarity {
                let draw: f32 = state.rng.gen_range(0.0..MAX_RARITY);
                if tile.rarity < draw {
                    continue;
                }
            }

            let Some(anchor_door) = tile.random_door_facing(facing, &mut state.rng) else {
                continue;
            };

            match can_place_tile(
                &state.grid,
                bounds.as_ref(),
                Some(resolving),
                &tile,
                anchor_door,
                target,
            ) {
                Ok(plan) => {
                    self.commit(state, &tile, &plan, Some(resolving))?;
                    return Ok(true);
                }
                Err(rejection) => {
                    if self.config.verbose {
                        debug!("Rejected '{}' at {}: {}", tile.name, target, rejection);
                    }
                }
            }
        }

        Ok(false)
    }

    fn commit(
        &mut self,
        state: &mut GenerationState,
        tile: &TileDefinition,
        plan: &PlacementPlan,
        resolving: Option<DoorRef>,
    ) -> TilewrightResult<()> {
        let committed = commit_placement(&mut state.grid, tile, plan)?;
        if let Some(door) = resolving {
            state.grid.connect(door)?;
        }

        if state.current_cell.is_none() {
            state.current_cell = Some(committed.anchor_cell);
        }
        state.advance_cursor();

        if self.config.verbose {
            debug!(
                "Placed '{}' at {} ({} tiles, {} open doors)",
                tile.name,
                plan.anchor_index,
                state.placed_tiles.len() + 1,
                state.grid.disconnected_door_count()
            );
        }

        for observer in &mut self.observers {
            observer.on_tile_placed(&committed.placed);
        }
        state.placed_tiles.push(committed.placed);
        Ok(())
    }

    /// Accepts the run if it is closed, large enough and has both entrances.
    fn finish_run(&self, state: &mut GenerationState) -> RunProgress {
        let open = state.grid.disconnected_door_count();
        let placed = state.placed_tiles.len();
        let entrances = utils::entrance_count(&state.placed_tiles);

        if open == 0 && placed >= self.config.min_rooms as usize && entrances == 2 {
            info!(
                "Generation succeeded with {} tiles after {} restarts",
                placed, self.tries
            );
            state.outcome = Some(GenerationOutcome::Succeeded);
            RunProgress::Done(GenerationOutcome::Succeeded)
        } else {
            RunProgress::Failed(format!(
                "run ended with {} tiles, {} entrances and {} open doors",
                placed, entrances, open
            ))
        }
    }

    fn restart_or_abort(&mut self, reason: &str) -> TilewrightResult<StepStatus> {
        if self.tries < self.config.max_tries {
            self.tries += 1;
            warn!(
                "Restarting generation ({}/{}): {}",
                self.tries, self.config.max_tries, reason
            );
            self.bootstrap()?;
            Ok(StepStatus::Restarted { tries: self.tries })
        } else {
            warn!("Generation aborted after {} restarts: {}", self.tries, reason);
            if let Some(state) = self.state.as_mut() {
                state.outcome = Some(GenerationOutcome::Aborted);
            }
            Ok(StepStatus::Finished(GenerationOutcome::Aborted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sample_catalog, TileDatabase};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl PlacementObserver for Recorder {
        fn on_tile_placed(&mut self, tile: &PlacedTile) {
            self.events.borrow_mut().push(format!("placed {}", tile.name));
        }

        fn on_map_cleared(&mut self) {
            self.events.borrow_mut().push("cleared".to_string());
        }
    }

    fn gate(name: &str, direction: Direction) -> TileDefinition {
        let outside = direction.opposite().delta();
        TileDefinition::builder(name, TileType::EntranceExit, 1, 1)
            .door(direction, 0, 0)
            .exterior(outside.x, outside.y)
            .build()
    }

    /// Two entrances and a vertical corridor: every run is a straight line.
    fn chain_catalog() -> TileDatabase {
        TileDatabase::from_tiles(vec![
            gate("gate_north", Direction::Down),
            gate("gate_south", Direction::Up),
            TileDefinition::builder("corridor", TileType::Path, 1, 1)
                .door(Direction::Up, 0, 0)
                .door(Direction::Down, 0, 0)
                .build(),
        ])
        .unwrap()
    }

    fn chain_config(seed: u64) -> GenerationConfig {
        GenerationConfig {
            min_rooms: 3,
            max_rooms: 5,
            ..GenerationConfig::for_testing(seed)
        }
    }

    #[test]
    fn test_step_before_start_is_an_error() {
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(1)).unwrap();
        assert!(matches!(generator.step(), Err(TilewrightError::InvalidState(_))));
    }

    #[test]
    fn test_new_rejects_zero_max_rooms() {
        let config = GenerationConfig {
            max_rooms: 0,
            ..chain_config(1)
        };
        assert!(matches!(
            MapGenerator::new(chain_catalog(), config),
            Err(TilewrightError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_start_places_single_entrance() {
        let recorder = Recorder::default();
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(1)).unwrap();
        generator.add_observer(recorder.clone());
        generator.start().unwrap();

        let tiles = generator.placed_tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].tile_type, TileType::EntranceExit);
        assert_eq!(tiles[0].anchor_index, GridIndex::ZERO);
        // The entrance cell plus its reserved exterior.
        assert_eq!(generator.grid().unwrap().len(), 2);
        assert_eq!(generator.grid().unwrap().disconnected_door_count(), 1);
        assert!(generator.is_running());

        let events = recorder.events.borrow();
        assert_eq!(events[0], "cleared");
        assert!(events[1].starts_with("placed gate_"));
    }

    #[test]
    fn test_missing_entrance_is_reported() {
        let catalog = TileDatabase::from_tiles(vec![TileDefinition::builder(
            "corridor",
            TileType::Path,
            1,
            1,
        )
        .door(Direction::Up, 0, 0)
        .build()])
        .unwrap();
        let mut generator = MapGenerator::new(catalog, chain_config(1)).unwrap();
        assert!(matches!(generator.start(), Err(TilewrightError::NoEntranceTile)));
        assert!(generator.snapshot().is_none());
    }

    #[test]
    fn test_chain_run_closes_with_second_entrance() {
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(9)).unwrap();
        let map = generator.generate().unwrap();

        assert_eq!(map.outcome, Some(GenerationOutcome::Succeeded));
        assert_eq!(map.tries, 0);
        // Entrance, four corridors up to the closing threshold, then the exit.
        assert_eq!(map.tiles.len(), 6);
        assert_eq!(map.entrance_count(), 2);
        assert_eq!(map.disconnected_door_count(), 0);
        assert!(map.validate(None).is_ok());
    }

    #[test]
    fn test_stepping_reports_each_placement() {
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(3)).unwrap();
        generator.start().unwrap();

        let mut statuses = Vec::new();
        loop {
            let status = generator.step().unwrap();
            statuses.push(status);
            if status.is_finished() {
                break;
            }
        }

        assert_eq!(statuses.len(), 5);
        assert!(statuses[..4].iter().all(|status| *status == StepStatus::Continue));
        assert_eq!(
            statuses[4],
            StepStatus::Finished(GenerationOutcome::Succeeded)
        );
        // A finished run keeps reporting its outcome.
        assert_eq!(
            generator.step().unwrap(),
            StepStatus::Finished(GenerationOutcome::Succeeded)
        );
    }

    #[test]
    fn test_selection_failure_restarts_then_aborts() {
        let catalog = TileDatabase::from_tiles(vec![
            gate("gate_north", Direction::Down),
            TileDefinition::builder("drop", TileType::Path, 1, 1)
                .door(Direction::Down, 0, 0)
                .build(),
        ])
        .unwrap();
        let config = GenerationConfig {
            max_tries: 2,
            ..chain_config(5)
        };
        let mut generator = MapGenerator::new(catalog, config).unwrap();
        generator.start().unwrap();

        assert_eq!(generator.step().unwrap(), StepStatus::Restarted { tries: 1 });
        assert_eq!(generator.step().unwrap(), StepStatus::Restarted { tries: 2 });
        assert_eq!(
            generator.step().unwrap(),
            StepStatus::Finished(GenerationOutcome::Aborted)
        );

        let map = generator.snapshot().unwrap();
        assert_eq!(map.tries, 2);
        assert_eq!(map.tiles.len(), 1);
        assert!(map.validate(None).is_ok());
    }

    #[test]
    fn test_leaving_bounds_restarts_run() {
        let config = GenerationConfig {
            max_rooms: 50,
            use_map_bounds: true,
            map_half_extents: GridIndex::new(1, 1),
            max_tries: 3,
            ..chain_config(2)
        };
        let mut generator = MapGenerator::new(chain_catalog(), config).unwrap();
        generator.start().unwrap();

        assert_eq!(generator.step().unwrap(), StepStatus::Continue);
        assert_eq!(generator.step().unwrap(), StepStatus::Restarted { tries: 1 });

        while !generator.step().unwrap().is_finished() {}
        let map = generator.snapshot().unwrap();
        assert_eq!(map.outcome, Some(GenerationOutcome::Aborted));
        assert_eq!(map.tries, 3);
        assert!(map.validate(generator.config().bounds()).is_ok());
    }

    #[test]
    fn test_restart_clears_observers_and_reseeds() {
        let recorder = Recorder::default();
        let catalog = TileDatabase::from_tiles(vec![gate("gate_north", Direction::Down)]).unwrap();
        let config = GenerationConfig {
            max_tries: 1,
            ..chain_config(40)
        };
        let mut generator = MapGenerator::new(catalog, config).unwrap();
        generator.add_observer(recorder.clone());

        generator.start().unwrap();
        assert_eq!(generator.seed(), Some(40));
        generator.step().unwrap();
        assert_eq!(generator.seed(), Some(41));

        let cleared = recorder
            .events
            .borrow()
            .iter()
            .filter(|event| *event == "cleared")
            .count();
        assert_eq!(cleared, 2);
    }

    #[test]
    fn test_cancel_keeps_partial_map() {
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(4)).unwrap();
        generator.start().unwrap();
        generator.step().unwrap();
        generator.cancel();

        assert!(!generator.is_running());
        assert_eq!(
            generator.step().unwrap(),
            StepStatus::Finished(GenerationOutcome::Cancelled)
        );
        assert_eq!(generator.placed_tiles().len(), 2);
    }

    #[test]
    fn test_rarity_gate_rejects_until_bypassed() {
        let catalog = TileDatabase::from_tiles(vec![
            gate("gate_north", Direction::Down),
            TileDefinition::builder("rare_corridor", TileType::Path, 1, 1)
                .door(Direction::Up, 0, 0)
                .door(Direction::Down, 0, 0)
                .rarity(0.0)
                .build(),
        ])
        .unwrap();
        let mut generator = MapGenerator::new(catalog, chain_config(8)).unwrap();
        generator.start().unwrap();

        let mut state = generator.state.take().unwrap();
        let resolving = state.current_door.unwrap();
        let target = GridIndex::new(0, -1);

        for _ in 0..20 {
            let placed = generator
                .try_spawn_tile(&mut state, resolving, Direction::Down, target, CandidatePool::PathsOnly, true)
                .unwrap();
            assert!(!placed);
        }
        assert_eq!(state.placed_tiles.len(), 1);
        assert_eq!(state.grid.disconnected_door_count(), 1);

        let placed = generator
            .try_spawn_tile(&mut state, resolving, Direction::Down, target, CandidatePool::PathsOnly, false)
            .unwrap();
        assert!(placed);
        assert_eq!(state.placed_tiles[1].name, "rare_corridor");
        assert_eq!(state.placed_tiles[1].anchor_index, target);
    }

    #[test]
    fn test_zero_rarity_tiles_still_complete_a_run() {
        let catalog = TileDatabase::from_tiles(vec![
            gate("gate_north", Direction::Down),
            gate("gate_south", Direction::Up),
            TileDefinition::builder("rare_corridor", TileType::Path, 1, 1)
                .door(Direction::Up, 0, 0)
                .door(Direction::Down, 0, 0)
                .rarity(0.0)
                .build(),
        ])
        .unwrap();
        let map = MapGenerator::new(catalog, chain_config(8))
            .unwrap()
            .generate()
            .unwrap();

        assert!(map.is_success());
        assert_eq!(map.tries, 0);
        assert_eq!(
            map.tiles.iter().filter(|tile| tile.name == "rare_corridor").count(),
            4
        );
    }

    #[test]
    fn test_watch_index_counts_attempts() {
        let catalog = TileDatabase::from_tiles(vec![
            gate("gate_north", Direction::Down),
            TileDefinition::builder("corridor", TileType::Path, 1, 1)
                .door(Direction::Up, 0, 0)
                .door(Direction::Down, 0, 0)
                .build(),
        ])
        .unwrap();
        let config = GenerationConfig {
            watch_index: Some(GridIndex::new(0, -2)),
            ..chain_config(6)
        };
        let mut generator = MapGenerator::new(catalog, config).unwrap();
        generator.start().unwrap();

        assert_eq!(generator.step().unwrap(), StepStatus::Continue);
        assert_eq!(generator.watch_hits(), 0);
        assert_eq!(generator.step().unwrap(), StepStatus::Continue);
        assert_eq!(generator.watch_hits(), 1);
    }

    #[test]
    fn test_start_during_run_discards_old_map() {
        let recorder = Recorder::default();
        let mut generator = MapGenerator::new(chain_catalog(), chain_config(12)).unwrap();
        generator.add_observer(recorder.clone());
        generator.start().unwrap();
        generator.step().unwrap();
        generator.step().unwrap();
        assert_eq!(generator.placed_tiles().len(), 3);
        assert!(generator.is_running());

        generator.start().unwrap();

        assert!(generator.is_running());
        assert_eq!(generator.tries(), 0);
        assert_eq!(generator.placed_tiles().len(), 1);
        assert_eq!(generator.grid().unwrap().len(), 2);

        let events = recorder.events.borrow();
        assert_eq!(events.iter().filter(|event| *event == "cleared").count(), 2);
        assert_eq!(events[events.len() - 2], "cleared");
    }

    #[test]
    fn test_start_tile_outside_bounds_is_a_config_error() {
        let catalog = TileDatabase::from_tiles(vec![gate("gate_north", Direction::Down)]).unwrap();
        let config = GenerationConfig {
            start_index: GridIndex::new(0, 2),
            use_map_bounds: true,
            map_half_extents: GridIndex::new(2, 2),
            ..chain_config(1)
        };
        let mut generator = MapGenerator::new(catalog, config).unwrap();
        // The gate fits on the top row but its exterior would sit above it.
        assert!(matches!(
            generator.start(),
            Err(TilewrightError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_start_resets_tries() {
        let catalog = TileDatabase::from_tiles(vec![gate("gate_north", Direction::Down)]).unwrap();
        let config = GenerationConfig {
            max_tries: 4,
            ..chain_config(1)
        };
        let mut generator = MapGenerator::new(catalog, config).unwrap();
        generator.generate().unwrap();
        assert_eq!(generator.tries(), 4);

        generator.start().unwrap();
        assert_eq!(generator.tries(), 0);
    }

    #[test]
    fn test_fixed_seed_reproduces_map() {
        let config = GenerationConfig::for_testing(1234);
        let first = MapGenerator::new(sample_catalog().unwrap(), config.clone())
            .unwrap()
            .generate()
            .unwrap();
        let second = MapGenerator::new(sample_catalog().unwrap(), config)
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_selection_policy_phases() {
        use CandidatePool::*;

        assert_eq!(
            selection_policy(2, 6, 1, 1)[0],
            (PathsOnly, true)
        );
        assert_eq!(
            selection_policy(2, 6, 4, 1),
            &[(AllButEntrances, true), (AllButEntrances, false)]
        );
        assert_eq!(
            selection_policy(6, 6, 1, 1),
            &[(EntrancesOnly, true), (EntrancesOnly, false)]
        );
        assert_eq!(
            selection_policy(7, 6, 1, 2),
            &[(RoomsOnly, true), (PathsOnly, true), (PathsOnly, false)]
        );
        assert_eq!(selection_policy(6, 6, 3, 1)[0], (RoomsOnly, true));
    }

    #[test]
    fn test_candidate_pools_never_mix_entrances_with_growth() {
        assert!(CandidatePool::AllButEntrances
            .excluded()
            .contains(&TileType::EntranceExit));
        assert!(!CandidatePool::EntrancesOnly
            .excluded()
            .contains(&TileType::EntranceExit));
    }
}

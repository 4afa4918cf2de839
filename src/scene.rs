use crate::engine::assets::AssetStore;
use crate::engine::{ImageHandle, ImageSource, InputEvent, Rect, Renderer};
use crate::hero::Hero;
use crate::manager::{GameManager, SpawnConfig, Spawner};
use crate::obstacle::Obstacle;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

const COLLISION_BOUNDS_COLOR: &str = "rgba(255, 0, 0, 0.5)";

/// World constants shared by the scene and every entity
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub gravity: f32,
    pub show_collision_bounds: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            width: 1012.0,
            height: 396.0,
            ground_y: 360.0,
            gravity: 5.0,
            show_collision_bounds: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntityId(u64);

/// Where an inserted obstacle is put when it joins
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Placement {
    /// keep the bounds it was prepared with
    AsIs,
    /// right edge of the viewport, see `Obstacle::place_at_frontier`
    Frontier,
    /// becomes the scene's hero, centered horizontally
    Hero,
}

/// `generation` is the manager's run the command was issued in, commands
/// from an earlier run are dropped when flushed
pub enum SceneCommand {
    Insert {
        obstacle: Box<dyn Obstacle>,
        placement: Placement,
        generation: u64,
    },
    Remove(EntityId),
    PrepareFailed {
        name: &'static str,
        placement: Placement,
        generation: u64,
        reason: String,
    },
}

impl fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneCommand::Insert {
                obstacle,
                placement,
                ..
            } => write!(f, "Insert({}, {:?})", obstacle.name(), placement),
            SceneCommand::Remove(id) => write!(f, "Remove({:?})", id),
            SceneCommand::PrepareFailed { name, reason, .. } => {
                write!(f, "PrepareFailed({} : {})", name, reason)
            }
        }
    }
}

/// Changes to the live obstacle list, applied at the end of `Scene::update`
#[derive(Clone, Default)]
pub struct CommandQueue(Rc<RefCell<Vec<SceneCommand>>>);

impl CommandQueue {
    pub fn push(&self, command: SceneCommand) {
        self.0.borrow_mut().push(command);
    }

    pub fn take(&self) -> Vec<SceneCommand> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

struct Slot {
    id: EntityId,
    obstacle: Box<dyn Obstacle>,
}

/// Owns the live obstacles and runs the simulation
///
/// ┌──────────────────────────── Scene::update ──────────────────────────────┐
/// │ 1. scroll    : world advances by the hero's run speed                   │
/// │ 2. move      : every obstacle offset (-speed, +gravity), then update()  │
/// │ 3. collide   : hero vs every other collidable obstacle, in list order   │
/// │ 4. evict     : dead or scrolled past the left edge                      │
/// │ 5. ground    : nothing ends below the ground line                       │
/// │ 6. spawn     : manager may start preparing a new obstacle               │
/// │ 7. flush     : queued commands join the priority ordered list           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// Without a hero only step 7 runs, so a prepared hero can join. Step 6 is
/// skipped on the tick the hero leaves.
pub struct Scene {
    config: SceneConfig,
    scroll: f32,
    background: Option<ImageHandle>,
    obstacles: Vec<Slot>,
    hero: Option<EntityId>,
    commands: CommandQueue,
    manager: GameManager,
    next_id: u64,
    load_error: Option<String>,
}

impl Scene {
    pub fn new(
        config: SceneConfig,
        spawn: SpawnConfig,
        assets: AssetStore,
        spawner: Spawner,
    ) -> Self {
        let commands = CommandQueue::default();
        let manager = GameManager::new(spawn, assets, spawner, commands.clone());
        Scene {
            config,
            scroll: 0.0,
            background: None,
            obstacles: Vec::new(),
            hero: None,
            commands,
            manager,
            next_id: 0,
            load_error: None,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn manager_mut(&mut self) -> &mut GameManager {
        &mut self.manager
    }

    /// Handle for queueing changes from outside a traversal
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    pub fn set_background(&mut self, image: ImageHandle) {
        self.background = Some(image);
    }

    /// Error of the last failed hero preparation
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Prepare a hero for this scene
    pub fn start(&mut self) {
        self.load_error = None;
        self.manager.start();
    }

    /// Drop every obstacle, queued command and the scroll distance
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.commands.take();
        self.hero = None;
        self.scroll = 0.0;
    }

    pub fn restart(&mut self) {
        self.clear();
        self.manager.reset();
        self.start();
    }

    /// Change the viewport and shift the world so the hero is centered
    pub fn resize(&mut self, width: f32, height: f32) {
        self.config.width = width;
        self.config.height = height;
        let Some(hero) = self.hero() else {
            return;
        };
        let bounds = hero.body().bounds;
        let dx = (width / 2.0).floor() - (bounds.width() / 2.0).floor() - bounds.left;
        for slot in self.obstacles.iter_mut() {
            slot.obstacle.body_mut().bounds.offset(dx, 0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Live obstacles in priority order
    pub fn obstacles(&self) -> impl Iterator<Item = &dyn Obstacle> + '_ {
        self.obstacles.iter().map(|slot| slot.obstacle.as_ref())
    }

    pub fn obstacles_in(&self, rect: impl Into<Rect>) -> Vec<&dyn Obstacle> {
        let rect = rect.into();
        self.obstacles()
            .filter(|obstacle| obstacle.body().bounds.intersects(rect))
            .collect()
    }

    pub fn hero_id(&self) -> Option<EntityId> {
        self.hero
    }

    pub fn hero(&self) -> Option<&Hero> {
        let index = self.hero_index()?;
        self.obstacles[index].obstacle.as_hero()
    }

    pub fn hero_mut(&mut self) -> Option<&mut Hero> {
        let index = self.hero_index()?;
        self.obstacles[index].obstacle.as_hero_mut()
    }

    /// Score of the running game, None without a hero
    pub fn score(&self) -> Option<u64> {
        self.hero().map(|hero| self.manager.score(self.scroll, hero))
    }

    /// Insert right away, keeping the list sorted by priority. Equal
    /// priorities keep their insertion order.
    pub fn add_obstacle(&mut self, mut obstacle: Box<dyn Obstacle>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        obstacle.on_add_to_scene(&self.config);
        let priority = obstacle.body().priority();
        let index = self
            .obstacles
            .partition_point(|slot| slot.obstacle.body().priority() <= priority);
        log::debug!("{} joins the scene as {:?}", obstacle.name(), id);
        self.obstacles.insert(index, Slot { id, obstacle });
        id
    }

    /// Insert `hero` as the scene's hero and center the view on it
    pub fn set_hero(&mut self, hero: Box<dyn Obstacle>) -> Option<EntityId> {
        if hero.as_hero().is_none() {
            log::warn!("{} cannot be the hero", hero.name());
            return None;
        }
        if self.hero.is_some() {
            log::warn!("a hero is already running, dropping the new one");
            return None;
        }
        let id = self.add_obstacle(hero);
        self.hero = Some(id);
        self.load_error = None;
        let (width, height) = (self.config.width, self.config.height);
        self.resize(width, height);
        Some(id)
    }

    /// Queue `obstacle` to join at the next frame boundary
    pub fn queue_obstacle(&self, obstacle: Box<dyn Obstacle>) {
        self.commands.push(SceneCommand::Insert {
            obstacle,
            placement: Placement::AsIs,
            generation: self.manager.generation(),
        });
    }

    /// Queue the obstacle `id` for removal
    pub fn remove_obstacle(&self, id: EntityId) {
        self.commands.push(SceneCommand::Remove(id));
    }

    /// Route input to the hero, returns true when it was consumed
    pub fn dispatch_event(&mut self, event: InputEvent) -> bool {
        let Some(index) = self.hero_index() else {
            return false;
        };
        self.obstacles[index]
            .obstacle
            .handle_input(event, &self.config)
    }

    pub fn update(&mut self) {
        let Some(hero_index) = self.hero_index() else {
            self.flush_commands();
            return;
        };
        let speed = self.obstacles[hero_index]
            .obstacle
            .as_hero()
            .map_or(0.0, Hero::x_speed);
        self.scroll += speed;

        let config = &self.config;
        for slot in self.obstacles.iter_mut() {
            let obstacle = slot.obstacle.as_mut();
            obstacle.body_mut().bounds.offset(-speed, config.gravity);
            obstacle.update(config);
        }

        self.resolve_collisions(hero_index);
        self.evict();
        self.clamp_to_ground();
        // the run ended during eviction
        if self.hero.is_some() {
            self.manager.spawn_if_due();
        }
        self.flush_commands();
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        if let Some(background) = &self.background {
            draw_cover_image(
                renderer,
                background.as_ref(),
                self.scroll,
                0.0,
                self.config.width,
            );
        }
        let viewport = Rect::new(0.0, 0.0, self.config.width, self.config.height);
        for obstacle in self.obstacles() {
            let body = obstacle.body();
            if !body.bounds.intersects(viewport) {
                continue;
            }
            obstacle.draw(renderer);
            if self.config.show_collision_bounds {
                renderer.fill_rect(&body.collision_bounds(), COLLISION_BOUNDS_COLOR);
            }
        }
    }

    fn hero_index(&self) -> Option<usize> {
        let id = self.hero?;
        self.obstacles.iter().position(|slot| slot.id == id)
    }

    fn resolve_collisions(&mut self, hero_index: usize) {
        for index in 0..self.obstacles.len() {
            if index == hero_index {
                continue;
            }
            let (hero_slot, other_slot) = pair_mut(&mut self.obstacles, hero_index, index);
            let Some(hero) = hero_slot.obstacle.as_hero_mut() else {
                return;
            };
            // a previous collision this tick may have killed the hero
            if !hero.body().can_collide() {
                return;
            }
            let other = other_slot.obstacle.as_mut();
            if !other.body().can_collide() {
                continue;
            }
            if hero
                .body()
                .collision_bounds()
                .intersects(other.body().collision_bounds())
            {
                self.manager.on_collision(hero, other);
            }
        }
    }

    fn evict(&mut self) {
        let mut index = 0;
        while index < self.obstacles.len() {
            let body = self.obstacles[index].obstacle.body();
            if body.is_active() && body.bounds.right >= 0.0 {
                index += 1;
                continue;
            }
            let mut slot = self.obstacles.remove(index);
            slot.obstacle.on_remove_from_scene();
            log::debug!("{} {:?} leaves the scene", slot.obstacle.name(), slot.id);
            if self.hero == Some(slot.id) {
                self.hero = None;
                self.manager.exit();
            }
        }
    }

    fn clamp_to_ground(&mut self) {
        let ground = self.config.ground_y;
        for slot in self.obstacles.iter_mut() {
            let bounds = &mut slot.obstacle.body_mut().bounds;
            if bounds.bottom > ground {
                let overshoot = bounds.bottom - ground;
                bounds.offset(0.0, -overshoot);
            }
        }
    }

    fn flush_commands(&mut self) {
        let current = self.manager.generation();
        for command in self.commands.take() {
            match command {
                SceneCommand::Insert {
                    obstacle,
                    generation,
                    ..
                } if generation != current => {
                    log::debug!("dropping {} prepared for an earlier run", obstacle.name());
                }
                SceneCommand::PrepareFailed {
                    name, generation, ..
                } if generation != current => {
                    log::debug!("ignoring {} failure from an earlier run", name);
                }
                SceneCommand::Insert {
                    mut obstacle,
                    placement,
                    ..
                } => match placement {
                    Placement::AsIs => {
                        self.add_obstacle(obstacle);
                    }
                    Placement::Frontier => {
                        obstacle.place_at_frontier(&self.config);
                        self.add_obstacle(obstacle);
                    }
                    Placement::Hero => {
                        self.set_hero(obstacle);
                    }
                },
                SceneCommand::Remove(id) => {
                    match self.obstacles.iter_mut().find(|slot| slot.id == id) {
                        Some(slot) => slot.obstacle.body_mut().kill(),
                        None => log::debug!("{:?} already left the scene", id),
                    }
                }
                SceneCommand::PrepareFailed {
                    name,
                    placement,
                    reason,
                    ..
                } => {
                    if placement == Placement::Hero {
                        log::error!("hero could not be prepared : {}", reason);
                        self.load_error = Some(reason);
                    } else {
                        log::debug!("skipping {} spawn", name);
                    }
                }
            }
        }
    }
}

/// Mutable references to two different slots
fn pair_mut(slots: &mut [Slot], first: usize, second: usize) -> (&mut Slot, &mut Slot) {
    debug_assert_ne!(first, second);
    if first < second {
        let (head, tail) = slots.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = slots.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

/// Tile `image` horizontally across `[scroll, scroll + width)` of the world
///
/// ┌──────────── image width 300, scroll 1000, viewport 1012 ────────────────┐
/// │ slice 1 : source x 100, width 200  → screen 0                           │
/// │ slice 2 : source x 0,   width 300  → screen 200                         │
/// │ ...       until the viewport is covered, the last slice clipped         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub fn draw_cover_image(
    renderer: &dyn Renderer,
    image: &dyn ImageSource,
    scroll: f32,
    y: f32,
    width: f32,
) {
    let image_width = image.width();
    let image_height = image.height();
    if image_width <= 0.0 {
        return;
    }
    let end = scroll + width;
    let mut position = scroll;
    while position < end {
        let mut source_x = position.rem_euclid(image_width);
        // rem_euclid may round up to the modulus itself
        if source_x >= image_width {
            source_x = 0.0;
        }
        let slice = (image_width - source_x).min(end - position);
        renderer.draw_image(
            image,
            &Rect::from_size(source_x, 0.0, slice, image_height),
            &Rect::from_size(position - scroll, y, slice, image_height),
        );
        position += slice;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingRenderer};
    use super::*;
    use crate::engine::assets::testing::{self as assets, MockLoader};
    use crate::engine::assets::res;
    use crate::hero::{testing::hero_at, HeroPose, MAX_HEALTH};
    use crate::manager::testing::pool_spawner;
    use crate::manager::SpawnKind;
    use crate::obstacle::{lion, tortoise, Body, Lion, Pillar, Tortoise};
    use crate::sprite::testing as sprites;
    use anyhow::Result;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use futures::executor::{block_on, LocalPool};
    use std::cell::Cell;

    /// Plain obstacle counting its removals
    struct Probe {
        body: Body,
        removals: Rc<Cell<u32>>,
    }

    impl Probe {
        fn new(priority: u8, bounds: Rect) -> Self {
            let mut body = Body::new(priority);
            body.bounds = bounds;
            Probe {
                body,
                removals: Rc::default(),
            }
        }
    }

    #[async_trait(?Send)]
    impl Obstacle for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn body(&self) -> &Body {
            &self.body
        }

        fn body_mut(&mut self) -> &mut Body {
            &mut self.body
        }

        async fn prepare(&mut self, _assets: &AssetStore) -> Result<()> {
            Ok(())
        }

        fn on_remove_from_scene(&mut self) {
            self.removals.set(self.removals.get() + 1);
        }
    }

    struct Harness {
        scene: Scene,
        pool: LocalPool,
        store: AssetStore,
        loader: Rc<MockLoader>,
        exits: Rc<Cell<u32>>,
    }

    impl Harness {
        fn new(spawn: SpawnConfig) -> Self {
            Self::with_loader(spawn, assets::loader())
        }

        fn with_loader(spawn: SpawnConfig, loader: MockLoader) -> Self {
            let (store, loader) = assets::store_from(loader);
            let pool = LocalPool::new();
            let spawner = pool_spawner(&pool);
            let mut scene = Scene::new(SceneConfig::default(), spawn, store.clone(), spawner);
            let exits = Rc::new(Cell::new(0));
            let counter = exits.clone();
            scene
                .manager_mut()
                .set_exit_hook(move || counter.set(counter.get() + 1));
            Harness {
                scene,
                pool,
                store,
                loader,
                exits,
            }
        }

        /// No spawns ever
        fn quiet() -> Self {
            Self::new(SpawnConfig {
                palette: vec![],
                ..SpawnConfig::default()
            })
        }

        /// Prepared hero standing on the ground with its left edge at `x`
        fn with_hero_at(mut self, x: f32) -> Self {
            let ground = self.scene.config().ground_y;
            let hero = hero_at(&self.store, x, ground);
            self.scene.set_hero(Box::new(hero)).expect("hero joins");
            let top = self.scene.hero().expect("hero").body().bounds.top;
            let hero = self.scene.hero_mut().expect("hero");
            hero.body_mut().bounds.offset_to(x, top);
            self
        }

        fn settle(&mut self) {
            self.pool.run_until_stalled();
        }

        fn prepared<T: Obstacle>(&self, mut obstacle: T, left: f32, top: f32) -> Box<T> {
            block_on(obstacle.prepare(&self.store)).expect("obstacle assets");
            obstacle.body_mut().bounds.offset_to(left, top);
            Box::new(obstacle)
        }

        fn names(&self) -> Vec<&'static str> {
            self.scene.obstacles().map(|obstacle| obstacle.name()).collect()
        }
    }

    #[test]
    fn insertion_keeps_priority_order_and_is_stable() {
        let mut harness = Harness::quiet();
        let priorities = [128u8, 0, 255, 128, 127, 0, 128];
        let mut ids = Vec::new();
        for priority in priorities {
            let probe = Probe::new(priority, Rect::new(0.0, 0.0, 10.0, 10.0));
            ids.push((priority, harness.scene.add_obstacle(Box::new(probe))));
            let order: Vec<u8> = harness
                .scene
                .obstacles()
                .map(|obstacle| obstacle.body().priority())
                .collect();
            assert!(order.windows(2).all(|pair| pair[0] <= pair[1]));
        }

        let mut expected = ids.clone();
        expected.sort_by_key(|(priority, _)| *priority);
        let actual: Vec<EntityId> = harness.scene.obstacles.iter().map(|slot| slot.id).collect();
        assert_eq!(
            actual,
            expected.into_iter().map(|(_, id)| id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn update_without_hero_only_flushes() {
        let mut harness = Harness::quiet();
        harness
            .scene
            .queue_obstacle(Box::new(Probe::new(0, Rect::new(10.0, 10.0, 20.0, 20.0))));
        assert!(harness.scene.is_empty());
        harness.scene.update();
        assert_eq!(harness.scene.len(), 1);
        assert_relative_eq!(harness.scene.scroll(), 0.0);
        // no gravity without a running game
        assert_eq!(
            harness.scene.obstacles().next().map(|o| o.body().bounds),
            Some(Rect::new(10.0, 10.0, 20.0, 20.0))
        );
    }

    #[test]
    fn hero_joins_centered_after_preparation() {
        let mut harness = Harness::quiet();
        harness.scene.start();
        harness.scene.update();
        assert!(harness.scene.hero().is_none());

        harness.settle();
        harness.scene.update();
        let hero = harness.scene.hero().expect("hero joined");
        // floor(1012 / 2) - floor(50 / 2)
        assert_relative_eq!(hero.body().bounds.left, 481.0);
        assert!(harness.scene.load_error().is_none());
    }

    #[test]
    fn second_hero_is_dropped() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        let id = harness.scene.hero_id();
        let extra = hero_at(&harness.store, 0.0, 360.0);
        assert!(harness.scene.set_hero(Box::new(extra)).is_none());
        assert_eq!(harness.scene.len(), 1);
        assert_eq!(harness.scene.hero_id(), id);
    }

    #[test]
    fn failed_hero_preparation_is_reported_and_retried() {
        let mut harness = Harness::quiet();
        harness.loader.fail("res/animation/hero_run.json");
        harness.scene.start();
        harness.settle();
        harness.scene.update();
        assert!(harness.scene.hero().is_none());
        let error = harness.scene.load_error().expect("load error");
        assert!(error.contains("hero_run.json"), "{}", error);

        harness.loader.recover("res/animation/hero_run.json");
        harness.scene.start();
        assert!(harness.scene.load_error().is_none());
        harness.settle();
        harness.scene.update();
        assert!(harness.scene.hero().is_some());
    }

    #[test]
    fn everything_scrolls_and_falls_each_tick() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        let pillar = harness.prepared(Pillar::new(0), 600.0, 0.0);
        harness.scene.add_obstacle(pillar);
        harness.scene.update();

        assert_relative_eq!(harness.scene.scroll(), 5.0);
        let hero = harness.scene.hero().expect("hero");
        // scroll and run speed cancel out, the ground holds the hero up
        assert_relative_eq!(hero.body().bounds.left, 100.0);
        assert_relative_eq!(hero.body().bounds.bottom, 360.0);
        let pillar = harness.scene.obstacles_in(Rect::new(590.0, 0.0, 600.0, 10.0));
        assert_eq!(pillar.len(), 1);
        assert_eq!(pillar[0].body().bounds, Rect::new(595.0, 5.0, 635.0, 125.0));
    }

    #[test]
    fn nothing_ends_below_the_ground() {
        let mut harness = Harness::new(SpawnConfig {
            min_delay: 5,
            max_delay: 15,
            seed: Some(3),
            ..SpawnConfig::default()
        })
        .with_hero_at(100.0);
        let deep = harness.prepared(Lion::new(), 700.0, 900.0);
        harness.scene.add_obstacle(deep);
        for _ in 0..300 {
            harness.scene.update();
            harness.settle();
            let ground = harness.scene.config().ground_y;
            assert!(harness
                .scene
                .obstacles()
                .all(|obstacle| obstacle.body().bounds.bottom <= ground));
        }
    }

    #[test]
    fn dead_and_offscreen_obstacles_are_evicted_once() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        let doomed = Probe::new(10, Rect::new(300.0, 300.0, 320.0, 360.0));
        let doomed_removals = doomed.removals.clone();
        let doomed_id = harness.scene.add_obstacle(Box::new(doomed));
        // right edge still on screen after one tick, past 0 after two
        let leaving = Probe::new(10, Rect::new(-20.0, 300.0, 7.0, 360.0));
        let leaving_removals = leaving.removals.clone();
        harness.scene.add_obstacle(Box::new(leaving));

        harness.scene.update();
        assert_eq!(harness.scene.len(), 3);

        harness.scene.remove_obstacle(doomed_id);
        harness.scene.update();
        // the removal was flushed at the end of the tick, the next pass evicts
        assert_eq!(harness.names(), vec!["probe", "hero"]);
        assert_eq!(leaving_removals.get(), 1);

        harness.scene.update();
        assert_eq!(harness.names(), vec!["hero"]);
        for _ in 0..3 {
            harness.scene.update();
        }
        assert_eq!(doomed_removals.get(), 1);
        assert_eq!(leaving_removals.get(), 1);
    }

    #[test]
    fn lion_hurts_the_hero_once() {
        let mut harness = Harness::quiet().with_hero_at(481.0);
        let lion = harness.prepared(Lion::new(), 500.0, 310.0);
        harness.scene.add_obstacle(lion);

        harness.scene.update();
        let hero = harness.scene.hero().expect("hero");
        assert_eq!(hero.health(), MAX_HEALTH - lion::ATTACK);
        assert_relative_eq!(hero.body().bounds.left, 481.0 - lion::SPEED * 10.0);
        let lion = harness
            .scene
            .obstacles()
            .find(|obstacle| obstacle.name() == "lion")
            .expect("lion");
        assert!(!lion.body().can_collide());

        for _ in 0..5 {
            harness.scene.update();
        }
        assert_eq!(
            harness.scene.hero().map(Hero::health),
            Some(MAX_HEALTH - lion::ATTACK)
        );
    }

    #[test]
    fn collisions_use_the_inset_hit_boxes() {
        let mut loader = assets::loader();
        // hit box starts 30 past the drawn left edge
        assets::inset_atlas(&mut loader, res::LION_RUN, [30.0, 0.0, 0.0, 0.0]);
        let quiet = SpawnConfig {
            palette: vec![],
            ..SpawnConfig::default()
        };
        let mut harness = Harness::with_loader(quiet, loader).with_hero_at(481.0);
        // lion closes in by 6 per tick, hit box left at 534 then 528
        let lion = harness.prepared(Lion::new(), 510.0, 310.0);
        harness.scene.add_obstacle(lion);

        harness.scene.update();
        let hero_bounds = harness.scene.hero().expect("hero").body().bounds;
        let lion_body = harness
            .scene
            .obstacles()
            .find(|obstacle| obstacle.name() == "lion")
            .expect("lion")
            .body();
        assert!(lion_body.bounds.intersects(hero_bounds));
        assert!(!lion_body.collision_bounds().intersects(hero_bounds));
        assert_eq!(harness.scene.hero().map(Hero::health), Some(MAX_HEALTH));

        harness.scene.update();
        assert_eq!(
            harness.scene.hero().map(Hero::health),
            Some(MAX_HEALTH - lion::ATTACK)
        );
    }

    #[test]
    fn tortoise_hurts_a_running_hero_once() {
        let mut harness = Harness::quiet().with_hero_at(481.0);
        let tortoise = harness.prepared(Tortoise::new(), 500.0, 320.0);
        harness.scene.add_obstacle(tortoise);

        for _ in 0..6 {
            harness.scene.update();
        }
        let hero = harness.scene.hero().expect("hero");
        assert_eq!(hero.health(), MAX_HEALTH - tortoise::ATTACK);
        assert_eq!(hero.bonus_score(), 0);
        let tortoise = harness
            .scene
            .obstacles()
            .find(|obstacle| obstacle.name() == "tortoise")
            .expect("tortoise stays");
        assert!(tortoise.body().is_active());
        assert!(!tortoise.body().can_collide());
    }

    #[test]
    fn pillar_blocks_on_every_tick() {
        let mut harness = Harness::quiet().with_hero_at(200.0);
        // overlaps the hero from the top of the screen down past its head
        let pillar = harness.prepared(Pillar::new(2), 230.0, 250.0);
        harness.scene.add_obstacle(pillar);

        harness.scene.update();
        harness.scene.update();
        let hero = harness.scene.hero().expect("hero");
        // pushed back by its own run speed, twice
        assert_relative_eq!(hero.body().bounds.left, 190.0);
        assert_eq!(hero.health(), MAX_HEALTH);
    }

    #[test]
    fn stomping_a_tortoise_scores_a_bonus() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        harness.scene.dispatch_event(InputEvent::Primary);
        // net climb of 5 per tick against gravity, apex on tick 32, the
        // jump animation lasts 40
        for _ in 0..35 {
            harness.scene.update();
        }
        let hero = harness.scene.hero().expect("hero");
        assert_eq!(hero.pose(), HeroPose::Jump);
        assert!(hero.vertical_speed() >= 0.0);
        let hero_bounds = hero.body().bounds;

        let tortoise = harness.prepared(
            Tortoise::new(),
            hero_bounds.left - 10.0,
            hero_bounds.bottom - 20.0,
        );
        harness.scene.add_obstacle(tortoise);
        let scroll_before = harness.scene.scroll();
        harness.scene.update();

        let hero = harness.scene.hero().expect("hero");
        assert_eq!(hero.health(), MAX_HEALTH);
        assert_eq!(hero.bonus_score(), crate::obstacle::tortoise::STOMP_BONUS);
        assert_eq!(
            harness.scene.score(),
            Some((scroll_before + 5.0) as u64 + crate::obstacle::tortoise::STOMP_BONUS)
        );
    }

    #[test]
    fn losing_all_health_ends_the_game() {
        let mut harness = Harness::quiet().with_hero_at(481.0);
        {
            let hero = harness.scene.hero_mut().expect("hero");
            hero.hurt(MAX_HEALTH - 1);
        }
        let lion = harness.prepared(Lion::new(), 500.0, 310.0);
        harness.scene.add_obstacle(lion);

        harness.scene.update();
        assert!(harness.scene.hero().is_none());
        assert!(harness.scene.score().is_none());
        assert_eq!(harness.exits.get(), 1);

        harness.scene.update();
        assert_eq!(harness.exits.get(), 1);
    }

    #[test]
    fn spawned_obstacles_join_at_the_frontier() {
        let mut harness = Harness::new(SpawnConfig {
            min_delay: 2,
            max_delay: 2,
            palette: vec![SpawnKind::Lion],
            seed: Some(1),
        })
        .with_hero_at(100.0);
        for _ in 0..3 {
            harness.scene.update();
        }
        assert_eq!(harness.names(), vec!["hero"]);

        harness.settle();
        harness.scene.update();
        let lion = harness
            .scene
            .obstacles()
            .find(|obstacle| obstacle.name() == "lion")
            .expect("lion joined");
        let config = harness.scene.config();
        assert_relative_eq!(lion.body().bounds.left, config.width);
        assert_relative_eq!(lion.body().bounds.bottom, config.ground_y);
        assert_eq!(harness.names(), vec!["lion", "hero"]);
    }

    #[test]
    fn restart_begins_a_fresh_run() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        harness
            .scene
            .add_obstacle(Box::new(Probe::new(1, Rect::new(0.0, 0.0, 10.0, 10.0))));
        for _ in 0..10 {
            harness.scene.update();
        }
        harness.scene.restart();
        assert!(harness.scene.is_empty());
        assert_relative_eq!(harness.scene.scroll(), 0.0);

        harness.settle();
        harness.scene.update();
        assert_eq!(harness.names(), vec!["hero"]);
    }

    #[test]
    fn preparations_from_a_lost_run_never_join_the_next() {
        let mut harness = Harness::new(SpawnConfig {
            min_delay: 0,
            max_delay: 0,
            palette: vec![SpawnKind::Lion],
            seed: Some(5),
        })
        .with_hero_at(100.0);
        // starts preparing a lion that is still pending when the run ends
        harness.scene.update();
        harness.scene.hero_mut().expect("hero").body_mut().kill();
        harness.scene.update();
        assert!(harness.scene.hero().is_none());

        harness.scene.restart();
        harness.settle();
        // the old lion and the new hero, the tick that lost the hero spawned
        // nothing more
        assert_eq!(harness.scene.commands().len(), 2);
        harness.scene.update();
        assert_eq!(harness.names(), vec!["hero"]);
    }

    #[test]
    fn input_reaches_the_hero_only_while_running() {
        let mut harness = Harness::quiet();
        assert!(!harness.scene.dispatch_event(InputEvent::Primary));
        let mut harness = harness.with_hero_at(100.0);
        assert!(harness.scene.dispatch_event(InputEvent::Secondary));
        assert_eq!(harness.scene.hero().map(Hero::pose), Some(HeroPose::Duck));
    }

    #[test]
    fn resize_centers_the_hero_and_moves_the_world() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        let probe = Probe::new(1, Rect::new(300.0, 0.0, 310.0, 10.0));
        harness.scene.add_obstacle(Box::new(probe));
        harness.scene.resize(800.0, 400.0);

        let hero = harness.scene.hero().expect("hero");
        assert_relative_eq!(hero.body().bounds.left, 375.0);
        let moved = harness.scene.obstacles_in(Rect::new(570.0, 0.0, 590.0, 10.0));
        assert_eq!(moved.len(), 1);
        assert_eq!(harness.scene.config().width, 800.0);
    }

    #[test]
    fn draw_skips_offscreen_obstacles_and_shows_hit_boxes() {
        let mut harness = Harness::quiet().with_hero_at(100.0);
        harness
            .scene
            .add_obstacle(Box::new(Probe::new(1, Rect::new(2000.0, 0.0, 2010.0, 10.0))));
        harness.scene.config.show_collision_bounds = true;

        let renderer = RecordingRenderer::default();
        harness.scene.draw(&renderer);
        let calls = renderer.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::Image { .. }));
        assert!(matches!(&calls[1], Call::Fill { color, .. } if color == COLLISION_BOUNDS_COLOR));
    }

    #[test]
    fn background_tiles_cover_the_viewport() {
        let image = sprites::image(300.0, 50.0);
        for scroll in [0.0, 1000.0, 299.0, 300.0, 12345.0] {
            let renderer = RecordingRenderer::default();
            draw_cover_image(&renderer, image.as_ref(), scroll, 10.0, 1012.0);
            let slices = renderer.images();

            let mut screen_x = 0.0;
            let mut world_x: f32 = scroll;
            for (frame, destination) in &slices {
                assert_relative_eq!(frame.left, world_x.rem_euclid(300.0));
                assert!(frame.right <= 300.0);
                assert_relative_eq!(destination.left, screen_x);
                assert_relative_eq!(destination.top, 10.0);
                assert_relative_eq!(destination.width(), frame.width());
                screen_x += frame.width();
                world_x += frame.width();
            }
            assert_relative_eq!(screen_x, 1012.0);
        }
    }

    #[test]
    fn zero_width_background_draws_nothing() {
        let renderer = RecordingRenderer::default();
        draw_cover_image(&renderer, sprites::image(0.0, 50.0).as_ref(), 5.0, 0.0, 100.0);
        assert!(renderer.calls.borrow().is_empty());
    }
}

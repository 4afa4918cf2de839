use crate::engine::assets::AssetStore;
use crate::hero::Hero;
use crate::obstacle::{CollisionPolicy, Lion, Obstacle, Pillar, Tortoise};
use crate::scene::{CommandQueue, Placement, SceneCommand};
use futures::future::{FutureExt, LocalBoxFuture};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Runs a preparation future to completion, the browser spawns it on the
/// microtask queue, tests on a local pool
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

pub type ExitHook = Box<dyn FnMut()>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Lion,
    Pillar,
    Tortoise,
}

impl SpawnKind {
    pub fn create(self, rng: &mut impl Rng) -> Box<dyn Obstacle> {
        match self {
            SpawnKind::Lion => Box::new(Lion::new()),
            SpawnKind::Pillar => Box::new(Pillar::new(rng.gen())),
            SpawnKind::Tortoise => Box::new(Tortoise::new()),
        }
    }
}

/// When and what to spawn
/// - delays are in ticks, drawn uniformly from `min_delay..max_delay`
/// - `seed` makes the sequence reproducible
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub min_delay: u32,
    pub max_delay: u32,
    pub palette: Vec<SpawnKind>,
    pub seed: Option<u64>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        SpawnConfig {
            min_delay: 50,
            max_delay: 100,
            palette: vec![SpawnKind::Lion, SpawnKind::Pillar, SpawnKind::Tortoise],
            seed: None,
        }
    }
}

/// Game rules sitting beside the scene simulation
///
/// ┌─────────────────────────── GameManager ─────────────────────────────────┐
/// │ start()          : prepare a hero, it joins as the scene's hero         │
/// │ spawn_if_due()   : tick the spawn timer, prepare a palette obstacle     │
/// │ on_collision()   : let the obstacle react, then apply its policy        │
/// │ score()          : distance run + hero bonus                            │
/// │ exit()           : hero is gone, hand over to the shell                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// Preparation runs on the spawner and reports back through the scene's
/// command queue, so nothing joins the scene mid traversal.
pub struct GameManager {
    config: SpawnConfig,
    assets: AssetStore,
    spawner: Spawner,
    commands: CommandQueue,
    rng: SmallRng,
    timer: u32,
    next_time: u32,
    generation: u64,
    exit_hook: Option<ExitHook>,
}

impl GameManager {
    pub fn new(
        config: SpawnConfig,
        assets: AssetStore,
        spawner: Spawner,
        commands: CommandQueue,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut manager = GameManager {
            config,
            assets,
            spawner,
            commands,
            rng,
            timer: 0,
            next_time: 0,
            generation: 0,
            exit_hook: None,
        };
        manager.next_time = manager.roll_delay();
        manager
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Run counter, preparations report back tagged with the run they
    /// started in
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_exit_hook(&mut self, hook: impl FnMut() + 'static) {
        self.exit_hook = Some(Box::new(hook));
    }

    /// Prepare the hero
    pub fn start(&self) {
        self.prepare(Box::new(Hero::new()), Placement::Hero);
    }

    /// Rewind the spawn timer for a new run. Preparations still in flight
    /// belong to the old run from now on.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.timer = 0;
        self.next_time = self.roll_delay();
    }

    /// Called once per tick, returns true when a spawn was started
    pub fn spawn_if_due(&mut self) -> bool {
        let due = self.timer >= self.next_time;
        if due {
            self.spawn();
            self.timer = 0;
            self.next_time = self.roll_delay();
        }
        self.timer += 1;
        due
    }

    /// Prepare a random palette obstacle for the right edge of the scene
    pub fn spawn(&mut self) {
        let Some(kind) = self.config.palette.choose(&mut self.rng).copied() else {
            return;
        };
        log::debug!("spawning {:?}", kind);
        let obstacle = kind.create(&mut self.rng);
        self.prepare(obstacle, Placement::Frontier);
    }

    pub fn on_collision(&mut self, hero: &mut Hero, other: &mut dyn Obstacle) {
        other.on_collision(hero);
        if other.collision_policy() == CollisionPolicy::OneShot {
            other.body_mut().set_collidable(false);
        }
        if hero.health() <= 0 {
            log::info!("hero ran out of health");
            hero.body_mut().kill();
        }
    }

    pub fn score(&self, scroll: f32, hero: &Hero) -> u64 {
        scroll.max(0.0) as u64 + hero.bonus_score()
    }

    pub fn exit(&mut self) {
        log::info!("game over");
        if let Some(hook) = self.exit_hook.as_mut() {
            hook();
        }
    }

    fn prepare(&self, obstacle: Box<dyn Obstacle>, placement: Placement) {
        let future = prepare_obstacle(
            obstacle,
            self.assets.clone(),
            self.commands.clone(),
            placement,
            self.generation,
        );
        (self.spawner)(future.boxed_local());
    }

    fn roll_delay(&mut self) -> u32 {
        let SpawnConfig {
            min_delay,
            max_delay,
            ..
        } = self.config;
        if min_delay >= max_delay {
            min_delay
        } else {
            self.rng.gen_range(min_delay..max_delay)
        }
    }
}

async fn prepare_obstacle(
    mut obstacle: Box<dyn Obstacle>,
    assets: AssetStore,
    commands: CommandQueue,
    placement: Placement,
    generation: u64,
) {
    match obstacle.prepare(&assets).await {
        Ok(()) => commands.push(SceneCommand::Insert {
            obstacle,
            placement,
            generation,
        }),
        Err(err) => {
            log::warn!("{} not prepared : {:#}", obstacle.name(), err);
            commands.push(SceneCommand::PrepareFailed {
                name: obstacle.name(),
                placement,
                generation,
                reason: format!("{:#}", err),
            });
        }
    }
}

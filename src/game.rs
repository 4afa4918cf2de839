use crate::browser;
use crate::engine::assets::{res, AssetPaths, AssetStore, WebLoader};
use crate::engine::{Game, InputEvent, Rect, Renderer};
use crate::manager::{SpawnConfig, Spawner};
use crate::scene::{Scene, SceneConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Optional overrides next to index.html, defaults apply when missing
pub const CONFIG_PATH: &str = "config.json";

mod hud {
    pub const TEXT_COLOR: &str = "#ffffff";
    pub const ERROR_COLOR: &str = "#ff4040";
    pub const MARGIN: f32 = 10.0;
    pub const LINE_HEIGHT: f32 = 30.0;
    pub const BEST_WIDTH: f32 = 240.0;
}

/// Everything tunable about a game, read from `config.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub scene: SceneConfig,
    pub spawn: SpawnConfig,
    pub assets: AssetPaths,
}

/// Best score across runs
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HighScore(u64);

impl HighScore {
    pub fn new(score: u64) -> Self {
        HighScore(score)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Returns true when `score` is a new best
    pub fn submit(&mut self, score: u64) -> bool {
        if score > self.0 {
            self.0 = score;
            true
        } else {
            false
        }
    }
}

/// ┌────────────────────────── RunnerGame ───────────────────────────────────┐
/// │ Loading : config, asset store and background are fetched               │
/// │ Loaded  : one Run, paused on game over until input restarts it          │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum RunnerGame {
    Loading,
    Loaded(Run),
}

impl RunnerGame {
    pub fn new() -> Self {
        RunnerGame::Loading
    }

    async fn load_config() -> GameConfig {
        match browser::fetch_json::<GameConfig>(CONFIG_PATH).await {
            Ok(config) => config,
            Err(err) => {
                log::info!("Using the default config : {:#}", err);
                GameConfig::default()
            }
        }
    }
}

impl Default for RunnerGame {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Game for RunnerGame {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            RunnerGame::Loading => {
                let config = Self::load_config().await;
                let assets = AssetStore::new(Rc::new(WebLoader), config.assets.clone());
                let background = assets
                    .load_image(res::BACKGROUND)
                    .await
                    .context("Failed to load the background")?;
                let spawner: Spawner =
                    Rc::new(|future: LocalBoxFuture<'static, ()>| browser::spawn_local(future));
                let mut scene = Scene::new(config.scene, config.spawn, assets, spawner);
                scene.set_background(background);
                let run = Run::new(scene, HighScore::new(browser::load_high_score()));
                Ok(Box::new(RunnerGame::Loaded(run)))
            }
            RunnerGame::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        if let RunnerGame::Loaded(run) = self {
            run.handle_input(event);
        }
    }

    fn update(&mut self) {
        if let RunnerGame::Loaded(run) = self {
            if let Some(best) = run.update() {
                log::info!("new high score {}", best);
                if let Err(err) = browser::save_high_score(best) {
                    log::warn!("{:#}", err);
                }
            }
        }
    }

    fn draw(&self, renderer: &dyn Renderer) {
        if let RunnerGame::Loaded(run) = self {
            run.draw(renderer);
        }
    }
}

/// A scene plus the score keeping around it
///
/// Once the scene's exit hook fires the run holds its final score and
/// stops ticking. The next input starts a fresh run.
pub struct Run {
    scene: Scene,
    high_score: HighScore,
    last_score: u64,
    game_over: Rc<Cell<bool>>,
    final_score: Option<u64>,
}

impl Run {
    /// Hooks the scene's exit and starts preparing the first hero
    pub fn new(mut scene: Scene, high_score: HighScore) -> Self {
        let game_over = Rc::new(Cell::new(false));
        let flag = game_over.clone();
        scene.manager_mut().set_exit_hook(move || flag.set(true));
        scene.start();
        Run {
            scene,
            high_score,
            last_score: 0,
            game_over,
            final_score: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn high_score(&self) -> HighScore {
        self.high_score
    }

    /// Score of the finished run while the game over screen is up
    pub fn final_score(&self) -> Option<u64> {
        self.final_score
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if self.final_score.take().is_some() {
            log::info!("starting a new run");
            self.scene.restart();
            return;
        }
        if self.scene.load_error().is_some() {
            log::info!("retrying the hero preparation");
            self.scene.start();
            return;
        }
        self.scene.dispatch_event(event);
    }

    /// Tick the scene, returns the new best score when a run just ended
    /// with one
    pub fn update(&mut self) -> Option<u64> {
        if self.final_score.is_some() {
            return None;
        }
        self.scene.update();
        if let Some(score) = self.scene.score() {
            self.last_score = score;
        }
        if !self.game_over.replace(false) {
            return None;
        }
        let score = std::mem::take(&mut self.last_score);
        let is_best = self.high_score.submit(score);
        log::info!("run over with {} points", score);
        self.final_score = Some(score);
        is_best.then_some(score)
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        let config = self.scene.config();
        renderer.clear(&Rect::new(0.0, 0.0, config.width, config.height));
        self.scene.draw(renderer);

        let best = format!("BEST {}", self.high_score.get());
        renderer.fill_text(
            &best,
            config.width - hud::BEST_WIDTH,
            hud::MARGIN,
            hud::TEXT_COLOR,
        );
        if let Some(score) = self.final_score {
            let center = config.height / 2.0;
            renderer.fill_text("GAME OVER", hud::MARGIN, center, hud::TEXT_COLOR);
            renderer.fill_text(
                &format!("SCORE {}", score),
                hud::MARGIN,
                center + hud::LINE_HEIGHT,
                hud::TEXT_COLOR,
            );
            renderer.fill_text(
                "Tap to play again",
                hud::MARGIN,
                center + 2.0 * hud::LINE_HEIGHT,
                hud::TEXT_COLOR,
            );
            return;
        }
        if let Some(error) = self.scene.load_error() {
            let message = format!("Could not load the game, tap to retry ({})", error);
            renderer.fill_text(&message, hud::MARGIN, config.height / 2.0, hud::ERROR_COLOR);
            return;
        }
        let (Some(hero), Some(score)) = (self.scene.hero(), self.scene.score()) else {
            renderer.fill_text("Loading...", hud::MARGIN, hud::MARGIN, hud::TEXT_COLOR);
            return;
        };
        renderer.fill_text(
            &format!("HP {}", hero.health().max(0)),
            hud::MARGIN,
            hud::MARGIN,
            hud::TEXT_COLOR,
        );
        renderer.fill_text(
            &format!("SCORE {}", score),
            hud::MARGIN,
            hud::MARGIN + hud::LINE_HEIGHT,
            hud::TEXT_COLOR,
        );
    }
}

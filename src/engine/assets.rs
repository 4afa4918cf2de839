use crate::browser;
use crate::engine::{self, HtmlImage, HtmlSound, ImageHandle, SoundHandle};
use crate::sprite::{AtlasSheet, Frames};
use anyhow::{anyhow, Context, Error, Result};
use async_trait::async_trait;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

/// File names of every resource the game uses, relative to `AssetPaths`
pub mod res {
    pub const BACKGROUND: &str = "background.png";
    pub const HERO_RUN: &str = "hero_run.json";
    pub const HERO_JUMP: &str = "hero_jump.json";
    pub const HERO_DOWN: &str = "hero_down.json";
    pub const LION_RUN: &str = "lion_run.json";
    pub const TORTOISE_DEAD: &str = "tortoise_dead.json";
    pub const PILLAR_STYLE: &str = "pillar_style.json";
    pub const HIT: &str = "hit.mp3";
}

/// Directory prefixes for each kind of resource
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AssetPaths {
    pub pictures: String,
    pub animations: String,
    pub music: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        AssetPaths {
            pictures: "res/pictures/".into(),
            animations: "res/animation/".into(),
            music: "res/music/".into(),
        }
    }
}

/// Platform side of asset loading : fetch one resource, no caching
#[async_trait(?Send)]
pub trait AssetLoader {
    async fn load_image(&self, path: &str) -> Result<ImageHandle>;
    async fn load_atlas(&self, path: &str) -> Result<AtlasSheet>;
    async fn load_sound(&self, path: &str) -> Result<SoundHandle>;
}

/// Browser loader : image elements, fetch + json, audio elements
pub struct WebLoader;

#[async_trait(?Send)]
impl AssetLoader for WebLoader {
    async fn load_image(&self, path: &str) -> Result<ImageHandle> {
        let image = engine::load_image(path).await?;
        Ok(Rc::new(HtmlImage(image)))
    }

    async fn load_atlas(&self, path: &str) -> Result<AtlasSheet> {
        browser::fetch_json::<AtlasSheet>(path).await
    }

    async fn load_sound(&self, path: &str) -> Result<SoundHandle> {
        let audio = engine::load_audio(path).await?;
        Ok(Rc::new(HtmlSound(audio)))
    }
}

// anyhow::Error is not Clone, waiters sharing one load share the error by Rc
type Pending<T> = Shared<LocalBoxFuture<'static, Result<T, Rc<Error>>>>;

struct Cache<T> {
    entries: RefCell<HashMap<String, Pending<T>>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Cache {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

struct StoreInner {
    loader: Rc<dyn AssetLoader>,
    paths: AssetPaths,
    images: Cache<ImageHandle>,
    animations: Cache<Frames>,
    sounds: Cache<SoundHandle>,
}

fn images_of(inner: &StoreInner) -> &Cache<ImageHandle> {
    &inner.images
}

fn animations_of(inner: &StoreInner) -> &Cache<Frames> {
    &inner.animations
}

fn sounds_of(inner: &StoreInner) -> &Cache<SoundHandle> {
    &inner.sounds
}

/// Cached-by-path asset access shared by every entity
///
/// ┌──────────────────── request for "hero_run.json" ────────────────────────┐
/// │ first request   → start ONE load, remember its Shared future            │
/// │ while loading   → hand out a clone of the same Shared future            │
/// │ after success   → clones resolve immediately with the cached value      │
/// │ after failure   → entry is evicted, the next request loads again        │
/// └─────────────────────────────────────────────────────────────────────────┘
#[derive(Clone)]
pub struct AssetStore {
    inner: Rc<StoreInner>,
}

impl AssetStore {
    pub fn new(loader: Rc<dyn AssetLoader>, paths: AssetPaths) -> Self {
        AssetStore {
            inner: Rc::new(StoreInner {
                loader,
                paths,
                images: Cache::default(),
                animations: Cache::default(),
                sounds: Cache::default(),
            }),
        }
    }

    /// Image `name` under the pictures directory
    pub fn load_image(&self, name: &str) -> impl Future<Output = Result<ImageHandle>> {
        let path = format!("{}{}", self.inner.paths.pictures, name);
        let loader = self.inner.loader.clone();
        self.request(
            images_of,
            path,
            move |path| async move { loader.load_image(&path).await },
        )
    }

    /// Atlas `name` under the animation directory, cut into frames. The atlas
    /// image goes through the image cache, so atlases sharing a sheet fetch it
    /// once.
    pub fn load_animation(&self, name: &str) -> impl Future<Output = Result<Frames>> {
        let path = format!("{}{}", self.inner.paths.animations, name);
        let store = self.clone();
        self.request(
            animations_of,
            path,
            move |path| async move {
                let sheet = store.inner.loader.load_atlas(&path).await?;
                let image = store
                    .load_image(&sheet.image_path)
                    .await
                    .with_context(|| format!("Failed to load atlas image for {}", path))?;
                sheet.into_frames(image)
            },
        )
    }

    /// Sound `name` under the music directory
    pub fn load_sound(&self, name: &str) -> impl Future<Output = Result<SoundHandle>> {
        let path = format!("{}{}", self.inner.paths.music, name);
        let loader = self.inner.loader.clone();
        self.request(
            sounds_of,
            path,
            move |path| async move { loader.load_sound(&path).await },
        )
    }

    fn request<T, F, Fut>(
        &self,
        cache: fn(&StoreInner) -> &Cache<T>,
        path: String,
        load: F,
    ) -> impl Future<Output = Result<T>>
    where
        T: Clone + 'static,
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>> + 'static,
    {
        let pending = {
            let mut entries = cache(&self.inner).entries.borrow_mut();
            match entries.get(&path) {
                Some(pending) => pending.clone(),
                None => {
                    log::info!("load asset from {}", path);
                    let store = Rc::downgrade(&self.inner);
                    let key = path.clone();
                    let load = load(path.clone());
                    let pending = async move {
                        let result = load.await.map_err(Rc::new);
                        if let Err(err) = &result {
                            log::warn!("Error loading {} : {:#}", key, err);
                            if let Some(inner) = store.upgrade() {
                                cache(&inner).entries.borrow_mut().remove(&key);
                            }
                        }
                        result
                    }
                    .boxed_local()
                    .shared();
                    entries.insert(path, pending.clone());
                    pending
                }
            }
        };
        async move { pending.await.map_err(|err| anyhow!("{:#}", err)) }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::engine::Sound;
    use crate::sprite::testing::image;
    use std::cell::Cell;
    use std::collections::HashSet;

    pub struct CountingSound(pub Rc<Cell<u32>>);

    impl Sound for CountingSound {
        fn play(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    /// In-memory loader that resolves immediately and counts every fetch
    #[derive(Default)]
    pub struct MockLoader {
        pub atlases: HashMap<String, AtlasSheet>,
        pub failing: RefCell<HashSet<String>>,
        pub calls: RefCell<HashMap<String, usize>>,
        pub plays: Rc<Cell<u32>>,
    }

    impl MockLoader {
        pub fn calls(&self, path: &str) -> usize {
            self.calls.borrow().get(path).copied().unwrap_or(0)
        }

        pub fn fail(&self, path: &str) {
            self.failing.borrow_mut().insert(path.to_string());
        }

        pub fn recover(&self, path: &str) {
            self.failing.borrow_mut().remove(path);
        }

        fn record(&self, path: &str) -> Result<()> {
            *self.calls.borrow_mut().entry(path.to_string()).or_default() += 1;
            if self.failing.borrow().contains(path) {
                return Err(anyhow!("mock failure for {}", path));
            }
            Ok(())
        }
    }

    #[async_trait(?Send)]
    impl AssetLoader for MockLoader {
        async fn load_image(&self, path: &str) -> Result<ImageHandle> {
            self.record(path)?;
            Ok(image(1000.0, 1000.0))
        }

        async fn load_atlas(&self, path: &str) -> Result<AtlasSheet> {
            self.record(path)?;
            let name = path.rsplit('/').next().unwrap_or(path);
            self.atlases
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("no atlas named {}", name))
        }

        async fn load_sound(&self, path: &str) -> Result<SoundHandle> {
            self.record(path)?;
            Ok(Rc::new(CountingSound(self.plays.clone())))
        }
    }

    fn strip(image_path: &str, sizes: &[(f32, f32)]) -> AtlasSheet {
        let mut x = 0.0;
        let frame_bounds = sizes
            .iter()
            .map(|&(width, height)| {
                let bounds = [x, 0.0, x + width, height];
                x += width;
                bounds
            })
            .collect();
        AtlasSheet {
            image_path: image_path.to_string(),
            frame_bounds,
            frame_insets: None,
        }
    }

    /// Atlases for every entity, with frame sizes the scene tests rely on
    /// - hero : run 50x80, jump 50x90, down 60x50
    /// - lion 80x50, tortoise 60x40, pillar variants 40 wide
    pub fn loader() -> MockLoader {
        let mut loader = MockLoader::default();
        let atlases = [
            (res::HERO_RUN, strip("hero.png", &[(50.0, 80.0); 4])),
            (res::HERO_JUMP, strip("hero.png", &[(50.0, 90.0); 4])),
            (res::HERO_DOWN, strip("hero.png", &[(60.0, 50.0); 2])),
            (res::LION_RUN, strip("lion.png", &[(80.0, 50.0); 3])),
            (res::TORTOISE_DEAD, strip("tortoise.png", &[(60.0, 40.0); 3])),
            (
                res::PILLAR_STYLE,
                strip("pillar.png", &[(40.0, 120.0), (40.0, 150.0), (40.0, 100.0)]),
            ),
        ];
        for (name, sheet) in atlases {
            loader.atlases.insert(name.to_string(), sheet);
        }
        loader
    }

    /// Same hit box `insets` on every frame of atlas `name`
    pub fn inset_atlas(loader: &mut MockLoader, name: &str, insets: [f32; 4]) {
        if let Some(sheet) = loader.atlases.get_mut(name) {
            sheet.frame_insets = Some(vec![insets; sheet.frame_bounds.len()]);
        }
    }

    pub fn store() -> (AssetStore, Rc<MockLoader>) {
        store_from(loader())
    }

    pub fn store_from(loader: MockLoader) -> (AssetStore, Rc<MockLoader>) {
        let loader = Rc::new(loader);
        let store = AssetStore::new(loader.clone(), AssetPaths::default());
        (store, loader)
    }
}

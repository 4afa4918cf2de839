use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - because we control the closure creation and specify the expected type,
    // in principle this should be generally safe (unsafe) code
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

pub mod assets;
pub mod input;
pub mod rect;

pub use self::input::{InputEvent, InputQueue};
pub use self::rect::Rect;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn handle_input(&mut self, event: InputEvent);
    fn update(&mut self);
    fn draw(&self, renderer: &dyn Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut game = game.initialize().await?;
        let input = InputQueue::default();
        browser::listen_for_input(input.clone())?;

        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = CanvasRenderer {
            context: browser::context()?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            for event in input.drain() {
                game.handle_input(event);
            }
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            if let Some(closure) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(closure) {
                    log::error!("GameLoop stopped : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

/// Anything the renderer can blit from
/// - `as_any` lets a concrete renderer recover its own image type
pub trait ImageSource {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn as_any(&self) -> &dyn Any;
}

pub type ImageHandle = Rc<dyn ImageSource>;

/// A decoded, playable sound buffer
pub trait Sound {
    fn play(&self);
}

pub type SoundHandle = Rc<dyn Sound>;

/// The 2D drawing surface the scene paints on
pub trait Renderer {
    fn clear(&self, rect: &Rect);
    /// Blit `frame` (source sub rectangle of `image`) into `destination`
    fn draw_image(&self, image: &dyn ImageSource, frame: &Rect, destination: &Rect);
    fn fill_rect(&self, rect: &Rect, color: &str);
    fn fill_text(&self, text: &str, x: f32, y: f32, color: &str);
}

pub struct HtmlImage(pub HtmlImageElement);

impl ImageSource for HtmlImage {
    fn width(&self) -> f32 {
        self.0.natural_width() as f32
    }

    fn height(&self) -> f32 {
        self.0.natural_height() as f32
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct HtmlSound(pub HtmlAudioElement);

impl Sound for HtmlSound {
    fn play(&self) {
        // rewind so rapid hits restart the clip instead of being dropped
        self.0.set_current_time(0.0);
        if let Err(err) = self.0.play() {
            log::warn!("Could not play sound : {:#?}", err);
        }
    }
}

pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
}

impl Renderer for CanvasRenderer {
    fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.left.into(),
            rect.top.into(),
            rect.width().into(),
            rect.height().into(),
        );
    }

    fn draw_image(&self, image: &dyn ImageSource, frame: &Rect, destination: &Rect) {
        let Some(image) = image.as_any().downcast_ref::<HtmlImage>() else {
            log::warn!("CanvasRenderer can only draw HtmlImage sources");
            return;
        };
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &image.0,
                frame.left.into(),
                frame.top.into(),
                frame.width().into(),
                frame.height().into(),
                destination.left.into(),
                destination.top.into(),
                destination.width().into(),
                destination.height().into(),
            )
        {
            log::error!("Drawing is throwing exceptions : {:#?}", err);
        }
    }

    fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.left.into(),
            rect.top.into(),
            rect.width().into(),
            rect.height().into(),
        );
    }

    fn fill_text(&self, text: &str, x: f32, y: f32, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.set_font("24px monospace");
        self.context.set_text_baseline("top");
        if let Err(err) = self.context.fill_text(text, x.into(), y.into()) {
            log::warn!("Could not draw text : {:#?}", err);
        }
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    await_element("image", |on_load, on_error| {
        image.set_onload(Some(on_load.unchecked_ref()));
        image.set_onerror(Some(on_error.unchecked_ref()));
        image.set_src(source);
    })
    .await?;
    Ok(image)
}

/// Asynchronously load an audio clip, resolves once the browser reports it
/// can play through
pub async fn load_audio(source: &str) -> Result<HtmlAudioElement> {
    let audio = browser::new_audio(source)?;
    await_element("audio", |on_ready, on_error| {
        audio.set_oncanplaythrough(Some(on_ready.unchecked_ref()));
        audio.set_onerror(Some(on_error.unchecked_ref()));
        audio.load();
    })
    .await?;
    Ok(audio)
}

/// Resolves when the first of the two callbacks handed to `listen` fires
/// - `listen` gets (success, error) and wires them to the element
async fn await_element(kind: &str, listen: impl FnOnce(&JsValue, &JsValue)) -> Result<()> {
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();
    let kind = kind.to_string();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine::load_{}] Error loading {}: {:#?}",
                kind,
                kind,
                err
            )));
        }
    });

    listen(success_callback.as_ref(), error_callback.as_ref());

    // keep callbacks alive until the element loads or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - double unwrap because Result<Result<(), Error>, oneshot::Canceled>
    // - first unwrap yields channel result : Result<(), Error>
    // - second unwrap yields the load result : () or propagating Error
    rx.await??;
    Ok(())
}

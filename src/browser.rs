use crate::engine::{InputEvent, InputQueue};
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen::{JsCast, JsValue};

#[rustfmt::skip]
use web_sys::{
    Document,
    Window,
    CanvasRenderingContext2d,
    Event,
    HtmlAudioElement,
    HtmlCanvasElement,
    HtmlImageElement,
    Response,
    Storage,
};

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
    pub const HIGH_SCORE_KEY: &str = "score";
    pub const CANVAS_EVENTS: [&str; 3] = ["click", "contextmenu", "touchend"];
    pub const WINDOW_EVENTS: [&str; 1] = ["keyup"];
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn new_audio(source: &str) -> Result<HtmlAudioElement> {
    HtmlAudioElement::new_with_src(source)
        .map_err(|err| anyhow!("Could not create audio element for {} : {:#?}", source, err))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // get_context returns Result<Option<Object>, JsValue>
        // - map the JsValue error into anyhow
        // - turn the None case into an error as well
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Route pointer events on the canvas and key releases on the window into
/// `queue`. Handled events have their browser default (context menu, double
/// tap zoom) cancelled.
pub fn listen_for_input(queue: InputQueue) -> Result<()> {
    let handler = closure_wrap(Box::new(move |event: Event| {
        if let Some(input) = InputEvent::from_event(&event) {
            event.prevent_default();
            queue.push(input);
        }
    }) as Box<dyn FnMut(Event)>);

    let canvas = canvas()?;
    for name in html::CANVAS_EVENTS {
        canvas
            .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for {} : {:#?}", name, err))?;
    }
    let window = window()?;
    for name in html::WINDOW_EVENTS {
        window
            .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for {} : {:#?}", name, err))?;
    }
    // listeners live as long as the page
    handler.forget();
    Ok(())
}

fn local_storage() -> Result<Storage> {
    window()?
        .local_storage()
        .map_err(|err| anyhow!("Error getting local storage : {:#?}", err))?
        .ok_or_else(|| anyhow!("No local storage available"))
}

/// Best score persisted in local storage, 0 when absent or unreadable
pub fn load_high_score() -> u64 {
    let stored = local_storage().and_then(|storage| {
        storage
            .get_item(html::HIGH_SCORE_KEY)
            .map_err(|err| anyhow!("Error reading high score : {:#?}", err))
    });
    match stored {
        Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed high score '{}'", value);
            0
        }),
        Ok(None) => 0,
        Err(err) => {
            log::warn!("{:#}", err);
            0
        }
    }
}

pub fn save_high_score(score: u64) -> Result<()> {
    local_storage()?
        .set_item(html::HIGH_SCORE_KEY, &score.to_string())
        .map_err(|err| anyhow!("Error saving high score : {:#?}", err))
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching {} failed with status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

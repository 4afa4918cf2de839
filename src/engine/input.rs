use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Discrete player intents the scene understands
/// - Primary   : tap / click / ArrowUp   (jump)
/// - Secondary : context menu / ArrowDown (duck)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Primary,
    Secondary,
}

impl InputEvent {
    /// Map a DOM event type (and key, for keyboard events) to an intent
    pub fn from_dom(event_type: &str, key: Option<&str>) -> Option<Self> {
        match (event_type, key) {
            ("click", _) | ("touchend", _) | ("keyup", Some("ArrowUp")) => {
                Some(InputEvent::Primary)
            }
            ("contextmenu", _) | ("keyup", Some("ArrowDown")) => Some(InputEvent::Secondary),
            _ => None,
        }
    }

    /// Same mapping straight from a `web_sys::Event`
    pub fn from_event(event: &web_sys::Event) -> Option<Self> {
        use wasm_bindgen::JsCast;

        let key = event
            .dyn_ref::<web_sys::KeyboardEvent>()
            .map(|keyboard| keyboard.key());
        Self::from_dom(&event.type_(), key.as_deref())
    }
}

/// DOM listeners push, the game loop drains once per frame
#[derive(Debug, Clone, Default)]
pub struct InputQueue(Rc<RefCell<VecDeque<InputEvent>>>);

impl InputQueue {
    pub fn push(&self, event: InputEvent) {
        self.0.borrow_mut().push_back(event);
    }

    pub fn drain(&self) -> Vec<InputEvent> {
        self.0.borrow_mut().drain(..).collect()
    }
}

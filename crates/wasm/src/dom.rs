use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use scrollspy_core::{PageLayout, ScrollEvent, ScrollSpy};
use scrollspy_protocol::{NavUpdate, ScrollState, Section, SectionId, StyleToken};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, Window};

use crate::BridgeError;

const NAVBAR_SELECTOR: &str = "nav";

/// Measure the sections named in `layout_json` from the live DOM, subscribe
/// to window `scroll` and `resize`, and keep nav links, navbar, and
/// progress bar styled.
///
/// Listeners stay installed until the returned binding is detached or
/// freed. Offsets in the layout document are ignored; only ids, labels and
/// tuning are used.
#[wasm_bindgen]
pub fn attach(layout_json: &str) -> Result<ScrollSpyBinding, JsError> {
    Ok(ScrollSpyBinding::install(layout_json)?)
}

struct Page {
    window: Window,
    document: Document,
}

impl Page {
    fn current() -> Result<Self, BridgeError> {
        let window = web_sys::window().ok_or(BridgeError::NoDocument)?;
        let document = window.document().ok_or(BridgeError::NoDocument)?;
        Ok(Self { window, document })
    }

    fn scroll_state(&self) -> ScrollState {
        let scroll_y = self.window.scroll_y().unwrap_or_default();
        let viewport_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or_default();
        let document_height = self
            .document
            .document_element()
            .map_or(viewport_height, |root| f64::from(root.scroll_height()));
        ScrollState::new(scroll_y, viewport_height, document_height)
    }

    /// Current layout box of every declared section that exists in the page.
    fn measure(&self, declared: &[Section]) -> Vec<Section> {
        declared
            .iter()
            .filter_map(|section| {
                let element = self
                    .document
                    .get_element_by_id(section.id.as_str())
                    .and_then(|e| e.dyn_into::<HtmlElement>().ok());
                let Some(element) = element else {
                    web_sys::console::warn_1(
                        &format!("scrollspy: no element with id '{}'", section.id).into(),
                    );
                    return None;
                };
                Some(Section {
                    offset_top: f64::from(element.offset_top()),
                    offset_height: f64::from(element.offset_height()),
                    ..section.clone()
                })
            })
            .collect()
    }

    fn apply(&self, updates: &[NavUpdate], sections: &[Section]) {
        for update in updates {
            let result = match update {
                NavUpdate::SetActive { id } => self.highlight(id, sections),
                NavUpdate::SetScrolled { scrolled } => self.style_navbar(*scrolled),
                NavUpdate::SetProgress { progress } => self.move_progress(*progress),
            };
            if let Err(e) = result {
                web_sys::console::error_1(&format!("scrollspy: {e}").into());
            }
        }
    }

    /// Toggle the active class on nav links only; other anchors pointing
    /// at a section (e.g. the brand logo) keep their style.
    fn highlight(&self, active: &SectionId, sections: &[Section]) -> Result<(), BridgeError> {
        let class = StyleToken::NavLinkActive.css_class();
        let link_class = StyleToken::NavLinkIdle.css_class();
        for section in sections {
            let selector = format!("a.{link_class}[href=\"{}\"]", section.id.anchor());
            let links = self
                .document
                .query_selector_all(&selector)
                .map_err(|_| BridgeError::Dom { what: "nav link selector" })?;
            for i in 0..links.length() {
                let Some(link) = links.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
                else {
                    continue;
                };
                link.class_list()
                    .toggle_with_force(class, section.id == *active)
                    .map_err(|_| BridgeError::Dom { what: "nav link class" })?;
            }
        }
        Ok(())
    }

    fn style_navbar(&self, scrolled: bool) -> Result<(), BridgeError> {
        let Some(navbar) = self
            .document
            .query_selector(NAVBAR_SELECTOR)
            .map_err(|_| BridgeError::Dom { what: "navbar selector" })?
        else {
            return Ok(());
        };
        let classes = navbar.class_list();
        classes
            .remove_1(StyleToken::navbar(!scrolled).css_class())
            .map_err(|_| BridgeError::Dom { what: "navbar class" })?;
        classes
            .add_1(StyleToken::navbar(scrolled).css_class())
            .map_err(|_| BridgeError::Dom { what: "navbar class" })?;
        Ok(())
    }

    fn move_progress(&self, progress: f64) -> Result<(), BridgeError> {
        let Some(bar) = self
            .document
            .query_selector(&format!(".{}", StyleToken::ProgressBar.css_class()))
            .map_err(|_| BridgeError::Dom { what: "progress selector" })?
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            return Ok(());
        };
        bar.style()
            .set_property("transform", &format!("scaleX({progress})"))
            .map_err(|_| BridgeError::Dom { what: "progress transform" })
    }
}

/// Shared by the listeners; they hold it weakly so dropping the binding
/// frees everything.
struct Context {
    page: Page,
    declared: Vec<Section>,
    spy: RefCell<ScrollSpy>,
    frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    frame_handle: Cell<Option<i32>>,
    last_frame_ms: Cell<Option<f64>>,
}

impl Context {
    fn measured(&self) -> Vec<Section> {
        self.spy.borrow().tracker().registry().sections().to_vec()
    }

    fn dispatch(&self, event: ScrollEvent) {
        let updates = self.spy.borrow_mut().handle(event);
        if !updates.is_empty() {
            self.page.apply(&updates, &self.measured());
        }
        if self.spy.borrow().is_animating() {
            self.request_frame();
        }
    }

    fn request_frame(&self) {
        if self.frame_handle.get().is_some() {
            return;
        }
        let frame = self.frame.borrow();
        let Some(callback) = frame.as_ref() else {
            return;
        };
        match self
            .page
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.frame_handle.set(Some(handle)),
            Err(_) => web_sys::console::error_1(&"scrollspy: requestAnimationFrame failed".into()),
        }
    }

    fn on_frame(&self, timestamp_ms: f64) {
        self.frame_handle.set(None);
        let dt = self
            .last_frame_ms
            .replace(Some(timestamp_ms))
            .map_or(0.0, |last| (timestamp_ms - last) / 1000.0);
        self.dispatch(ScrollEvent::Tick { dt });
        if self.frame_handle.get().is_none() {
            self.last_frame_ms.set(None);
        }
    }

    fn relayout(&self) {
        let sections = self.page.measure(&self.declared);
        let scroll = self.page.scroll_state();
        self.dispatch(ScrollEvent::Relayout { sections, scroll });
        self.report_issues();
    }

    fn report_issues(&self) {
        for message in crate::issue_messages(&self.spy.borrow()) {
            web_sys::console::warn_1(&message.into());
        }
    }
}

/// A window event listener, removed again when dropped.
struct Listener {
    window: Window,
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl Listener {
    fn add(
        window: &Window,
        event: &'static str,
        callback: Closure<dyn FnMut()>,
    ) -> Result<Self, BridgeError> {
        window
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|_| BridgeError::Dom { what: "window listener" })?;
        Ok(Self {
            window: window.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Live subscription of a scroll spy to the browser window.
///
/// Dropping it (or calling `free()` from JavaScript) removes the listeners
/// and cancels any pending animation frame.
#[wasm_bindgen]
pub struct ScrollSpyBinding {
    context: Rc<Context>,
    listeners: Vec<Listener>,
}

impl ScrollSpyBinding {
    fn install(layout_json: &str) -> Result<Self, BridgeError> {
        let layout = PageLayout::from_json(layout_json.as_bytes())?;
        let page = Page::current()?;
        let declared = layout.sections.clone();
        let measured = page.measure(&declared);
        let spy = ScrollSpy::from_layout(PageLayout {
            sections: measured,
            ..layout
        });

        let context = Rc::new(Context {
            page,
            declared,
            spy: RefCell::new(spy),
            frame: RefCell::new(None),
            frame_handle: Cell::new(None),
            last_frame_ms: Cell::new(None),
        });

        let weak = Rc::downgrade(&context);
        *context.frame.borrow_mut() = Some(Closure::new(move |ts: f64| {
            if let Some(context) = weak.upgrade() {
                context.on_frame(ts);
            }
        }));

        let on_scroll = listener(&context, |context| {
            let scroll = context.page.scroll_state();
            context.dispatch(ScrollEvent::Scroll(scroll));
        });
        let on_resize = listener(&context, Context::relayout);

        // A failed second add drops the first listener, which unregisters it.
        let window = &context.page.window;
        let scroll = Listener::add(window, "scroll", on_scroll)?;
        let resize = Listener::add(window, "resize", on_resize)?;

        context.report_issues();
        context.page.apply(&context.spy.borrow().snapshot(), &context.measured());
        context.dispatch(ScrollEvent::Scroll(context.page.scroll_state()));

        Ok(Self {
            context,
            listeners: vec![scroll, resize],
        })
    }
}

fn listener(context: &Rc<Context>, handler: fn(&Context)) -> Closure<dyn FnMut()> {
    let weak: Weak<Context> = Rc::downgrade(context);
    Closure::new(move || {
        if let Some(context) = weak.upgrade() {
            handler(&context);
        }
    })
}

#[wasm_bindgen]
impl ScrollSpyBinding {
    pub fn active(&self) -> String {
        self.context.spy.borrow().active().to_string()
    }

    /// Re-measure sections after content changed height (images, async data).
    pub fn refresh(&self) {
        self.context.relayout();
    }

    /// Remove the listeners. Safe to call more than once.
    pub fn detach(&mut self) {
        self.listeners.clear();
        if let Some(handle) = self.context.frame_handle.take() {
            let _ = self.context.page.window.cancel_animation_frame(handle);
        }
        self.context.frame.borrow_mut().take();
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }
}

impl Drop for ScrollSpyBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

//! Browser host for the snake trail: canvas surface, DOM listeners and the animation frame loop.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::DVec2;
use snake_trail_core::{ConfigError, TrailAnimator, TrailConfig, TrailHost};
use snake_trail_platform::{Clock, FrameHandle, FrameScheduler, InputSource};
use thiserror::Error;
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent,
    Window,
};

pub mod logging;
mod surface;

pub use crate::surface::{css_px, window_viewport, CanvasSurface, WebClock};

pub const CANVAS_ID: &str = "snake-canvas";
pub const CONFIG_ID: &str = "snake-trail-config";
/// Delay between page-ready and mounting, so the canvas has been laid out.
pub const START_DELAY_MS: i32 = 100;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("no global window")]
    NoWindow,
    #[error("no document on window")]
    NoDocument,
    #[error("element #{0} not found")]
    MissingElement(String),
    #[error("element #{0} is not a canvas")]
    NotCanvas(String),
    #[error("canvas has no 2d context")]
    NoContext,
    #[error("javascript error: {0}")]
    Js(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        WebError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

// Public app entry ----------------
/// Mount the trail shortly after the DOM is ready and tear it down on unload.
pub fn run_app() -> Result<(), WebError> {
    let window = web_sys::window().ok_or(WebError::NoWindow)?;
    let document = window.document().ok_or(WebError::NoDocument)?;
    let mounted: Rc<RefCell<Option<SnakeTrail>>> = Rc::new(RefCell::new(None));

    let boot = {
        let mounted = Rc::clone(&mounted);
        let window = window.clone();
        move || schedule_mount(&window, Rc::clone(&mounted))
    };
    if document.ready_state() == "loading" {
        let once = AddEventListenerOptions::new();
        once.set_once(true);
        let on_ready = Closure::<dyn FnMut()>::new(move || {
            if let Err(err) = boot() {
                error!("failed to schedule snake trail: {err}");
            }
        });
        document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            on_ready.as_ref().unchecked_ref(),
            &once,
        )?;
        // Page-lifetime listener.
        on_ready.forget();
    } else {
        boot()?;
    }

    let on_unload = Closure::<dyn FnMut()>::new(move || {
        let trail = mounted.borrow_mut().take();
        if let Some(mut trail) = trail {
            trail.destroy();
        }
    });
    window.add_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref())?;
    on_unload.forget();
    Ok(())
}

fn schedule_mount(window: &Window, mounted: Rc<RefCell<Option<SnakeTrail>>>) -> Result<(), WebError> {
    let mount = Closure::once_into_js(move || {
        let config = page_config();
        match SnakeTrail::mount(CANVAS_ID, config) {
            Ok(trail) => *mounted.borrow_mut() = Some(trail),
            // The rest of the page keeps working without the trail.
            Err(err) => error!("snake trail disabled: {err}"),
        }
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        mount.unchecked_ref(),
        START_DELAY_MS,
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_script_type(script_type: &str) -> Self {
        if script_type.trim().eq_ignore_ascii_case("application/toml") {
            ConfigFormat::Toml
        } else {
            ConfigFormat::Json
        }
    }

    pub fn parse(self, text: &str) -> Result<TrailConfig, ConfigError> {
        match self {
            ConfigFormat::Toml => TrailConfig::from_toml_str(text),
            ConfigFormat::Json => TrailConfig::from_json_str(text),
        }
    }
}

/// Optional inline config, falling back to defaults when absent or invalid.
fn page_config() -> TrailConfig {
    let Some(element) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CONFIG_ID))
    else {
        return TrailConfig::default();
    };
    let format = ConfigFormat::from_script_type(&element.get_attribute("type").unwrap_or_default());
    let text = element.text_content().unwrap_or_default();
    match format.parse(&text) {
        Ok(config) => {
            info!("loaded {:?} config from #{}", format, CONFIG_ID);
            config
        }
        Err(err) => {
            warn!("ignoring #{CONFIG_ID}: {err}");
            TrailConfig::default()
        }
    }
}

type WebHost = TrailHost<CanvasSurface, FrameLoop, DomInput>;
type HostHandle = Weak<RefCell<WebHost>>;

/// Runs `f` against the host if it is still alive and not already borrowed.
fn with_host(host: &HostHandle, f: impl FnOnce(&mut WebHost)) {
    let Some(host) = host.upgrade() else {
        return;
    };
    match host.try_borrow_mut() {
        Ok(mut host) => f(&mut host),
        Err(_) => warn!("snake trail busy, dropping event"),
    };
}

/// `requestAnimationFrame` scheduler; the callback feeds frames back to the host.
struct FrameLoop {
    window: Window,
    callback: Closure<dyn FnMut()>,
}

impl FrameLoop {
    fn new(window: Window, host: HostHandle) -> Self {
        let callback = Closure::<dyn FnMut()>::new(move || {
            with_host(&host, |host| host.frame(WebClock.now_ms()));
        });
        Self { window, callback }
    }
}

impl FrameScheduler for FrameLoop {
    fn request_frame(&mut self) -> snake_trail_platform::Result<FrameHandle> {
        let handle = self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .map_err(WebError::from)?;
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> snake_trail_platform::Result<()> {
        self.window
            .cancel_animation_frame(handle)
            .map_err(WebError::from)?;
        Ok(())
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        passive: Option<bool>,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, WebError> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        match passive {
            Some(passive) => {
                let options = AddEventListenerOptions::new();
                options.set_passive(passive);
                target.add_event_listener_with_callback_and_add_event_listener_options(
                    kind,
                    closure.as_ref().unchecked_ref(),
                    &options,
                )?
            }
            None => target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?,
        }
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn detach(self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            warn!("failed to remove {} listener: {err:?}", self.kind);
        }
    }
}

/// Mouse, touch, resize and visibility listeners forwarding to the host.
struct DomInput {
    window: Window,
    document: Document,
    host: HostHandle,
    listeners: Vec<Listener>,
}

impl DomInput {
    fn new(window: Window, document: Document, host: HostHandle) -> Self {
        Self {
            window,
            document,
            host,
            listeners: Vec::new(),
        }
    }

    fn attach_all(&self) -> Result<Vec<Listener>, WebError> {
        let mut listeners = Vec::new();

        let host = self.host.clone();
        listeners.push(Listener::attach(&self.document, "mousemove", None, move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let position = DVec2::new(event.client_x() as f64, event.client_y() as f64);
                with_host(&host, |host| host.pointer_moved(position, WebClock.now_ms()));
            }
        })?);

        for kind in ["touchstart", "touchmove"] {
            let host = self.host.clone();
            listeners.push(Listener::attach(&self.document, kind, Some(false), move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let touch = event
                    .touches()
                    .get(0)
                    .map(|touch| DVec2::new(touch.client_x() as f64, touch.client_y() as f64));
                with_host(&host, |host| {
                    if host.touch_moved(touch, WebClock.now_ms()) {
                        event.prevent_default();
                    }
                });
            })?);
        }

        let host = self.host.clone();
        let window = self.window.clone();
        listeners.push(Listener::attach(&self.window, "resize", None, move |_| {
            let viewport = match window_viewport(&window) {
                Ok(viewport) => viewport,
                Err(err) => {
                    warn!("failed to read viewport: {err}");
                    return;
                }
            };
            with_host(&host, |host| {
                if let Err(err) = host.resize(viewport) {
                    warn!("failed to resize snake canvas: {err}");
                }
            });
        })?);

        let host = self.host.clone();
        let document = self.document.clone();
        listeners.push(Listener::attach(&self.document, "visibilitychange", None, move |_| {
            let hidden = document.hidden();
            with_host(&host, |host| host.visibility_changed(hidden));
        })?);

        Ok(listeners)
    }
}

impl InputSource for DomInput {
    fn start(&mut self) -> snake_trail_platform::Result<()> {
        if self.listeners.is_empty() {
            self.listeners = self.attach_all()?;
        }
        Ok(())
    }

    fn stop(&mut self) -> snake_trail_platform::Result<()> {
        for listener in self.listeners.drain(..) {
            listener.detach();
        }
        Ok(())
    }
}

/// A mounted, running snake trail. Dropping it tears it down like `destroy`.
pub struct SnakeTrail {
    host: Rc<RefCell<WebHost>>,
}

impl SnakeTrail {
    pub fn mount(canvas_id: &str, config: TrailConfig) -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        let document = window.document().ok_or(WebError::NoDocument)?;
        let canvas = find_canvas(&document, canvas_id)?;
        let viewport = window_viewport(&window)?;
        let surface = CanvasSurface::attach(canvas, viewport)?;
        surface.log_current_layout("initial mount");
        let animator = TrailAnimator::new(config, viewport, WebClock.now_ms())?;

        let host = Rc::new_cyclic(|handle: &HostHandle| {
            RefCell::new(TrailHost::new(
                animator,
                surface,
                FrameLoop::new(window.clone(), handle.clone()),
                DomInput::new(window.clone(), document.clone(), handle.clone()),
            ))
        });
        host.borrow_mut()
            .start()
            .map_err(|err| WebError::Js(err.to_string()))?;
        info!("Snake trail mounted on #{}", canvas_id);
        Ok(Self { host })
    }

    pub fn pause(&self) {
        self.host.borrow_mut().pause();
    }

    pub fn resume(&self) {
        self.host.borrow_mut().resume();
    }

    /// Stops the loop and detaches every listener. Safe to call while paused or twice.
    pub fn destroy(&mut self) {
        self.host.borrow_mut().destroy();
    }
}

impl Drop for SnakeTrail {
    fn drop(&mut self) {
        if let Ok(mut host) = self.host.try_borrow_mut() {
            host.destroy();
        }
    }
}

fn find_canvas(document: &Document, canvas_id: &str) -> Result<HtmlCanvasElement, WebError> {
    document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| WebError::MissingElement(canvas_id.to_string()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| WebError::NotCanvas(canvas_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_type_selects_format() {
        assert_eq!(ConfigFormat::from_script_type("application/toml"), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_script_type(" Application/TOML "), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_script_type("application/json"), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_script_type(""), ConfigFormat::Json);
    }

    #[test]
    fn inline_configs_parse_in_both_formats() {
        let toml = ConfigFormat::Toml.parse("length = 9\n").unwrap();
        assert_eq!(toml.length, 9);
        let json = ConfigFormat::Json.parse(r#"{"length": 4}"#).unwrap();
        assert_eq!(json.length, 4);
        assert!(ConfigFormat::Json.parse("length = 9").is_err());
    }

    #[test]
    fn config_errors_surface_as_web_errors() {
        let err: WebError = ConfigFormat::Json.parse(r#"{"length": 0}"#).unwrap_err().into();
        assert!(err.to_string().contains("length"));
    }
}

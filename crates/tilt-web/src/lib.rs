#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;
use tilt_core::constants::BOOTSTRAP_ATTRIBUTE;
use tilt_core::{Host, TiltController, TiltError, TiltOptions, TiltRegistry};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

mod dom;
mod events;
mod frame;

#[cfg(test)]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

thread_local! {
    static REGISTRY: RefCell<TiltRegistry<web::HtmlElement>> = RefCell::new(TiltRegistry::new());
}

fn to_js(e: TiltError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn target_element(value: JsValue) -> Result<web::HtmlElement, TiltError> {
    value
        .dyn_into::<web::HtmlElement>()
        .map_err(|v| TiltError::InvalidTarget(format!("{:?}", v)))
}

/// Accepts `undefined`/`null`, a JSON string, or a plain object.
fn options_from_js(options: &JsValue) -> Result<TiltOptions, TiltError> {
    if options.is_undefined() || options.is_null() {
        return Ok(TiltOptions::new());
    }
    if let Some(text) = options.as_string() {
        return TiltOptions::from_json(&text);
    }
    let text: String = js_sys::JSON::stringify(options)
        .map_err(dom::host_err)?
        .into();
    TiltOptions::from_json(&text)
}

fn host_for(element: &web::HtmlElement) -> Result<Host, TiltError> {
    let window = web::window().ok_or_else(|| TiltError::Host("no window".into()))?;
    let surface = Rc::new(dom::DomSurface::new(element.clone()));
    Ok(Host {
        surface: surface.clone(),
        events: Rc::new(events::DomEvents::new(element.clone(), window.clone())),
        frames: Rc::new(frame::AnimationFrames::new(window.clone())),
        timers: Rc::new(frame::WindowTimers::new(window)),
        changes: Some(surface),
    })
}

fn html_elements(nodes: impl IntoIterator<Item = JsValue>) -> Vec<web::HtmlElement> {
    nodes
        .into_iter()
        .filter_map(|node| match node.dyn_into::<web::HtmlElement>() {
            Ok(el) => Some(el),
            Err(other) => {
                log::warn!("[tilt] skipping non-HTML target: {:?}", other);
                None
            }
        })
        .collect()
}

fn node_list(nodes: &web::NodeList) -> Vec<JsValue> {
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .map(JsValue::from)
        .collect()
}

/// Accepts a selector string, a single element, a NodeList or an Array.
fn targets_from_js(
    document: &web::Document,
    targets: JsValue,
) -> Result<Vec<web::HtmlElement>, TiltError> {
    if let Some(selector) = targets.as_string() {
        let nodes = document.query_selector_all(&selector).map_err(dom::host_err)?;
        return Ok(html_elements(node_list(&nodes)));
    }
    if let Some(nodes) = targets.dyn_ref::<web::NodeList>() {
        return Ok(html_elements(node_list(nodes)));
    }
    if js_sys::Array::is_array(&targets) {
        return Ok(html_elements(js_sys::Array::from(&targets).iter()));
    }
    Ok(vec![target_element(targets)?])
}

fn init_targets(
    elements: Vec<web::HtmlElement>,
    options: &TiltOptions,
) -> Result<usize, TiltError> {
    REGISTRY.with(|r| r.borrow_mut().init(elements, options, host_for))
}

fn bootstrap() -> anyhow::Result<usize> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let selector = JsValue::from_str(&format!("[{BOOTSTRAP_ATTRIBUTE}]"));
    let elements = targets_from_js(&document, selector)?;
    Ok(init_targets(elements, &TiltOptions::new())?)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    match bootstrap() {
        Ok(n) => log::info!("[tilt] bound {} element(s)", n),
        Err(e) => log::error!("[tilt] bootstrap error: {:?}", e),
    }
    Ok(())
}

/// Binds every target that has no controller yet. `targets` is a selector,
/// an element, a NodeList or an Array of elements. Returns the number of newly
/// bound elements.
#[wasm_bindgen(js_name = initTilt)]
pub fn init(targets: JsValue, options: JsValue) -> Result<usize, JsValue> {
    let document = dom::window_document()
        .ok_or_else(|| to_js(TiltError::Host("no document".into())))?;
    let options = options_from_js(&options).map_err(to_js)?;
    let elements = targets_from_js(&document, targets).map_err(to_js)?;
    init_targets(elements, &options).map_err(to_js)
}

/// Tears down the element's controller, if it has one.
#[wasm_bindgen(js_name = destroyTilt)]
pub fn destroy(element: JsValue) -> bool {
    match element.dyn_into::<web::HtmlElement>() {
        Ok(el) => REGISTRY.with(|r| r.borrow_mut().destroy(&el)),
        Err(_) => false,
    }
}

/// Handle to one element's controller, exported to JavaScript.
#[wasm_bindgen]
pub struct Tilt {
    element: web::HtmlElement,
    controller: TiltController,
}

#[wasm_bindgen]
impl Tilt {
    /// Binds `element`, or returns a handle to its existing controller.
    #[wasm_bindgen(constructor)]
    pub fn new(element: JsValue, options: JsValue) -> Result<Tilt, JsValue> {
        let element = target_element(element).map_err(to_js)?;
        let options = options_from_js(&options).map_err(to_js)?;
        REGISTRY
            .with(|r| -> Result<TiltController, TiltError> {
                let mut registry = r.borrow_mut();
                if let Some(existing) = registry.get(&element) {
                    return Ok(existing.clone());
                }
                let controller = TiltController::new(host_for(&element)?, &options)?;
                registry.insert(element.clone(), controller.clone());
                Ok(controller)
            })
            .map(|controller| Tilt {
                element,
                controller,
            })
            .map_err(to_js)
    }

    pub fn reset(&self) {
        self.controller.reset();
    }

    /// Current `{tiltX, tiltY, percentageX, percentageY, angle}`.
    pub fn values(&self) -> Result<JsValue, JsValue> {
        let text = serde_json::to_string(&self.controller.values())
            .map_err(|e| to_js(TiltError::from(e)))?;
        js_sys::JSON::parse(&text)
    }

    /// Tears down this handle's controller. The element's registration is
    /// dropped only while it still points at that controller.
    pub fn destroy(&self) {
        REGISTRY.with(|r| r.borrow_mut().destroy_if(&self.element, &self.controller));
    }
}

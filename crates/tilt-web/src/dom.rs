use tilt_core::constants::{CHANGE_EVENT, GLARE_INNER_CLASS, GLARE_WRAPPER_CLASS};
use tilt_core::{
    ChangeSink, Geometry, GlareLayer, GlareState, Surface, TiltError, TiltValues, Transform,
    Transition,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn host_err(e: JsValue) -> TiltError {
    TiltError::Host(format!("{:?}", e))
}

#[inline]
fn set_style(el: &web::HtmlElement, name: &str, value: &str) {
    _ = el.style().set_property(name, value);
}

fn set_styles(el: &web::HtmlElement, props: &[(&str, &str)]) {
    for (name, value) in props {
        set_style(el, name, value);
    }
}

fn create_div(document: &web::Document, class: &str) -> Result<web::HtmlElement, TiltError> {
    let el = document.create_element("div").map_err(host_err)?;
    el.class_list().add_1(class).map_err(host_err)?;
    el.dyn_into::<web::HtmlElement>()
        .map_err(|_| TiltError::Host("created div is not an HtmlElement".into()))
}

fn transition_text(transition: Option<&Transition>) -> String {
    transition.map(|t| t.to_string()).unwrap_or_default()
}

/// A tilted DOM element: geometry, `data-tilt-*` attributes and inline style.
pub struct DomSurface {
    element: web::HtmlElement,
}

impl DomSurface {
    pub fn new(element: web::HtmlElement) -> Self {
        Self { element }
    }
}

impl Surface for DomSurface {
    fn measure(&self) -> Geometry {
        let rect = self.element.get_bounding_client_rect();
        Geometry::new(
            rect.left(),
            rect.top(),
            self.element.offset_width() as f64,
            self.element.offset_height() as f64,
        )
    }

    fn declared_override(&self, attribute: &str) -> Option<String> {
        self.element.get_attribute(attribute)
    }

    fn write_transform(&self, transform: &Transform) {
        set_style(&self.element, "transform", &transform.to_string());
    }

    fn write_transition(&self, transition: Option<&Transition>) {
        set_style(&self.element, "transition", &transition_text(transition));
    }

    fn hint_will_change(&self) {
        set_style(&self.element, "will-change", "transform");
    }

    fn create_glare(&self) -> Result<Box<dyn GlareLayer>, TiltError> {
        let document = self
            .element
            .owner_document()
            .ok_or_else(|| TiltError::Host("element has no owner document".into()))?;
        let wrapper = create_div(&document, GLARE_WRAPPER_CLASS)?;
        let inner = create_div(&document, GLARE_INNER_CLASS)?;
        wrapper.append_child(&inner).map_err(host_err)?;
        self.element.append_child(&wrapper).map_err(host_err)?;

        set_styles(
            &wrapper,
            &[
                ("position", "absolute"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("overflow", "hidden"),
            ],
        );
        set_styles(
            &inner,
            &[
                ("position", "absolute"),
                ("top", "50%"),
                ("left", "50%"),
                ("pointer-events", "none"),
                (
                    "background-image",
                    "linear-gradient(0deg, rgba(255,255,255,0) 0%, rgba(255,255,255,1) 100%)",
                ),
                ("transform-origin", "0% 0%"),
            ],
        );
        Ok(Box::new(DomGlare { inner }))
    }

    fn find_glare(&self) -> Option<Box<dyn GlareLayer>> {
        let _wrapper = self
            .element
            .query_selector(&format!(".{GLARE_WRAPPER_CLASS}"))
            .ok()
            .flatten()?;
        let inner = self
            .element
            .query_selector(&format!(".{GLARE_INNER_CLASS}"))
            .ok()
            .flatten()?
            .dyn_into::<web::HtmlElement>()
            .ok()?;
        Some(Box::new(DomGlare { inner }))
    }
}

impl ChangeSink for DomSurface {
    fn tilt_changed(&self, values: &TiltValues) {
        let detail = serde_json::to_string(values)
            .ok()
            .and_then(|text| js_sys::JSON::parse(&text).ok())
            .unwrap_or(JsValue::NULL);
        let init = web::CustomEventInit::new();
        init.set_detail(&detail);
        match web::CustomEvent::new_with_event_init_dict(CHANGE_EVENT, &init) {
            Ok(event) => {
                _ = self.element.dispatch_event(&event);
            }
            Err(e) => log::warn!("[tilt] could not build {CHANGE_EVENT}: {:?}", e),
        }
    }
}

/// The inner gradient layer of the glare markup.
struct DomGlare {
    inner: web::HtmlElement,
}

impl GlareLayer for DomGlare {
    fn set_size(&self, side_px: f64) {
        let px = format!("{side_px}px");
        set_styles(&self.inner, &[("width", px.as_str()), ("height", px.as_str())]);
    }

    fn write(&self, state: &GlareState) {
        set_style(&self.inner, "transform", &state.transform_css());
        set_style(&self.inner, "opacity", &state.opacity.to_string());
    }

    fn write_transition(&self, transition: Option<&Transition>) {
        set_style(&self.inner, "transition", &transition_text(transition));
    }
}

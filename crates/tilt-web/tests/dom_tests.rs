// Browser smoke tests: `wasm-pack test --headless --firefox crates/tilt-web`

#![cfg(target_arch = "wasm32")]

use tilt_web::{destroy, init, Tilt};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys as web;

wasm_bindgen_test_configure!(run_in_browser);

fn card(attrs: &[(&str, &str)]) -> web::HtmlElement {
    let document = web::window().unwrap().document().unwrap();
    let el = document.create_element("div").unwrap();
    for (name, value) in attrs {
        el.set_attribute(name, value).unwrap();
    }
    el.set_attribute("style", "width:200px;height:100px;position:relative")
        .unwrap();
    document.body().unwrap().append_child(&el).unwrap();
    el.dyn_into::<web::HtmlElement>().unwrap()
}

#[wasm_bindgen_test]
fn rejects_non_elements() {
    assert!(Tilt::new(JsValue::from_str("#card"), JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn creates_glare_markup_from_declared_attribute() {
    let el = card(&[("data-tilt-glare", "")]);
    let tilt = Tilt::new(el.clone().into(), JsValue::UNDEFINED).unwrap();
    assert!(el.query_selector(".js-tilt-glare").unwrap().is_some());
    assert!(el.query_selector(".js-tilt-glare-inner").unwrap().is_some());
    tilt.destroy();
}

#[wasm_bindgen_test]
fn missing_prerendered_glare_is_an_error() {
    let el = card(&[]);
    let options = JsValue::from_str(r#"{"glare": true, "glare-prerender": true}"#);
    assert!(Tilt::new(el.into(), options).is_err());
}

#[wasm_bindgen_test]
fn reset_writes_neutral_transform_and_destroy_is_repeatable() {
    let el = card(&[("data-tilt-perspective", "500")]);
    let tilt = Tilt::new(el.clone().into(), JsValue::UNDEFINED).unwrap();
    tilt.reset();
    let transform = el.style().get_property_value("transform").unwrap();
    assert!(transform.contains("perspective(500px)"));
    tilt.destroy();
    tilt.destroy();
}

#[wasm_bindgen_test]
fn init_accepts_an_element_or_an_array() {
    let single = card(&[]);
    assert_eq!(init(single.clone().into(), JsValue::UNDEFINED).unwrap(), 1);
    assert_eq!(init(single.clone().into(), JsValue::UNDEFINED).unwrap(), 0);

    let (a, b) = (card(&[]), card(&[]));
    let list = js_sys::Array::of3(&a, &b, &single);
    assert_eq!(init(list.into(), JsValue::UNDEFINED).unwrap(), 2);

    assert!(destroy(single.into()));
    assert!(destroy(a.into()));
    assert!(destroy(b.into()));
}

#[wasm_bindgen_test]
fn init_by_selector_skips_non_html_matches() {
    let el = card(&[("class", "tilt-sel")]);
    let document = web::window().unwrap().document().unwrap();
    let svg = document
        .create_element_ns(Some("http://www.w3.org/2000/svg"), "svg")
        .unwrap();
    svg.set_attribute("class", "tilt-sel").unwrap();
    document.body().unwrap().append_child(&svg).unwrap();

    assert_eq!(init(JsValue::from_str(".tilt-sel"), JsValue::UNDEFINED).unwrap(), 1);
    assert!(destroy(el.into()));
}

#[wasm_bindgen_test]
fn stale_handle_leaves_the_current_controller_bound() {
    let el = card(&[]);
    let old = Tilt::new(el.clone().into(), JsValue::UNDEFINED).unwrap();
    assert!(destroy(el.clone().into()));

    let current = Tilt::new(el.clone().into(), JsValue::UNDEFINED).unwrap();
    old.destroy();
    assert_eq!(init(el.clone().into(), JsValue::UNDEFINED).unwrap(), 0);

    current.destroy();
    assert_eq!(init(el.clone().into(), JsValue::UNDEFINED).unwrap(), 1);
    assert!(destroy(el.into()));
}

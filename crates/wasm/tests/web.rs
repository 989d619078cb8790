//! Browser tests for the DOM binding.
//!
//! Run with: wasm-pack test --headless --chrome crates/wasm

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

const LAYOUT: &str = r#"{
    "sections": [
        {"id": "home", "label": "Home", "offset_top": 0, "offset_height": 0},
        {"id": "about", "label": "Sobre", "offset_top": 0, "offset_height": 0}
    ]
}"#;

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("browser document")
}

fn element(document: &Document, tag: &str, class: &str, href: Option<&str>) -> Element {
    let element = document.create_element(tag).expect("element created");
    element.set_class_name(class);
    if let Some(href) = href {
        element.set_attribute("href", href).expect("href set");
    }
    element
}

/// Navbar with a brand link and two nav links, followed by two tall sections.
fn mount_page(document: &Document) -> Element {
    let root = element(document, "div", "", None);
    let nav = element(document, "nav", "custom-nav", None);
    for (class, href) in [
        ("navbar-brand", "#home"),
        ("nav-link-custom", "#home"),
        ("nav-link-custom", "#about"),
    ] {
        nav.append_child(&element(document, "a", class, Some(href)))
            .expect("link mounted");
    }
    root.append_child(&nav).expect("nav mounted");
    root.append_child(&element(document, "div", "progress-bar", None))
        .expect("progress bar mounted");
    for id in ["home", "about"] {
        let section = element(document, "section", "", None);
        section.set_id(id);
        section
            .dyn_ref::<HtmlElement>()
            .expect("html element")
            .style()
            .set_property("height", "900px")
            .expect("height set");
        root.append_child(&section).expect("section mounted");
    }
    document
        .body()
        .expect("body")
        .append_child(&root)
        .expect("page mounted");
    root
}

fn has_class(document: &Document, selector: &str, class: &str) -> bool {
    document
        .query_selector(selector)
        .expect("valid selector")
        .expect("element present")
        .class_list()
        .contains(class)
}

#[wasm_bindgen_test]
fn attach_marks_nav_link_but_not_brand() {
    let document = document();
    let page = mount_page(&document);

    let Ok(mut binding) = scrollspy_wasm::attach(LAYOUT) else {
        panic!("attach failed");
    };
    assert_eq!(binding.active(), "home");
    assert!(has_class(&document, "a.nav-link-custom[href=\"#home\"]", "active"));
    assert!(!has_class(&document, "a.nav-link-custom[href=\"#about\"]", "active"));
    assert!(!has_class(&document, "a.navbar-brand", "active"));

    binding.detach();
    assert!(!binding.is_attached());
    page.remove();
}

#[wasm_bindgen_test]
fn detach_is_idempotent_and_drop_is_safe_afterwards() {
    let document = document();
    let page = mount_page(&document);

    let Ok(mut binding) = scrollspy_wasm::attach(LAYOUT) else {
        panic!("attach failed");
    };
    assert!(binding.is_attached());
    binding.detach();
    binding.detach();
    drop(binding);

    let window = web_sys::window().expect("window");
    let event = web_sys::Event::new("scroll").expect("event");
    window.dispatch_event(&event).expect("scroll dispatched");
    page.remove();
}

//! HTML for an assembled [`Page`], written with maud.
//!
//! Inlined text is trusted: it is the user's own markdown/HTML from their own
//! folder, so it goes in unescaped. Everything else is escaped by maud.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::contract::PageRenderer;
use crate::error::BoxError;
use crate::page::{Asset, Page, Project};

const BASE_CSS: &str = "body{margin:0 auto;max-width:60rem;padding:2rem;font-family:Georgia,serif;line-height:1.5}\
section.project{margin-bottom:4rem}\
figure{margin:0 0 1rem}\
figure img{max-width:100%;height:auto;display:block}";

/// Default page renderer. Built once at startup and shared by all tasks.
#[derive(Debug, Clone)]
pub struct MaudRenderer {
    base_css: String,
}

impl Default for MaudRenderer {
    fn default() -> Self {
        Self {
            base_css: BASE_CSS.to_string(),
        }
    }
}

impl MaudRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in base stylesheet.
    pub fn with_base_css(base_css: impl Into<String>) -> Self {
        Self {
            base_css: base_css.into(),
        }
    }

    fn document(&self, page: &Page) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (page.title) }
                    style { (PreEscaped(&self.base_css)) }
                    @for css in &page.css {
                        link rel="stylesheet" href=(css.url);
                    }
                }
                body {
                    header { h1 { (page.title) } }
                    main {
                        @for project in page.projects.values() {
                            (render_project(project))
                        }
                    }
                    @for js in &page.js {
                        script src=(js.url) {}
                    }
                }
            }
        }
    }
}

fn render_project(project: &Project) -> Markup {
    html! {
        section.project id=[(!project.tag.is_empty()).then_some(&project.tag)] {
            @for asset in &project.assets {
                (render_asset(asset))
            }
        }
    }
}

fn render_asset(asset: &Asset) -> Markup {
    html! {
        @if asset.is_image {
            figure {
                img src=(asset.url) alt=(asset.filename) loading="lazy";
            }
        } @else {
            div.text { (PreEscaped(&asset.content)) }
        }
    }
}

impl PageRenderer for MaudRenderer {
    fn render(&self, page: &Page) -> Result<String, BoxError> {
        Ok(self.document(page).into_string())
    }
}

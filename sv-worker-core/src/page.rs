//! Page model and the grouping step that turns a flat list of assets into
//! a [`Page`].
//!
//! Where an asset ends up is decided by its mime type alone, through the
//! closed set of [`Destination`]s. Adding a mime type is one arm in
//! [`Destination::for_mime`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Mime marker for text that gets inlined into the page body.
pub const INJECT_MIME: &str = "text/inject";

/// One file of the user's folder, ready to be placed on the page.
///
/// Linked assets carry a `url` and no `content`; inlined ones the reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub url: String,
    pub content: String,
    pub mime: String,
    pub tag: String,
    pub filename: String,
    pub order: i64,
    pub is_image: bool,
}

/// Assets sharing a tag, rendered as one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub tag: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub title: String,
    pub projects: BTreeMap<String, Project>,
    pub css: Vec<Asset>,
    pub js: Vec<Asset>,
}

/// Where an asset is placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    ImageInGroup,
    TextInGroup,
    GlobalCss,
    GlobalJs,
    Drop,
}

impl Destination {
    pub fn for_mime(mime: &str) -> Self {
        match mime {
            "image/png" | "image/jpeg" | "image/jpg" | "image/gif" => Destination::ImageInGroup,
            INJECT_MIME => Destination::TextInGroup,
            "text/css" => Destination::GlobalCss,
            "application/javascript" | "text/javascript" => Destination::GlobalJs,
            _ => Destination::Drop,
        }
    }
}

/// Group assets into projects by tag and collect global stylesheets and
/// scripts.
///
/// Project assets are stably sorted by order; projects left empty are
/// removed. Stylesheets and scripts keep the order they were given in.
pub fn assemble_page(assets: Vec<Asset>) -> Page {
    let mut page = Page::default();

    for mut asset in assets {
        let project = page
            .projects
            .entry(asset.tag.clone())
            .or_insert_with(|| Project {
                tag: asset.tag.clone(),
                assets: Vec::new(),
            });

        match Destination::for_mime(&asset.mime) {
            Destination::ImageInGroup => {
                asset.is_image = true;
                project.assets.push(asset);
            }
            Destination::TextInGroup => project.assets.push(asset),
            Destination::GlobalCss => page.css.push(asset),
            Destination::GlobalJs => page.js.push(asset),
            Destination::Drop => {}
        }
    }

    page.projects.retain(|_, project| !project.assets.is_empty());
    for project in page.projects.values_mut() {
        project.assets.sort_by_key(|a| a.order);
    }

    page
}

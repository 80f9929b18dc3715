use std::cmp::Ordering;

use crate::loader::LoadedModules;

pub const HOME_MODULE: &str = "home";

#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub name: String,
    pub title: String,
    pub href: String,
    pub order: Option<f64>,
    pub active: bool,
}

/// Navigation entries for every module that did not opt out.
///
/// Ordered by `navOrder` ascending with unordered entries last, except that
/// `home` without an explicit order is pinned first. Ties keep load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavMenu {
    entries: Vec<NavEntry>,
}

impl NavMenu {
    pub fn build(modules: &LoadedModules) -> Self {
        let mut entries: Vec<NavEntry> = modules
            .iter()
            .filter(|m| m.nav_item())
            .map(|m| NavEntry {
                name: m.name().to_string(),
                title: m.title().to_string(),
                href: format!("#/{}", m.name()),
                order: m.nav_order(),
                active: false,
            })
            .collect();
        entries.sort_by(compare);
        Self { entries }
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Marks `name` active and clears every other entry.
    pub fn set_active(&mut self, name: Option<&str>) {
        for entry in &mut self.entries {
            entry.active = Some(entry.name.as_str()) == name;
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.active)
            .map(|e| e.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render_html(&self) -> String {
        let mut html = String::from("<ul class=\"nav-menu\">");
        for entry in &self.entries {
            let class = if entry.active { " class=\"active\"" } else { "" };
            html.push_str(&format!(
                "<li><a href=\"{}\"{}>{}</a></li>",
                entry.href, class, entry.title
            ));
        }
        html.push_str("</ul>");
        html
    }
}

fn compare(a: &NavEntry, b: &NavEntry) -> Ordering {
    let pinned = |e: &NavEntry| e.name == HOME_MODULE && e.order.is_none();
    pinned(b)
        .cmp(&pinned(a))
        .then_with(|| match (a.order, b.order) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

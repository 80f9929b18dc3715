//! Static-text extraction of plugin names.

use std::sync::OnceLock;

use regex::Regex;

fn module_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href=["']#/([a-zA-Z0-9_-]+)"#).expect("valid module link regex")
    })
}

fn service_import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:/|["'])services/([a-zA-Z0-9_-]+)"#).expect("valid service import regex")
    })
}

/// Names linked as `href="#/<name>"`, first occurrence order.
pub fn module_links(text: &str) -> Vec<String> {
    captures(module_link_regex(), text)
}

/// Names referenced as `services/<name>` import paths.
pub fn service_imports(text: &str) -> Vec<String> {
    captures(service_import_regex(), text)
}

fn captures(re: &Regex, text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in re.captures_iter(text) {
        let name = &cap[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_links() {
        let html = r##"
            <nav>
              <a href="#/home">Home</a>
              <a href='#/reports'>Reports</a>
              <a href="#/home">Again</a>
              <a href="/about">External</a>
              <a href="#/bad name">Broken</a>
            </nav>
        "##;
        assert_eq!(module_links(html), vec!["home", "reports", "bad"]);
    }

    #[test]
    fn test_service_imports() {
        let js = r#"
            import { ThemeService } from './services/theme/theme.js';
            import api from "services/api/api.js";
            const lazy = () => import('/services/json-import/json-import.js');
            // myservices/ignored
        "#;
        assert_eq!(service_imports(js), vec!["theme", "api", "json-import"]);
    }

    #[test]
    fn test_no_matches() {
        assert!(module_links("").is_empty());
        assert!(service_imports("console.log('x')").is_empty());
    }
}

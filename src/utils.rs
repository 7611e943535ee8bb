// src/utils.rs
use web_sys::window;

/// Get the base URL for the application.
/// Handles both local development and GitHub Pages deployment.
pub fn get_base_url() -> String {
    if let Some(window) = window() {
        if let Ok(location) = window.location().pathname() {
            return base_from_pathname(&location);
        }
    }
    String::new()
}

/// GitHub Pages serves the site under /lucina-edition/; local development
/// serves from the root and needs no base path.
fn base_from_pathname(pathname: &str) -> String {
    if pathname.starts_with("/lucina-edition/") {
        "/lucina-edition".to_string()
    } else {
        String::new()
    }
}

/// Build a resource URL with the correct base path.
pub fn resource_url(path: &str) -> String {
    join_url(&get_base_url(), path)
}

fn join_url(base: &str, path: &str) -> String {
    let clean_path = path.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", clean_path)
    } else {
        format!("{}/{}", base, clean_path)
    }
}

/// URL of a facsimile image file under the public assets directory.
pub fn facsimile_url(image: &str) -> String {
    resource_url(&format!("public/facsimiles/{}", image))
}

/// URL of the edition TEI document.
pub fn edition_url() -> String {
    resource_url("public/data/lucina.xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_detection() {
        assert_eq!(base_from_pathname("/lucina-edition/index.html"), "/lucina-edition");
        assert_eq!(base_from_pathname("/index.html"), "");
        assert_eq!(base_from_pathname("/"), "");
    }

    #[test]
    fn url_joining() {
        assert_eq!(join_url("", "public/data/lucina.xml"), "/public/data/lucina.xml");
        assert_eq!(join_url("", "/public/data/lucina.xml"), "/public/data/lucina.xml");
        assert_eq!(
            join_url("/lucina-edition", "public/facsimiles/f1r.jpg"),
            "/lucina-edition/public/facsimiles/f1r.jpg"
        );
    }
}

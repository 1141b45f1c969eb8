use serde::Serialize;

/// One step of the navigation trail. `key` is the raw path segment; turning it
/// into a label is the client's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub key: String,
    pub href: String,
}

/// Trail for `path`, always starting at the root.
pub fn breadcrumbs(path: &str) -> Vec<Crumb> {
    let path = path.split(['?', '#']).next().unwrap_or("");

    let mut trail = vec![Crumb {
        key: "home".to_string(),
        href: "/".to_string(),
    }];

    let mut href = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        href.push('/');
        href.push_str(segment);
        trail.push(Crumb {
            key: segment.to_string(),
            href: href.clone(),
        });
    }

    trail
}

//! Router: method + path pattern. Segments starting with `:` capture a path parameter.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Clone, Debug)]
struct Entry {
    method: String,
    segments: Vec<Segment>,
    id: RouteId,
}

/// Path parameters captured by a match, e.g. `{"id": "1"}` for `users/:id`.
pub type Params = HashMap<String, String>;

/// Maps (method, path pattern) -> RouteId. The first registered match wins.
#[derive(Default)]
pub struct Router {
    entries: Vec<Entry>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, method: &str, path: &str, id: RouteId) {
        let segments = split(path)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(s.to_owned()),
            })
            .collect();
        self.entries.push(Entry {
            method: method.to_uppercase(),
            segments,
            id,
        });
    }

    pub fn match_route(&self, method: &str, path: &str) -> Option<(RouteId, Params)> {
        let method = method.to_uppercase();
        let parts: Vec<&str> = split(path).collect();
        self.entries
            .iter()
            .filter(|e| e.method == method && e.segments.len() == parts.len())
            .find_map(|e| {
                let mut params = Params::new();
                for (segment, part) in e.segments.iter().zip(&parts) {
                    match segment {
                        Segment::Literal(lit) if lit == *part => {}
                        Segment::Literal(_) => return None,
                        Segment::Param(name) => {
                            params.insert(name.clone(), (*part).to_owned());
                        }
                    }
                }
                Some((e.id, params))
            })
    }
}

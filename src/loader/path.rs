/// Deployment-dependent asset path building: empty base locally, a fixed
/// prefix under a subpath deployment. All produced paths are slash-normalized
/// relative URLs.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    base: String,
}

fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(ch);
            prev_slash = false;
        }
    }
    out.trim_end_matches('/').to_string()
}

impl PathResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: normalize(base.into().trim_start_matches('/')),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn with_base(&self, path: &str) -> String {
        let clean = normalize(path.trim_start_matches('/'));
        if self.base.is_empty() {
            clean
        } else {
            format!("{}/{}", self.base, clean)
        }
    }

    /// `models/<group path>/<filename>` under the base.
    pub fn model_url(&self, path: &str, filename: &str) -> String {
        self.with_base(&format!("models/{path}/{filename}"))
    }

    /// `data/<file>` under the base, e.g. for the metadata document.
    pub fn data_url(&self, file: &str) -> String {
        self.with_base(&format!("data/{file}"))
    }
}

//! Shareable background links.
//!
//! A link looks like `bg/<slug>?bg_color=..&intensity=..&rotation=..&mode=blur`
//! or, in the internal form, `bg?slug=<slug>&..`. A slug is either a server
//! token or a color slug: one to four hex colors joined by `-` or `~`.

use std::collections::HashMap;

use tracing::debug;

use crate::color::{from_hex6, to_hex6, Color};
use crate::error::LinkError;
use crate::paper::{WallPaper, DEFAULT_INTENSITY};

/// Longest slug accepted from a link.
pub const MAX_SLUG_LENGTH: usize = 255;

const MAX_SLUG_COLORS: usize = 4;

/// Returns true if `slug` is a safe link token: 1 to 255 characters from
/// `[A-Za-z0-9._-]`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
}

/// Parses a color slug.
///
/// Returns an empty list unless the whole slug is 1 to 4 hex colors. `~`
/// is always accepted as a separator, `-` only between two colors.
pub fn colors_from_slug(slug: &str) -> Vec<Color> {
    let bytes = slug.as_bytes();
    let count = bytes.len() / 6;
    if count == 0 || count > MAX_SLUG_COLORS || bytes.len() != count * 7 - 1 {
        return Vec::new();
    }
    let mut result = Vec::with_capacity(count);
    for index in 0..count {
        let start = index * 7;
        if index + 1 < count {
            let separator = bytes[start + 6];
            if separator != b'~' && (count > 2 || separator != b'-') {
                return Vec::new();
            }
        }
        match slug.get(start..start + 6).and_then(from_hex6) {
            Some(color) => result.push(color),
            None => return Vec::new(),
        }
    }
    result
}

/// Encodes colors as a slug: `-` between exactly two colors, `~` otherwise.
///
/// An empty list encodes to an empty string.
pub fn colors_to_slug(colors: &[Color]) -> String {
    let separator = if colors.len() > 2 { "~" } else { "-" };
    colors
        .iter()
        .map(|color| to_hex6(*color))
        .collect::<Vec<_>>()
        .join(separator)
}

/// The `key=value` elements describing a paper's display parameters.
pub fn share_params(paper: &WallPaper) -> Vec<String> {
    let mut result = Vec::new();
    let colors = paper.background_colors();
    if paper.is_pattern() {
        if !colors.is_empty() {
            result.push(format!("bg_color={}", colors_to_slug(colors)));
        }
        if paper.pattern_intensity() != 0 {
            result.push(format!("intensity={}", paper.pattern_intensity()));
        }
    }
    let rotation = paper.gradient_rotation();
    if colors.len() == 2 && rotation != 0 {
        result.push(format!("rotation={rotation}"));
    }
    if paper.is_blurred() {
        result.push("mode=blur".to_string());
    }
    result
}

/// Applies link parameters to a copy of `paper`.
///
/// Blur and intensity reset to their defaults first. Colors come from the
/// first non-empty source among the paper's own slug and the `bg_color`,
/// `gradient`, `color` and `slug` parameters.
pub fn apply_url_params(paper: &WallPaper, params: &HashMap<String, String>) -> WallPaper {
    let param = |key| param_value(params, key);

    let blurred = param("mode")
        .replace('+', " ")
        .split(' ')
        .any(|token| token == "blur");

    let colors = [paper.slug(), param("bg_color"), param("gradient"), param("color"), param("slug")]
        .into_iter()
        .map(colors_from_slug)
        .find(|colors| !colors.is_empty())
        .unwrap_or_default();

    let mut intensity = DEFAULT_INTENSITY;
    if let Some(value) = parse_int(param("intensity")) {
        if (-100..101).contains(&value) {
            intensity = value;
        } else {
            debug!(value, "link intensity out of range");
        }
    }

    let rotation = parse_int(param("rotation")).unwrap_or(0);

    paper
        .clone()
        .with_link_params(colors, blurred, intensity)
        .with_gradient_rotation(rotation)
}

fn param_value<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

fn parse_int(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

/// Decodes an `&`-joined, percent-encoded query string.
///
/// Parameter names are lower-cased. A repeated name keeps its last value.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.to_lowercase(), value.into_owned()))
        .collect()
}

/// Where a background link leads.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// A color slug, resolved without asking the service.
    Local(WallPaper),
    /// A server slug; the caller fetches the paper and then applies
    /// [`LinkTarget::apply_to`].
    Remote {
        slug: String,
        params: HashMap<String, String>,
    },
}

impl LinkTarget {
    /// Applies the link parameters to a paper fetched for a remote target.
    pub fn apply_to(&self, paper: &WallPaper) -> WallPaper {
        match self {
            LinkTarget::Local(local) => local.clone(),
            LinkTarget::Remote { params, .. } => apply_url_params(paper, params),
        }
    }
}

/// Resolves a background link.
///
/// `path` is either `bg/<slug>` or bare `bg`, in which case the slug is
/// taken from the `color`, `gradient` or `slug` parameter in that order.
pub fn parse_link(path: &str, query: &str) -> Result<LinkTarget, LinkError> {
    let params = parse_query(query);
    let path = path.trim_matches('/');
    let slug = match path.strip_prefix("bg") {
        Some("") => ["color", "gradient", "slug"]
            .into_iter()
            .filter_map(|key| params.get(key))
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_default(),
        Some(rest) => match rest.strip_prefix('/') {
            Some(slug) => slug.to_string(),
            None => return Err(LinkError::BadLink(path.to_string())),
        },
        None => return Err(LinkError::BadLink(path.to_string())),
    };

    if let Some(paper) = WallPaper::from_colors_slug(&slug) {
        return Ok(LinkTarget::Local(paper.with_url_params(&params)));
    }
    if !is_valid_slug(&slug) {
        debug!(%slug, "rejected background link");
        return Err(LinkError::BadLink(slug));
    }
    Ok(LinkTarget::Remote { slug, params })
}

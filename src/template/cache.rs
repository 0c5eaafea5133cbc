// ABOUTME: Process-wide template cache keyed by literal-site identity
// ABOUTME: Provides the html() tag entry point and the html! site-identity macro

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::render::Value;

use super::compile::{Template, TemplateStrings};
use super::error::Result;
use super::result::TemplateResult;

/// Maps literal-site identity to its parsed [`Template`] so repeated
/// evaluation of one site reuses parsing work. Insert-if-absent, unbounded,
/// never evicted: a process has a fixed number of literal sites.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: HashMap<(usize, usize), Rc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the template for a literal site, parsing it on first use.
    /// Identity is the segment slice's address, not its content: two sites
    /// with identical text still get distinct templates.
    pub fn get_or_parse(&mut self, strings: TemplateStrings) -> Result<Rc<Template>> {
        let key = (strings.as_ptr() as usize, strings.len());
        if let Some(template) = self.templates.get(&key) {
            return Ok(template.clone());
        }
        let template = Rc::new(Template::parse(strings)?);
        self.templates.insert(key, template.clone());
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// Templates are Rc-shared and the engine is single-threaded by contract, so
// the default cache is per-thread. A concurrent variant would have to guard
// the insert-if-absent step instead.
thread_local! {
    static DEFAULT_CACHE: RefCell<TemplateCache> = RefCell::new(TemplateCache::new());
}

/// Tag-evaluation entry point: pair a literal site's segments with its
/// current expression values, parsing the template on first use via the
/// default cache. Usually invoked through the [`html!`](crate::html!) macro.
pub fn html(strings: TemplateStrings, values: Vec<Value>) -> Result<TemplateResult> {
    let template = DEFAULT_CACHE.with(|cache| cache.borrow_mut().get_or_parse(strings))?;
    Ok(TemplateResult::new(template, values))
}

/// Evaluate a template literal site.
///
/// Expands to a call to [`html()`](crate::template::html) with a per-site
/// `static` segment array, which is what gives each call site a stable,
/// unique identity for template caching. The static must be a named array,
/// not a `&[...]` borrow: a borrow of a literal array is a promoted
/// constant, and the compiler deduplicates those by content, which would
/// fuse two sites with identical text into one.
///
/// ```
/// # use weft::{html, Document};
/// let mut doc = Document::new();
/// let container = doc.create_element("div");
/// let greet = |name: &str| html!(["<p>Hello, ", "!</p>"], [name]).unwrap();
/// greet("World").render_to(&mut doc, container).unwrap();
/// assert_eq!(doc.markup(container), "<div><p>Hello, World!</p></div>");
/// ```
#[macro_export]
macro_rules! html {
    ([$($segment:literal),+ $(,)?]) => {
        $crate::html!([$($segment),+], [])
    };
    ([$($segment:literal),+ $(,)?], [$($value:expr),* $(,)?]) => {{
        static SITE: [&str; [$($segment),+].len()] = [$($segment),+];
        $crate::template::html(&SITE[..], ::std::vec![$($crate::render::Value::from($value)),*])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_shares_template() {
        let mut cache = TemplateCache::new();
        static STRINGS: &[&str] = &["<p>", "</p>"];
        let a = cache.get_or_parse(STRINGS).unwrap();
        let b = cache.get_or_parse(STRINGS).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_sites_with_identical_text() {
        let mut cache = TemplateCache::new();
        static SITE_A: [&str; 2] = ["<p>", "</p>"];
        static SITE_B: [&str; 2] = ["<p>", "</p>"];
        let a = cache.get_or_parse(&SITE_A[..]).unwrap();
        let b = cache.get_or_parse(&SITE_B[..]).unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    // Cache identity rests on named array statics keeping distinct
    // addresses. A `&[...]` borrow would not: its promoted backing array is
    // deduplicated by content and identical sites would fuse.
    #[test]
    fn test_identical_named_statics_keep_distinct_addresses() {
        static SITE_A: [&str; 2] = ["<p>", "</p>"];
        static SITE_B: [&str; 2] = ["<p>", "</p>"];
        assert_ne!(SITE_A.as_ptr(), SITE_B.as_ptr());
    }

    #[test]
    fn test_html_entry_point_uses_default_cache() {
        static STRINGS: &[&str] = &["<span>", "</span>"];
        let a = html(STRINGS, vec![Value::from(1)]).unwrap();
        let b = html(STRINGS, vec![Value::from(2)]).unwrap();
        assert!(Rc::ptr_eq(a.template(), b.template()));
    }

    #[test]
    fn test_html_macro_site_identity() {
        let site = || crate::html!(["<b>", "</b>"], [0]).unwrap();
        let a = site();
        let b = site();
        assert!(Rc::ptr_eq(a.template(), b.template()));

        let other = crate::html!(["<b>", "</b>"], [0]).unwrap();
        assert!(!Rc::ptr_eq(a.template(), other.template()));
    }
}

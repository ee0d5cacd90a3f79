//! Ordered extraction rules
//!
//! A field is described by a [`RuleChain`]: an ordered list of
//! [`ExtractionRule`]s evaluated first-success-wins. A rule is a CSS selector
//! plus what to read from the matched element:
//!
//! | Rule                         | Reads                                  |
//! |------------------------------|----------------------------------------|
//! | `h1.product-name`            | text content                           |
//! | `h1.product-name::text`      | text content                           |
//! | `img.product-image::attr(src)` | the `src` attribute                  |
//!
//! Text content is every descendant text node concatenated, with whitespace runs
//! collapsed to a single space and the ends trimmed.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

const TEXT_SUFFIX: &str = "::text";
const ATTR_MARKER: &str = "::attr(";

/// What a rule reads from a matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Text,
    Attr(String),
}

/// One compiled selector rule
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    source: String,
    selector: Selector,
    target: RuleTarget,
}

impl ExtractionRule {
    /// Compiles a rule written as `<css>`, `<css>::text` or `<css>::attr(<name>)`
    ///
    /// # Example
    ///
    /// ```
    /// use shelfscan::extract::{ExtractionRule, RuleTarget};
    ///
    /// let rule = ExtractionRule::parse("a.product-link::attr(href)").unwrap();
    /// assert_eq!(rule.target(), &RuleTarget::Attr("href".to_string()));
    /// ```
    pub fn parse(rule: &str) -> Result<Self, ConfigError> {
        let trimmed = rule.trim();
        let invalid = |message: &str| ConfigError::InvalidSelector {
            rule: rule.to_string(),
            message: message.to_string(),
        };

        let (css, target) = if let Some(css) = trimmed.strip_suffix(TEXT_SUFFIX) {
            (css, RuleTarget::Text)
        } else if let Some((css, rest)) = trimmed.rsplit_once(ATTR_MARKER) {
            let name = rest
                .strip_suffix(')')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| invalid("expected ::attr(<name>)"))?;
            (css, RuleTarget::Attr(name.to_string()))
        } else {
            (trimmed, RuleTarget::Text)
        };

        if css.trim().is_empty() {
            return Err(invalid("empty selector"));
        }

        let selector =
            Selector::parse(css.trim()).map_err(|e| invalid(&format!("{:?}", e)))?;

        Ok(Self {
            source: trimmed.to_string(),
            selector,
            target,
        })
    }

    /// The rule as written in the configuration
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &RuleTarget {
        &self.target
    }

    /// Every non-empty value this rule yields, in document order
    pub fn values<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = String> + 'a {
        document
            .select(&self.selector)
            .filter_map(move |element| self.read(element))
    }

    /// The first non-empty value this rule yields
    pub fn first(&self, document: &Html) -> Option<String> {
        self.values(document).next()
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match &self.target {
            RuleTarget::Text => element.text().collect::<String>(),
            RuleTarget::Attr(name) => element.value().attr(name)?.to_string(),
        };

        let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }
}

/// An ordered list of rules for one field, primary rule first
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<ExtractionRule>,
}

impl RuleChain {
    pub fn compile(rules: &[String]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| ExtractionRule::parse(rule))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First value of the first rule that yields anything
    pub fn first_value(&self, document: &Html) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.first(document))
    }

    /// All values of the first rule that yields anything
    ///
    /// Later rules are fallbacks, so their matches are never mixed in with a
    /// rule that already matched.
    pub fn all_values(&self, document: &Html) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.values(document).collect::<Vec<_>>())
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }
}

/// Compiled rule chains for one site
///
/// Built once from the configuration and shared read-only by every page task.
#[derive(Debug, Clone)]
pub struct SiteRules {
    pub product_link: RuleChain,
    pub next_page: RuleChain,
    pub name: RuleChain,
    pub price: RuleChain,
    pub image: RuleChain,
}

impl SiteRules {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            product_link: RuleChain::compile(&config.product_link)?,
            next_page: RuleChain::compile(&config.next_page)?,
            name: RuleChain::compile(&config.name)?,
            price: RuleChain::compile(&config.price)?,
            image: RuleChain::compile(&config.image)?,
        })
    }
}
